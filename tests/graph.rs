use marshal::prelude::*;

fn round_trip(v: &Value) -> Value {
    let (bytes, classes) = encode_with_type_registry(v, EncodeOptions::default()).unwrap();
    decode(&bytes, &classes).unwrap()
}

fn indexed(name: &str, fields: Vec<(Key, Value)>) -> Value {
    let rec = Value::record(fields);
    rec.insert(Symbol::index(), name).unwrap();
    rec
}

#[test]
fn shared_identity() {
    let shared = Value::record(vec![("n", 1)]);
    let root = Value::array(vec![shared.clone(), shared.clone(), Value::record(vec![("n", 1)])]);

    let dec = round_trip(&root);
    let elems = dec.elements().unwrap();

    assert_eq!(dec, root);
    assert!(elems[0].ptr_eq(&elems[1]));
    assert!(!elems[0].ptr_eq(&elems[2]));

    // mutation through one path shows through the other
    elems[0].insert("n", 2).unwrap();
    assert_eq!(elems[1].get("n"), Some(Value::from(2)));
}

#[test]
fn header_reports_references() {
    let shared = Value::array(vec![1]);
    let with = encode(&Value::array(vec![shared.clone(), shared]), EncodeOptions::default()).unwrap();
    let without = encode(&Value::array(vec![Value::array(vec![1])]), EncodeOptions::default()).unwrap();

    assert!(read_header(&with).unwrap().has_references);
    assert!(!read_header(&without).unwrap().has_references);
}

#[test]
fn self_cycle() {
    let root = Value::record(vec![("name", "root")]);
    root.insert("me", root.clone()).unwrap();

    let dec = round_trip(&root);

    assert_eq!(dec, root);
    assert!(dec.get("me").unwrap().ptr_eq(&dec));
}

#[test]
fn long_cycle() {
    let a = Value::array(Vec::<Value>::new());
    let b = Value::map(vec![(Value::from("a"), a.clone())]);
    let c = Value::set(vec![b.clone()]);
    a.push(c.clone()).unwrap();
    a.push(1).unwrap();

    let dec = round_trip(&a);
    let c2 = dec.elements().unwrap()[0].clone();
    let b2 = c2.elements().unwrap()[0].clone();

    assert_eq!(dec, a);
    assert!(b2.get("a").unwrap().ptr_eq(&dec));
}

#[test]
fn instance_cycle() {
    let node = Class::new("Node");
    let a = node.instantiate(vec![(Key::from("id"), Value::from(1))]);
    let b = node.instantiate(vec![(Key::from("id"), Value::from(2)), (Key::from("next"), a.clone())]);
    a.insert("next", b.clone()).unwrap();

    let (bytes, classes) = encode_with_type_registry(&a, EncodeOptions::default()).unwrap();
    assert_eq!(&*classes, &[node.clone()]);

    let dec = decode(&bytes, &classes).unwrap();
    let next = dec.get("next").unwrap();

    assert_eq!(dec, a);
    assert!(next.get("next").unwrap().ptr_eq(&dec));
    match dec {
        Value::Instance(i) => assert_eq!(i.borrow().class, node),
        other => panic!("expected an instance, got {:?}", other),
    }
}

#[test]
fn class_slots() {
    let (p, q) = (Class::new("P"), Class::new("Q"));
    let root = Value::array(vec![
        q.instantiate(vec![]),
        p.instantiate(vec![]),
        q.instantiate(vec![(Key::from("x"), Value::Null)]),
    ]);

    let (bytes, classes) = encode_with_type_registry(&root, EncodeOptions::default()).unwrap();
    assert_eq!(classes.into_vec(), vec![q.clone(), p.clone()]);

    // a registry that names the slots differently decodes with those names
    let renamed = [Class::new("Q2"), Class::new("P2")];
    let dec = decode(&bytes, &renamed).unwrap();
    match &dec.elements().unwrap()[1] {
        Value::Instance(i) => assert_eq!(i.borrow().class.name(), "P2"),
        other => panic!("expected an instance, got {:?}", other),
    };
}

#[test]
fn unknown_class_is_a_record() {
    let root = Class::new("Gone").instantiate(vec![(Key::from("x"), Value::from(1))]);
    root.insert("me", root.clone()).unwrap();

    let bytes = encode(&root, EncodeOptions::default()).unwrap();
    let dec = decode(&bytes, &[]).unwrap();

    assert!(dec.is_record());
    assert_eq!(dec.get("x"), Some(Value::from(1)));
    assert!(dec.get("me").unwrap().ptr_eq(&dec));
}

#[test]
fn index_lookup() {
    let users = indexed("users", vec![(Key::from("alice"), Value::from(30))]);
    let root = Value::record(vec![
        ("users", users.clone()),
        ("other", Value::array(vec![Value::from("big"), Value::from("payload")])),
    ]);

    let bytes = encode(&root, EncodeOptions::default()).unwrap();
    let header = read_header(&bytes).unwrap();
    assert!(header.has_symbol_keys);

    let part = decode_by_index_name(&bytes, "users", &[]).unwrap();
    assert_eq!(part, users);
    assert_eq!(part.get(Symbol::index()), Some(Value::from("users")));

    match decode_by_index_name(&bytes, "nobody", &[]) {
        Err(e) => assert_eq!(
            e.downcast::<MarshalError>().unwrap(),
            MarshalError::IndexNotFound("nobody".to_owned())
        ),
        Ok(v) => panic!("expected a missing index, got {:?}", v),
    }
}

#[test]
fn index_in_maps_and_instances() {
    let map = Value::map(vec![
        (Value::Symbol(Symbol::index()), Value::from("m")),
        (Value::from(1), Value::from("one")),
    ]);
    let inst = Class::new("I").instantiate(vec![
        (Key::Symbol(Symbol::index()), Value::from("i")),
        (Key::from("v"), Value::from(true)),
    ]);
    let root = Value::array(vec![map.clone(), inst.clone()]);

    let (bytes, classes) = encode_with_type_registry(&root, EncodeOptions::default()).unwrap();

    assert_eq!(decode_by_index_name(&bytes, "m", &classes).unwrap(), map);
    assert_eq!(decode_by_index_name(&bytes, "i", &classes).unwrap(), inst);
}

#[test]
fn later_index_name_wins() {
    let first = indexed("dup", vec![(Key::from("n"), Value::from(1))]);
    let second = indexed("dup", vec![(Key::from("n"), Value::from(2))]);
    let bytes = encode(&Value::array(vec![first, second.clone()]), EncodeOptions::default()).unwrap();

    assert_eq!(decode_by_index_name(&bytes, "dup", &[]).unwrap(), second);
}

#[test]
fn indexed_subtree_referencing_outside() {
    let outside = Value::array(vec![Value::from("outside")]);
    let part = indexed("part", vec![(Key::from("ext"), outside.clone())]);
    // `outside` is written before the indexed record, which then refers back
    let root = Value::array(vec![outside, part.clone()]);

    let bytes = encode(&root, EncodeOptions::default()).unwrap();
    let dec = decode_by_index_name(&bytes, "part", &[]).unwrap();

    assert_eq!(dec, part);
}

#[test]
fn indexed_subtree_referencing_its_ancestor() {
    let root = Value::record(vec![("name", "root")]);
    let child = indexed("x", vec![(Key::from("parent"), root.clone())]);
    // everything after `parent` is passed over when the root is read on demand
    let fields = vec![
        ("inst", Class::new("Leaf").instantiate(vec![(Key::from("arr"), Value::typed(vec![1u16, 2]))])),
        ("bytes", Value::typed(vec![-1i8, 5])),
        ("words", Value::typed(vec![7i32])),
        ("re", Value::regex("x+", "g")),
        ("list", Value::array(vec![Value::Null, Value::Undefined, Value::from(true), Value::from(false)])),
        ("set", Value::set(vec![1, 2])),
        ("map", Value::map(vec![("k", 1.5)])),
        ("big", Value::bigint(-9)),
        ("when", Value::Date(86_400_000)),
        ("text", Value::from("leaf")),
    ];
    for (k, v) in fields {
        child.insert(k, v).unwrap();
    }
    root.insert("child", child.clone()).unwrap();

    let (bytes, classes) = encode_with_type_registry(&root, EncodeOptions::default()).unwrap();
    let dec = decode_by_index_name(&bytes, "x", &classes).unwrap();
    let parent = dec.get("parent").unwrap();

    assert_eq!(dec, child);
    assert_eq!(parent.get("name"), Some(Value::from("root")));
    assert!(parent.get("child").unwrap().ptr_eq(&dec));
    assert!(dec.get("inst").unwrap().is_instance());
}

#[test]
fn typed_arrays() {
    let bytes = Value::typed(vec![1u8, 2, 255]);
    let shorts = Value::typed(vec![-300i16, 400]);
    let words = Value::typed(vec![u32::max_value(), 0]);
    let root = Value::array(vec![bytes.clone(), shorts, words, bytes]);

    let dec = round_trip(&root);
    let elems = dec.elements().unwrap();

    assert_eq!(dec, root);
    assert!(elems[0].ptr_eq(&elems[3]));
    match &elems[1] {
        Value::Typed(t) => assert_eq!(*t.borrow(), TypedArray::I16(vec![-300, 400])),
        other => panic!("expected a typed array, got {:?}", other),
    }
}

#[test]
fn regex_round_trip() {
    let mut re = Regex::new("a+b", "gim");
    re.last_index = 3;
    let root = Value::array(vec![Value::Regex(re.clone())]);

    let dec = round_trip(&root);

    match &dec.elements().unwrap()[0] {
        Value::Regex(r) => {
            assert_eq!(*r, re);
            assert!(r.global() && r.ignore_case() && r.multiline());
            assert!(!r.sticky());
        }
        other => panic!("expected a regex, got {:?}", other),
    };
}

#[test]
fn unsupported_values_are_skipped() {
    let root = Value::record(vec![
        ("f", Value::Unsupported(Unsupported::Function)),
        ("keep", Value::from(1)),
    ]);
    root.insert("buf", Unsupported::ArrayBuffer).unwrap();
    let list = Value::array(vec![Value::Unsupported(Unsupported::Float64Array), Value::from("x")]);
    root.insert("list", list).unwrap();

    let encoded = Encoder::new(EncodeOptions::default()).encode(&root).unwrap();
    let dec = decode(&encoded.bytes, &[]).unwrap();

    assert_eq!(encoded.warnings.len(), 3);
    assert_eq!(dec.len(), Some(2));
    assert_eq!(dec.get("keep"), Some(Value::from(1)));
    assert_eq!(dec.get("list"), Some(Value::array(vec!["x"])));
    assert_eq!(dec.get("f"), None);
}

#[test]
fn order_is_preserved() {
    let set = Value::set(vec![3, 1, 2, 1]);
    let map = Value::map(vec![(Value::from("z"), 1), (Value::from(0), 2), (Value::from("a"), 3)]);
    let rec = Value::record(vec![("z", 1), ("a", 2)]);
    let root = Value::array(vec![set, map, rec]);

    let dec = round_trip(&root);
    let elems = dec.elements().unwrap();

    assert_eq!(*elems[0].elements().unwrap(), vec![Value::from(3), Value::from(1), Value::from(2)]);
    match &elems[1] {
        Value::Map(m) => {
            let keys: Vec<Value> = m.borrow().keys().cloned().collect();
            assert_eq!(keys, vec![Value::from("z"), Value::from(0), Value::from("a")]);
        }
        other => panic!("expected a map, got {:?}", other),
    }
    match &elems[2] {
        Value::Record(r) => {
            let keys: Vec<Key> = r.borrow().keys().cloned().collect();
            assert_eq!(keys, vec![Key::from("z"), Key::from("a")]);
        }
        other => panic!("expected a record, got {:?}", other),
    }
}

#[test]
fn dates() {
    let root = Value::array(vec![Value::Date(0), Value::Date(-86_400_000), Value::Date(1_700_000_000_000)]);
    assert_eq!(round_trip(&root), root);
}

#[test]
fn class_reps() {
    #[derive(Clone, Debug, PartialEq)]
    struct User {
        name: String,
        age: u8,
        tags: Vec<String>,
    }

    impl ClassRep for User {
        fn class() -> Class { Class::new("User") }

        fn to_fields(&self) -> VecMap<Key, Value> {
            vec![
                (Key::from("name"), self.name.to_value()),
                (Key::from("age"), self.age.to_value()),
                (Key::from("tags"), self.tags.to_value()),
            ]
            .into()
        }

        fn from_fields(fields: &VecMap<Key, Value>) -> Option<User> {
            Some(User {
                name: field(fields, "name")?,
                age: field(fields, "age")?,
                tags: field(fields, "tags")?,
            })
        }
    }

    let user = User {
        name: "ada".to_owned(),
        age: 36,
        tags: vec!["x".to_owned(), "y".to_owned()],
    };
    let opts = EncodeOptions::default().dynamic_numbers(true);
    let (bytes, classes) = encode_with_type_registry(&user.to_instance(), opts).unwrap();

    assert_eq!(User::from_instance(&decode(&bytes, &classes).unwrap()), Some(user));
}
