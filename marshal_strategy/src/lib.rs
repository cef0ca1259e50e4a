use marshal::{
    class::{Class, Instance},
    key::Key,
    typed::TypedArray,
    Regex, Value,
};
use num_bigint::BigInt;
use proptest::prelude::*;

/// arbitrary 64-bit BigInt for use with proptest
pub fn arb_bigint() -> impl Strategy<Value = BigInt> { any::<i64>().prop_map(BigInt::from) }

/// arbitrary number that decodes back to a plain number at any width
pub fn arb_number() -> impl Strategy<Value = f64> {
    prop_oneof![
        any::<u8>().prop_map(f64::from),
        any::<i8>().prop_map(f64::from),
        any::<u16>().prop_map(f64::from),
        any::<i16>().prop_map(f64::from),
        any::<u32>().prop_map(f64::from),
        any::<i32>().prop_map(f64::from),
        // large positive integers take the unsigned 64-bit width
        (1u64 << 32..1u64 << 53).prop_map(|n| n as f64),
        -1e9f64..1e9f64,
        Just(std::f64::INFINITY),
        Just(-0.0),
    ]
}

/// arbitrary record key for use with proptest
pub fn arb_key() -> impl Strategy<Value = Key> {
    prop_oneof![
        3 => "[a-z]{0,6}".prop_map(Key::from),
        1 => any::<u16>().prop_map(|n| Key::from(f64::from(n))),
    ]
}

/// arbitrary typed array for use with proptest
pub fn arb_typed() -> impl Strategy<Value = TypedArray> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..8).prop_map(TypedArray::from),
        prop::collection::vec(any::<i8>(), 0..8).prop_map(TypedArray::from),
        prop::collection::vec(any::<u16>(), 0..8).prop_map(TypedArray::from),
        prop::collection::vec(any::<i16>(), 0..8).prop_map(TypedArray::from),
        prop::collection::vec(any::<u32>(), 0..8).prop_map(TypedArray::from),
        prop::collection::vec(any::<i32>(), 0..8).prop_map(TypedArray::from),
    ]
}

/// arbitrary regex for use with proptest
pub fn arb_regex() -> impl Strategy<Value = Regex> {
    ("[a-z.*+]{1,8}", "g?i?m?", any::<u8>()).prop_map(|(source, flags, last)| {
        let mut re = Regex::new(&source, &flags);
        re.last_index = u32::from(last);
        re
    })
}

/// arbitrary acyclic value tree for use with proptest
///
/// Symbols are left out since they compare by identity. Instances use the
/// classes `A` and `B`.
pub fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        any::<bool>().prop_map(Value::Bool),
        arb_number().prop_map(Value::Number),
        arb_bigint().prop_map(Value::BigInt),
        any::<String>().prop_map(Value::Str),
        any::<i64>().prop_map(Value::Date),
        arb_regex().prop_map(Value::Regex),
        arb_typed().prop_map(Value::typed),
    ];
    leaf.prop_recursive(
        8,  // max depth
        64, // max nodes
        10, // max items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..10).prop_map(Value::array),
                prop::collection::vec(inner.clone(), 0..10).prop_map(Value::set),
                prop::collection::vec((arb_key(), inner.clone()), 0..10).prop_map(Value::record),
                prop::collection::vec(("[a-z]{1,4}", inner.clone()), 0..10).prop_map(Value::map),
                (prop::bool::ANY, prop::collection::vec(("[a-z]{1,4}", inner), 0..6)).prop_map(
                    |(a, fields)| {
                        let class = Class::new(if a { "A" } else { "B" });
                        Value::instance(Instance::new(
                            class,
                            fields.into_iter().map(|(k, v)| (Key::from(k), v)).collect(),
                        ))
                    }
                ),
            ]
        },
    )
}
