//! Proptest strategies for arbitrary records.
//!
//! Field names are drawn from a four-letter alphabet so that generated
//! records routinely contain colliding terminal names, which is what the
//! minimal-path resolution has to cope with. Floats are finite so that
//! generated records compare equal to themselves.

use plait_core::{Mapping, Record, Scalar, Tensor};
use proptest::prelude::*;

/// Any scalar kind, finite floats only.
pub fn arb_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<i64>().prop_map(Scalar::Int),
        (-1.0e6..1.0e6f64).prop_map(Scalar::Float),
        "[a-z]{0,6}".prop_map(Scalar::Str),
        any::<bool>().prop_map(Scalar::Bool),
        Just(Scalar::Null),
        prop::collection::vec(any::<u8>(), 0..4).prop_map(Scalar::Bytes),
    ]
}

/// Numeric scalars only.
pub fn arb_numeric_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        (-1000i64..1000).prop_map(Scalar::Int),
        (-1.0e3..1.0e3f64).prop_map(Scalar::Float),
    ]
}

/// Tensors of rank 0 to 3 with extents up to 3 (zero extents included).
pub fn arb_tensor() -> impl Strategy<Value = Tensor> {
    prop::collection::vec(0usize..4, 0..4).prop_flat_map(|shape| {
        let len: usize = shape.iter().product();
        prop::collection::vec(-100.0..100.0f64, len).prop_map(move |data| {
            Tensor::new(shape.as_slice(), data)
                .unwrap_or_else(|e| panic!("generated tensor is consistent: {e}"))
        })
    })
}

fn arb_field_name() -> impl Strategy<Value = String> {
    "[a-d]"
}

fn arb_leaf() -> impl Strategy<Value = Record> {
    prop_oneof![
        4 => arb_scalar().prop_map(Record::Scalar),
        1 => arb_tensor().prop_map(Record::Tensor),
    ]
}

/// Arbitrary records up to a few levels deep.
pub fn arb_record() -> impl Strategy<Value = Record> {
    arb_leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Record::Sequence),
            prop::collection::vec((arb_field_name(), inner), 0..4).prop_map(|fields| {
                Record::Mapping(fields.into_iter().collect::<Mapping>())
            }),
        ]
    })
}

/// Arbitrary records whose scalar leaves are all numeric.
pub fn arb_numeric_record() -> impl Strategy<Value = Record> {
    let leaf = prop_oneof![
        4 => arb_numeric_scalar().prop_map(Record::Scalar),
        1 => arb_tensor().prop_map(Record::Tensor),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Record::Sequence),
            prop::collection::vec((arb_field_name(), inner), 0..4).prop_map(|fields| {
                Record::Mapping(fields.into_iter().collect::<Mapping>())
            }),
        ]
    })
}
