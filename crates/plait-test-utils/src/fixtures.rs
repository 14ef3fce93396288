//! Reusable record fixtures.
//!
//! - [`xyz`]: `{x: 1, y: 2, z: {a: 3, b: 4}}`.
//! - [`nested`]: sequences of mappings at two levels, twelve leaves.
//! - [`items_with_dict_value`]: three identical elements under `items`.
//! - [`episode`]: RL-style steps mixing tensors, mappings, and scalars.
//! - [`mixed`]: every scalar kind, for non-numerical policy tests.

use plait_core::{Mapping, Record, Scalar, Tensor};

pub fn xyz() -> Record {
    Mapping::new()
        .with("x", 1)
        .with("y", 2)
        .with("z", Mapping::new().with("a", 3).with("b", 4))
        .into()
}

/// `{a:1, b:[{c:2,d:[3,4]},{c:5,d:[6,7]}], e:{f:8,g:[{h:9,i:10},{h:11,i:12}]}}`.
pub fn nested() -> Record {
    nested_scaled(1)
}

/// [`nested`] with every value multiplied by `k`. Same shape for any `k`.
pub fn nested_scaled(k: i64) -> Record {
    let v = |n: i64| Record::from(n * k);
    Mapping::new()
        .with("a", v(1))
        .with(
            "b",
            Record::Sequence(vec![
                Mapping::new()
                    .with("c", v(2))
                    .with("d", Record::Sequence(vec![v(3), v(4)]))
                    .into(),
                Mapping::new()
                    .with("c", v(5))
                    .with("d", Record::Sequence(vec![v(6), v(7)]))
                    .into(),
            ]),
        )
        .with(
            "e",
            Mapping::new().with("f", v(8)).with(
                "g",
                Record::Sequence(vec![
                    Mapping::new().with("h", v(9)).with("i", v(10)).into(),
                    Mapping::new().with("h", v(11)).with("i", v(12)).into(),
                ]),
            ),
        )
        .into()
}

/// `{items: [e, e, e]}` where each `e` is
/// `{id: n, dict_value: {key: "k", value: n * 10}}`.
pub fn items_with_dict_value() -> Record {
    let items = (0..3)
        .map(|n: i64| {
            Record::from(
                Mapping::new()
                    .with("id", n)
                    .with(
                        "dict_value",
                        Mapping::new().with("key", "k").with("value", n * 10),
                    ),
            )
        })
        .collect();
    Mapping::new().with("items", Record::Sequence(items)).into()
}

/// An episode of `steps` time steps.
///
/// Each step is a typed `TimeStep` mapping:
/// `{observation: {image: 2x2 tensor, instruction: str}, action: Action{gripper, xyz: [3] tensor}, reward}`.
pub fn episode(steps: usize) -> Record {
    let steps = (0..steps)
        .map(|t| {
            let f = t as f64;
            let image = Tensor::new([2usize, 2].as_slice(), vec![f, f + 0.25, f + 0.5, f + 0.75])
                .unwrap_or_else(|e| panic!("fixture tensor: {e}"));
            let step = Mapping::typed("TimeStep")
                .with(
                    "observation",
                    Mapping::new()
                        .with("image", image)
                        .with("instruction", "pick up the block"),
                )
                .with(
                    "action",
                    Mapping::typed("Action")
                        .with("gripper", f / 10.0)
                        .with("xyz", Tensor::from_vec(vec![f, -f, 2.0 * f])),
                )
                .with("reward", if t % 2 == 0 { 1.0 } else { 0.0 });
            Record::from(step)
        })
        .collect();
    Mapping::typed("Episode")
        .with("steps", Record::Sequence(steps))
        .into()
}

/// `{n: 1, f: 0.5, s: "text", b: true, none: null, blob: [0xde, 0xad]}`.
pub fn mixed() -> Record {
    Mapping::new()
        .with("n", 1)
        .with("f", 0.5)
        .with("s", "text")
        .with("b", true)
        .with("none", Record::null())
        .with("blob", Scalar::Bytes(vec![0xde, 0xad]))
        .into()
}
