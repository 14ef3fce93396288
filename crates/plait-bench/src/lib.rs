//! Benchmark profiles for the Plait flatten engine.
//!
//! Provides deterministic record builders for benchmarks:
//!
//! - [`episode_profile`]: RL episode with image tensors, typed actions, and rewards
//! - [`wide_profile`]: one wide mapping of small groups with colliding leaf names
//! - [`deep_profile`]: a single leaf under many levels of nesting

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use plait_core::{Mapping, Record, Tensor};

/// Build an episode of `steps` time steps with `side x side x 3` images.
///
/// Each step holds an observation (image tensor, instruction string), a
/// typed action (gripper scalar, 7-element pose tensor), and a reward.
pub fn episode_profile(steps: usize, side: usize) -> Record {
    let pixels = side * side * 3;
    let steps = (0..steps)
        .map(|t| {
            let data = (0..pixels)
                .map(|i| ((t * pixels + i) % 255) as f64 / 255.0)
                .collect();
            let image = Tensor::new([side, side, 3].as_slice(), data)
                .unwrap_or_else(|e| panic!("profile image: {e}"));
            let pose = Tensor::from_vec((0..7).map(|i| (t + i) as f64 * 0.01).collect());
            Record::from(
                Mapping::typed("TimeStep")
                    .with(
                        "observation",
                        Mapping::new()
                            .with("image", image)
                            .with("instruction", "stack the red block"),
                    )
                    .with(
                        "action",
                        Mapping::typed("Action")
                            .with("gripper", (t % 2) as f64)
                            .with("pose", pose),
                    )
                    .with("reward", if t + 1 == steps { 1.0 } else { 0.0 }),
            )
        })
        .collect();
    Mapping::typed("Episode")
        .with("steps", Record::Sequence(steps))
        .into()
}

/// Build a mapping of `groups` groups, each `{x, y, z: {value}}`.
///
/// Every `x`, `y`, and `value` name repeats once per group, so dict output
/// has to grow every key to two units.
pub fn wide_profile(groups: usize) -> Record {
    (0..groups)
        .map(|g| {
            let n = g as i64;
            (
                format!("group_{g}"),
                Mapping::new()
                    .with("x", n)
                    .with("y", n * 2)
                    .with("z", Mapping::new().with("value", n * 3)),
            )
        })
        .collect::<Mapping>()
        .into()
}

/// Build a single integer leaf nested under `depth` alternating
/// sequences and mappings.
pub fn deep_profile(depth: usize) -> Record {
    (0..depth).fold(Record::from(1), |inner, level| {
        if level % 2 == 0 {
            Record::Sequence(vec![inner])
        } else {
            Mapping::new().with("next", inner).into()
        }
    })
}
