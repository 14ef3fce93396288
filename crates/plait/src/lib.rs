//! Plait: flatten heterogeneous nested records into order-stable leaves
//! and rebuild them exactly.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Plait sub-crates. For most users, adding `plait` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use plait::prelude::*;
//!
//! // One time step of an episode: an observation block and an action.
//! let step: Record = Mapping::typed("TimeStep")
//!     .with("image", Tensor::new([2usize, 2].as_slice(), vec![0.0, 0.1, 0.2, 0.3]).unwrap())
//!     .with("action", Mapping::new().with("x", 1.5).with("grip", 1))
//!     .with("reward", 0.0)
//!     .into();
//!
//! // Derive the shape once, flatten, and rebuild.
//! let schema = Schema::of(&step);
//! let leaves = flatten_leaves(&step).unwrap();
//! assert_eq!(leaves.len(), 7);
//! assert_eq!(unflatten(&leaves, &schema).unwrap(), step);
//!
//! // Dict output keys every leaf by its shortest unambiguous path.
//! let paths = flatten_paths(&step).unwrap();
//! assert!(paths.contains_key("image.1.0"));
//! assert!(paths.contains_key("grip"));
//!
//! // Selection pulls a recurring sub-record out of every element.
//! let episode: Record = Mapping::new()
//!     .with("steps", Record::Sequence(vec![step.clone(), step.clone()]))
//!     .into();
//! let flattener = Flattener::new(FlattenConfig::selection("steps.*.action")).unwrap();
//! let Flattened::Selection(actions) = flattener.flatten(&episode).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(actions.len(), 2);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `plait-core` | Records, scalars, tensors, leaf paths, errors |
//! | [`schema`] | `plait-schema` | Shape-only schemas, interchange documents, schema cache |
//! | [`flatten`] | `plait-flatten` | Flatten, unflatten, selection, pack/unpack |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Record model, leaf paths, and error types (`plait-core`).
///
/// [`types::Record`] is the closed sum type every operation traverses;
/// [`types::Node`] is its borrowed counterpart.
pub use plait_core as types;

/// Shape-only schemas (`plait-schema`).
///
/// [`schema::Schema::of`] derives a schema, [`schema::SchemaCache`] shares
/// schemas between records of the same shape, and
/// [`schema::SchemaDocument`] is the serialized interchange form.
pub use plait_schema as schema;

/// Flatten, unflatten, and selection (`plait-flatten`).
///
/// [`flatten::Flattener`] runs a validated [`flatten::FlattenConfig`];
/// [`flatten::unflatten`](fn@flatten::unflatten) replays a schema over a leaf list.
pub use plait_flatten as flatten;

/// Common imports for typical Plait usage.
///
/// ```rust
/// use plait::prelude::*;
/// ```
///
/// This imports the record model, schemas, the flatten entry points, and
/// every error type.
pub mod prelude {
    // Record model
    pub use plait_core::{LeafPath, Mapping, Node, Record, Scalar, Segment, Tensor};

    // Errors
    pub use plait_core::{FlattenError, PackError, RecordError, SchemaError, UnflattenError};

    // Schema
    pub use plait_schema::{Schema, SchemaCache};

    // Flatten
    pub use plait_flatten::{
        flatten, flatten_leaves, flatten_paths, select, unflatten, unflatten_paths,
        ConfigError, FlattenConfig, Flattened, Flattener, NonNumericalPolicy, OutputKind,
        Pattern,
    };
}
