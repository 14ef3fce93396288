//! Flatten, unflatten, and wildcard selection for Plait records.
//!
//! - [`flatten`](mod@flatten): records to leaf lists or minimal-path
//!   maps, driven by a validated [`Flattener`].
//! - [`index`]: the two-pass minimal-path algorithm behind dict output.
//! - [`select`](mod@select): `steps.*.action` style extraction of
//!   recurring sub-records.
//! - [`unflatten`](mod@unflatten): schema-driven reconstruction.
//! - [`pack`](mod@pack): list-of-mappings / mapping-of-lists transposes.
//!
//! ```
//! use plait_core::{Mapping, Record};
//! use plait_flatten::{flatten_leaves, unflatten};
//! use plait_schema::Schema;
//!
//! let record: Record = Mapping::new()
//!     .with("x", 1)
//!     .with("z", Mapping::new().with("a", 3).with("b", 4))
//!     .into();
//! let schema = Schema::of(&record);
//! let leaves = flatten_leaves(&record).unwrap();
//! assert_eq!(leaves.len(), 3);
//! assert_eq!(unflatten(&leaves, &schema).unwrap(), record);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod flatten;
pub mod index;
pub mod pack;
pub mod select;
pub mod unflatten;

pub use config::{
    ConfigError, FlattenConfig, NonNumericalPolicy, OutputKind, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_NODES, DEFAULT_SEPARATOR,
};
pub use flatten::{flatten, flatten_leaves, flatten_paths, Flattened, Flattener};
pub use index::PathIndex;
pub use pack::{pack, unpack_from, Padding};
pub use select::{select, select_paths, select_rows, Pattern, PatternSegment, SelectionTable};
pub use unflatten::{unflatten, unflatten_paths, unflatten_with_limit, unflatten_with_limits};
