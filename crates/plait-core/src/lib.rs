//! Core types for the Plait flatten engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the record model that every other crate traverses, the leaf path
//! type used to name positions inside a record, and the error types
//! shared by the schema, flatten, and unflatten subsystems.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
mod interchange;
pub mod path;
pub mod record;
pub mod tensor;
pub mod value;

pub use error::{FlattenError, PackError, RecordError, SchemaError, UnflattenError};
pub use path::{LeafPath, Segment};
pub use record::{Mapping, Node, Record, UNTYPED};
pub use tensor::{Shape, Tensor, TensorNode, TensorView};
pub use value::Scalar;
