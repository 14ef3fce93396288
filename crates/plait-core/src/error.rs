//! Error types for the Plait flatten engine.
//!
//! Organized by subsystem: record construction, schema documents,
//! flatten and selection, unflatten, and pack/unpack. Every variant that
//! can point at a position carries the path or pattern segment where the
//! failure happened.

use std::error::Error;
use std::fmt;

use crate::path::LeafPath;

/// Errors from building a [`Record`](crate::Record).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// Tensor data length does not match the product of its shape.
    TensorShape {
        /// The requested shape.
        shape: Vec<usize>,
        /// The number of values supplied.
        len: usize,
    },
    /// A field name was inserted twice into the same mapping.
    DuplicateField {
        /// The repeated name.
        name: String,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TensorShape { shape, len } => {
                write!(f, "tensor shape {shape:?} does not hold {len} values")
            }
            Self::DuplicateField { name } => write!(f, "duplicate field '{name}'"),
        }
    }
}

impl Error for RecordError {}

/// Errors from reading a schema interchange document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// The document is not valid JSON or does not describe a schema.
    Document {
        /// Parser diagnostic.
        reason: String,
    },
    /// The schema nests deeper than a document may carry.
    TooDeep {
        /// Nesting depth of the schema.
        depth: usize,
        /// The document depth limit.
        limit: usize,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document { reason } => write!(f, "invalid schema document: {reason}"),
            Self::TooDeep { depth, limit } => {
                write!(f, "schema depth {depth} exceeds the document limit {limit}")
            }
        }
    }
}

impl Error for SchemaError {}

/// Errors from flattening a record or selecting from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlattenError {
    /// A non-numeric leaf was found under the `forbid` policy.
    NonNumericalValue {
        /// Full path of the offending leaf.
        path: LeafPath,
        /// Type tag of the value found there.
        found: &'static str,
    },
    /// A selector pattern matched no node.
    PatternNotFound {
        /// The segment that failed to match.
        segment: String,
        /// Pattern segments consumed before the failure, joined by the separator.
        prefix: String,
    },
    /// A selector pattern could not be parsed.
    InvalidPattern {
        /// The pattern text.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The record is nested deeper than the configured limit.
    DepthExceeded {
        /// Path of the node that crossed the limit.
        path: LeafPath,
        /// The configured maximum depth.
        limit: usize,
    },
    /// Two leaves render to the same key even at full path length.
    ///
    /// Only reachable when field names contain the separator.
    AmbiguousPath {
        /// The colliding key.
        key: String,
    },
    /// The caller required at least one leaf and none survived filtering.
    EmptyStructure,
}

impl fmt::Display for FlattenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonNumericalValue { path, found } => {
                write!(f, "non-numerical value ({found}) at {path}")
            }
            Self::PatternNotFound { segment, prefix } => {
                if prefix.is_empty() {
                    write!(f, "pattern segment '{segment}' matched nothing at the root")
                } else {
                    write!(f, "pattern segment '{segment}' matched nothing after '{prefix}'")
                }
            }
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid pattern '{pattern}': {reason}")
            }
            Self::DepthExceeded { path, limit } => {
                write!(f, "nesting depth limit {limit} exceeded at {path}")
            }
            Self::AmbiguousPath { key } => {
                write!(f, "key '{key}' names more than one leaf")
            }
            Self::EmptyStructure => write!(f, "record has no leaves"),
        }
    }
}

impl Error for FlattenError {}

/// Errors from rebuilding a record from leaves and a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnflattenError {
    /// The leaf sequence is shorter or longer than the schema requires.
    LeafCountMismatch {
        /// Leaves the schema describes.
        expected: usize,
        /// Leaves supplied.
        actual: usize,
    },
    /// A leaf cannot fill the slot the schema gives it.
    LeafTypeMismatch {
        /// Path of the slot being filled.
        path: LeafPath,
        /// What the slot requires.
        expected: &'static str,
        /// Type tag of the leaf supplied.
        found: &'static str,
    },
    /// The schema is nested deeper than the configured limit.
    DepthExceeded {
        /// Path of the schema node that crossed the limit.
        path: LeafPath,
        /// The configured maximum depth.
        limit: usize,
    },
    /// An array's declared length disagrees with its item schemas.
    MalformedSchema {
        /// Path of the inconsistent array.
        path: LeafPath,
        /// What is inconsistent.
        reason: String,
    },
    /// Replaying the schema would build more nodes than allowed.
    TooManyNodes {
        /// Nodes the schema describes (saturating).
        count: usize,
        /// The node limit.
        limit: usize,
    },
}

impl fmt::Display for UnflattenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeafCountMismatch { expected, actual } => {
                write!(f, "schema describes {expected} leaves but {actual} were supplied")
            }
            Self::LeafTypeMismatch {
                path,
                expected,
                found,
            } => write!(f, "expected {expected} leaf at {path}, found {found}"),
            Self::DepthExceeded { path, limit } => {
                write!(f, "nesting depth limit {limit} exceeded at {path}")
            }
            Self::MalformedSchema { path, reason } => {
                write!(f, "malformed schema at {path}: {reason}")
            }
            Self::TooManyNodes { count, limit } => {
                write!(f, "schema describes {count} nodes, limit is {limit}")
            }
        }
    }
}

impl Error for UnflattenError {}

/// Errors from packing or unpacking collections of mappings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackError {
    /// No records were supplied.
    Empty,
    /// A record in the collection is not a mapping.
    ExpectedMapping {
        /// Position of the offending record.
        index: usize,
    },
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "cannot pack an empty collection"),
            Self::ExpectedMapping { index } => {
                write!(f, "record {index} is not a mapping")
            }
        }
    }
}

impl Error for PackError {}
