//! Shape-only schemas for Plait records.
//!
//! A [`Schema`] is derived once per record shape and drives the unflatten
//! replay. It serializes to a plain interchange document
//! ([`SchemaDocument`]), so a process that never saw the original record
//! can still rebuild it from a leaf list. [`SchemaCache`] shares schemas
//! between records of the same shape.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod document;
pub mod schema;

pub use cache::{CacheStats, SchemaCache, ShapeKey};
pub use document::{SchemaDocument, MAX_DOCUMENT_DEPTH};
pub use schema::{Items, Schema, OBJECT, SEQUENCE, TENSOR};
