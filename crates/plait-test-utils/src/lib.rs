//! Test utilities for Plait development.
//!
//! - [`fixtures`]: hand-built records used across unit and integration tests.
//! - [`strategies`]: proptest strategies that generate arbitrary records
//!   with deliberately colliding field names.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod strategies;

pub use strategies::{arb_record, arb_scalar, arb_tensor};
