//! Schema cache keyed by structural shape.
//!
//! [`SchemaCache`] maps a [`ShapeKey`] (an FNV-1a fingerprint of a record's
//! shape) to a shared [`Schema`]. Records with identical nesting, item
//! counts, field names, and scalar types share one entry regardless of
//! their values.
//!
//! A fingerprint hit is confirmed with [`Schema::describes`] before it is
//! returned, so a hash collision costs a rebuild, never a wrong schema.
//! Population races are benign: two threads building the same shape
//! produce equal schemas, and the last insert wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use plait_core::{Node, Record};

use crate::schema::Schema;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

const TAG_SCALAR: u8 = 1;
const TAG_SEQUENCE: u8 = 2;
const TAG_MAPPING: u8 = 3;
const TAG_TENSOR: u8 = 4;

#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

#[inline]
fn fnv1a_u64(hash: u64, v: u64) -> u64 {
    fnv1a_bytes(hash, &v.to_le_bytes())
}

/// Length-prefixed so that `["ab", "c"]` and `["a", "bc"]` differ.
#[inline]
fn fnv1a_str(hash: u64, s: &str) -> u64 {
    fnv1a_bytes(fnv1a_u64(hash, s.len() as u64), s.as_bytes())
}

/// Structural fingerprint of a record.
///
/// Not cryptographic; collisions are caught by the cache's confirmation
/// step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeKey(u64);

impl ShapeKey {
    /// Fingerprint the shape of `record` in pre-order.
    pub fn of(record: &Record) -> Self {
        let mut hash = FNV_OFFSET;
        let mut stack = vec![record.node()];
        while let Some(node) = stack.pop() {
            match node {
                Node::Scalar(s) => {
                    hash = fnv1a_bytes(hash, &[TAG_SCALAR]);
                    hash = fnv1a_str(hash, s.type_tag());
                }
                Node::Tensor(view) => {
                    hash = fnv1a_bytes(hash, &[TAG_TENSOR]);
                    hash = fnv1a_u64(hash, view.rank() as u64);
                    for &extent in view.shape() {
                        hash = fnv1a_u64(hash, extent as u64);
                    }
                }
                Node::Sequence(items) => {
                    hash = fnv1a_bytes(hash, &[TAG_SEQUENCE]);
                    hash = fnv1a_u64(hash, items.len() as u64);
                    stack.extend(items.iter().rev().map(Record::node));
                }
                Node::Mapping(mapping) => {
                    hash = fnv1a_bytes(hash, &[TAG_MAPPING]);
                    hash = fnv1a_str(hash, mapping.type_name().unwrap_or(""));
                    hash = fnv1a_u64(hash, mapping.len() as u64);
                    for name in mapping.keys() {
                        hash = fnv1a_str(hash, name);
                    }
                    stack.extend(mapping.iter().rev().map(|(_, r)| r.node()));
                }
            }
        }
        Self(hash)
    }

    /// The raw 64-bit fingerprint.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Hit/miss counters for a [`SchemaCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that built a schema.
    pub misses: u64,
}

/// Shared, read-mostly schema cache.
///
/// Safe to share across threads behind an `Arc`; lookups take a read
/// lock, and only misses take the write lock.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<ShapeKey, Arc<Schema>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SchemaCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the schema for `record`, building and caching it on a miss.
    pub fn get_or_build(&self, record: &Record) -> Arc<Schema> {
        let key = ShapeKey::of(record);

        let cached = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();

        if let Some(schema) = cached {
            if schema.describes(record) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return schema;
            }
            tracing::warn!(
                key = key.value(),
                "shape fingerprint collision, rebuilding schema"
            );
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let schema = Arc::new(Schema::of(record));
        tracing::debug!(
            key = key.value(),
            leaves = schema.leaf_count(),
            "schema cache miss"
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&schema));
        schema
    }

    /// Number of cached shapes.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no shapes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached schema. Counters are kept.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
