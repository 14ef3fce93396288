//! The record model: one node of an arbitrarily nested structure.
//!
//! [`Record`] is a closed sum type. Every traversal matches on it
//! exhaustively, so a new node kind cannot be silently skipped by one
//! operation and handled by another. Records are plain owned trees;
//! ownership makes cycles unrepresentable.
//!
//! [`Node`] is the borrowed counterpart used by traversal code. It
//! exposes tensor slices as first-class nodes, so a rank-2 tensor can be
//! walked exactly like a sequence of rank-1 tensors without copying.
//!
//! Every walk in this crate uses an explicit stack. The derived `Clone`,
//! `PartialEq`, and `Drop` do not: they recurse once per level, so records
//! nested far deeper than the flatten depth limit need a thread with a
//! larger stack to be cloned, compared, or dropped.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::error::RecordError;
use crate::path::Segment;
use crate::tensor::{Tensor, TensorNode, TensorView};
use crate::value::Scalar;

/// One node of a nested structure.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    /// A leaf value.
    Scalar(Scalar),
    /// Ordered items.
    Sequence(Vec<Record>),
    /// Ordered named fields.
    Mapping(Mapping),
    /// Dense numeric block.
    Tensor(Tensor),
}

/// Type tag reported by untyped mappings.
///
/// Reserved: a mapping cannot carry it as a type name, so a schema's
/// `"object"` tag always means "untyped".
pub const UNTYPED: &str = "object";

/// Ordered `name -> Record` fields with an optional type name.
///
/// Iteration order is insertion order. The type name is the object's type
/// tag in its schema; untyped mappings report [`UNTYPED`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping {
    type_name: Option<String>,
    fields: IndexMap<String, Record>,
}

impl Mapping {
    /// An empty, untyped mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty mapping carrying a type name.
    ///
    /// [`UNTYPED`] is reserved and yields an untyped mapping.
    pub fn typed(type_name: impl Into<String>) -> Self {
        let mut mapping = Self::new();
        mapping.set_type_name(Some(type_name.into()));
        mapping
    }

    /// Builder-style insert. A repeated name replaces the earlier value in place.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Record>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Insert or replace a field, keeping the position of an existing name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Record>) -> Option<Record> {
        self.fields.insert(name.into(), value.into())
    }

    /// Insert a field, failing if the name is already present.
    pub fn try_insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Record>,
    ) -> Result<(), RecordError> {
        match self.fields.entry(name.into()) {
            Entry::Occupied(e) => Err(RecordError::DuplicateField {
                name: e.key().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(value.into());
                Ok(())
            }
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Record> {
        self.fields.get(name)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Record> {
        self.fields.iter()
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Record> {
        self.fields.keys()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the mapping has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The type name, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Replace the type name. [`UNTYPED`] clears it.
    pub fn set_type_name(&mut self, type_name: Option<String>) {
        self.type_name = type_name.filter(|name| name != UNTYPED);
    }

    /// A copy with every null-valued field removed, recursively through
    /// nested mappings and sequences. Null sequence items are kept.
    pub fn without_nulls(&self) -> Self {
        let mut done: Vec<Record> = Vec::new();
        let mut tasks = vec![Rebuild::Mapping(self)];
        tasks.extend(self.non_null().rev().map(|(_, v)| Rebuild::Visit(v)));

        while let Some(task) = tasks.pop() {
            match task {
                Rebuild::Visit(Record::Mapping(m)) => {
                    tasks.push(Rebuild::Mapping(m));
                    tasks.extend(m.non_null().rev().map(|(_, v)| Rebuild::Visit(v)));
                }
                Rebuild::Visit(Record::Sequence(items)) => {
                    tasks.push(Rebuild::Sequence(items.len()));
                    tasks.extend(items.iter().rev().map(Rebuild::Visit));
                }
                Rebuild::Visit(leaf) => done.push(leaf.clone()),
                Rebuild::Sequence(len) => {
                    let items = done.split_off(done.len() - len);
                    done.push(Record::Sequence(items));
                }
                Rebuild::Mapping(m) => {
                    let names: Vec<&String> = m.non_null().map(|(k, _)| k).collect();
                    let values = done.split_off(done.len() - names.len());
                    done.push(Record::Mapping(Self {
                        type_name: m.type_name.clone(),
                        fields: names.into_iter().cloned().zip(values).collect(),
                    }));
                }
            }
        }

        match done.pop() {
            Some(Record::Mapping(m)) => m,
            _ => Self::new(),
        }
    }

    fn non_null(&self) -> impl DoubleEndedIterator<Item = (&String, &Record)> + '_ {
        self.fields
            .iter()
            .filter(|(_, v)| !matches!(v, Record::Scalar(Scalar::Null)))
    }
}

enum Rebuild<'a> {
    Visit(&'a Record),
    Sequence(usize),
    Mapping(&'a Mapping),
}

impl<K: Into<String>, V: Into<Record>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            type_name: None,
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Record);
    type IntoIter = indexmap::map::IntoIter<String, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Record);
    type IntoIter = indexmap::map::Iter<'a, String, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl Record {
    /// The null scalar.
    pub fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// Borrow this record as a traversal node.
    pub fn node(&self) -> Node<'_> {
        match self {
            Self::Scalar(s) => Node::Scalar(s),
            Self::Sequence(items) => Node::Sequence(items),
            Self::Mapping(m) => Node::Mapping(m),
            Self::Tensor(t) => Node::Tensor(t.view()),
        }
    }

    /// Follow `path` from this record.
    ///
    /// Field segments index mappings; index segments index sequences and
    /// tensors. Returns `None` if any step does not exist.
    pub fn get(&self, path: &[Segment]) -> Option<Node<'_>> {
        path.iter()
            .try_fold(self.node(), |node, segment| node.child(segment))
    }

    /// Number of leaves a full flatten would emit.
    ///
    /// Counts scalars and tensor elements. Uses an explicit stack, so
    /// arbitrarily deep records are safe.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(record) = stack.pop() {
            match record {
                Self::Scalar(_) => count += 1,
                Self::Tensor(t) => count += t.data().len(),
                Self::Sequence(items) => stack.extend(items),
                Self::Mapping(m) => stack.extend(m.fields.values()),
            }
        }
        count
    }

    /// Nesting depth: a scalar has depth 0, a container one more than its
    /// deepest child, a tensor its rank.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((record, depth)) = stack.pop() {
            match record {
                Self::Scalar(_) => deepest = deepest.max(depth),
                Self::Tensor(t) => deepest = deepest.max(depth + t.rank()),
                Self::Sequence(items) => {
                    deepest = deepest.max(depth + 1);
                    stack.extend(items.iter().map(|r| (r, depth + 1)));
                }
                Self::Mapping(m) => {
                    deepest = deepest.max(depth + 1);
                    stack.extend(m.fields.values().map(|r| (r, depth + 1)));
                }
            }
        }
        deepest
    }
}

/// A borrowed position inside a record.
#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    /// A leaf value.
    Scalar(&'a Scalar),
    /// Ordered items.
    Sequence(&'a [Record]),
    /// Ordered named fields.
    Mapping(&'a Mapping),
    /// A tensor or a slice of one.
    Tensor(TensorView<'a>),
}

impl<'a> Node<'a> {
    /// Step one segment down.
    pub fn child(&self, segment: &Segment) -> Option<Node<'a>> {
        match (self, segment) {
            (Node::Mapping(m), Segment::Field(name)) => m.get(name).map(Record::node),
            (Node::Sequence(items), Segment::Index(i)) => items.get(*i).map(Record::node),
            (Node::Tensor(view), Segment::Index(i)) => view.slice(*i).map(Node::Tensor),
            _ => None,
        }
    }

    /// Number of indexable children for sequences and rank >= 1 tensors.
    ///
    /// `None` for scalars, rank-0 tensors, and mappings.
    pub fn indexed_len(&self) -> Option<usize> {
        match self {
            Node::Sequence(items) => Some(items.len()),
            Node::Tensor(view) => match view.node() {
                TensorNode::Scalar(_) => None,
                TensorNode::Slices(slices) => Some(slices.len()),
            },
            Node::Scalar(_) | Node::Mapping(_) => None,
        }
    }

    /// Copy this position into an owned record.
    pub fn to_record(&self) -> Record {
        match self {
            Node::Scalar(s) => Record::Scalar((*s).clone()),
            Node::Sequence(items) => Record::Sequence(items.to_vec()),
            Node::Mapping(m) => Record::Mapping((*m).clone()),
            Node::Tensor(view) => Record::Tensor(view.to_tensor()),
        }
    }
}

macro_rules! record_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Record {
                fn from(v: $ty) -> Self {
                    Self::Scalar(Scalar::from(v))
                }
            }
        )*
    };
}

record_from_scalar!(i64, i32, f64, f32, bool, &str, String);

impl From<Scalar> for Record {
    fn from(v: Scalar) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<Record>> for Record {
    fn from(items: Vec<Record>) -> Self {
        Self::Sequence(items)
    }
}

impl From<Mapping> for Record {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl From<Tensor> for Record {
    fn from(t: Tensor) -> Self {
        Self::Tensor(t)
    }
}

impl<T: Into<Record>> FromIterator<T> for Record {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::Sequence(iter.into_iter().map(Into::into).collect())
    }
}
