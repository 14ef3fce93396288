//! Shape-only record descriptors.
//!
//! A [`Schema`] mirrors the nesting of a [`Record`] but carries no values:
//! scalar type tags, array lengths, and object field names in order. Two
//! records that differ only in scalar values have equal schemas.
//!
//! [`Schema::of`] and every other method here walk with an explicit work
//! stack, so deep inputs never overflow the call stack inside them. The
//! derived `Clone`, `PartialEq`, and `Drop` recurse once per level, like
//! those of [`Record`]; schemas far deeper than the document limit
//! ([`MAX_DOCUMENT_DEPTH`](crate::document::MAX_DOCUMENT_DEPTH)) need a
//! larger stack to be cloned, compared, or dropped.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use plait_core::{Mapping, Node, Record, Shape, TensorView, UNTYPED};

use crate::document::SchemaDocument;

/// Type tag of rank-0 tensor scalars and of every tensor array level.
pub const TENSOR: &str = "tensor";
/// Type tag of sequence arrays.
pub const SEQUENCE: &str = "sequence";
/// Type tag of untyped mappings.
pub const OBJECT: &str = UNTYPED;

/// Structural descriptor of a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SchemaDocument", try_from = "SchemaDocument")]
pub enum Schema {
    /// A single leaf.
    Scalar {
        /// Leaf type (`integer`, `number`, `string`, `boolean`, `null`,
        /// `bytes`, or `tensor` for rank-0 tensors).
        type_tag: String,
    },
    /// An indexed container: a sequence or one tensor axis.
    Array {
        /// `sequence` or `tensor`.
        type_tag: String,
        /// Number of items recorded when the schema was built.
        length: usize,
        /// Item layout.
        items: Items,
    },
    /// Named fields in declaration order.
    Object {
        /// The mapping's type name, or `object`.
        type_tag: String,
        /// Field schemas in insertion order.
        properties: IndexMap<String, Schema>,
    },
}

/// Layout of an array's items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Items {
    /// No items (length 0 sequence).
    Empty,
    /// Every item shares one schema.
    Uniform(Box<Schema>),
    /// Heterogeneous sequence: one schema per position.
    PerIndex(Vec<Schema>),
}

enum Task<'a> {
    Visit(Node<'a>),
    Array { len: usize },
    Object { mapping: &'a Mapping },
}

impl Schema {
    /// Derive the schema of `record`.
    pub fn of(record: &Record) -> Self {
        let mut results: Vec<Schema> = Vec::new();
        let mut tasks = vec![Task::Visit(record.node())];

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(Node::Scalar(s)) => results.push(Self::scalar(s.type_tag())),
                Task::Visit(Node::Tensor(view)) => results.push(Self::of_tensor(view.shape())),
                Task::Visit(Node::Sequence(items)) => {
                    tasks.push(Task::Array { len: items.len() });
                    tasks.extend(items.iter().rev().map(|r| Task::Visit(r.node())));
                }
                Task::Visit(Node::Mapping(mapping)) => {
                    tasks.push(Task::Object { mapping });
                    tasks.extend(mapping.iter().rev().map(|(_, r)| Task::Visit(r.node())));
                }
                Task::Array { len } => {
                    let children = results.split_off(results.len() - len);
                    results.push(Self::Array {
                        type_tag: SEQUENCE.to_owned(),
                        length: len,
                        items: Items::from_children(children),
                    });
                }
                Task::Object { mapping } => {
                    let children = results.split_off(results.len() - mapping.len());
                    results.push(Self::Object {
                        type_tag: mapping.type_name().unwrap_or(OBJECT).to_owned(),
                        properties: mapping.keys().cloned().zip(children).collect(),
                    });
                }
            }
        }

        debug_assert_eq!(results.len(), 1);
        results.pop().unwrap_or_else(|| Self::scalar("null"))
    }

    /// Schema of a tensor with the given shape, independent of its data.
    ///
    /// Rank 0 is `scalar(tensor)`; each axis wraps the inner schema in a
    /// uniform `array(tensor)`, so zero-extent axes keep their inner shape.
    pub fn of_tensor(shape: &[usize]) -> Self {
        shape
            .iter()
            .rev()
            .fold(Self::scalar(TENSOR), |inner, &extent| Self::Array {
                type_tag: TENSOR.to_owned(),
                length: extent,
                items: Items::Uniform(Box::new(inner)),
            })
    }

    /// A scalar schema with the given type tag.
    pub fn scalar(type_tag: impl Into<String>) -> Self {
        Self::Scalar {
            type_tag: type_tag.into(),
        }
    }

    /// The node's type tag.
    pub fn type_tag(&self) -> &str {
        match self {
            Self::Scalar { type_tag } | Self::Array { type_tag, .. } | Self::Object { type_tag, .. } => {
                type_tag
            }
        }
    }

    /// Whether this node describes a tensor (any rank).
    pub fn is_tensor(&self) -> bool {
        self.type_tag() == TENSOR && !matches!(self, Self::Object { .. })
    }

    /// Number of leaves a record of this shape flattens to.
    ///
    /// Saturates at `usize::MAX` for absurd declared lengths.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0usize;
        let mut stack = vec![(self, 1usize)];
        while let Some((schema, times)) = stack.pop() {
            match schema {
                Self::Scalar { .. } => count = count.saturating_add(times),
                Self::Array { length, items, .. } => match items {
                    Items::Empty => {}
                    Items::Uniform(item) => stack.push((&**item, times.saturating_mul(*length))),
                    Items::PerIndex(items) => stack.extend(items.iter().map(|s| (s, times))),
                },
                Self::Object { properties, .. } => {
                    stack.extend(properties.values().map(|s| (s, times)));
                }
            }
        }
        count
    }

    /// Number of nodes an unflatten replay builds for this shape.
    ///
    /// A well-formed tensor node counts once, since it is rebuilt as one
    /// block. Saturates at `usize::MAX` for absurd declared lengths.
    pub fn node_count(&self) -> usize {
        let mut count = 0usize;
        let mut stack = vec![(self, 1usize)];
        while let Some((schema, times)) = stack.pop() {
            count = count.saturating_add(times);
            if schema.is_tensor() && schema.tensor_shape().is_some() {
                continue;
            }
            match schema {
                Self::Scalar { .. } => {}
                Self::Array { length, items, .. } => match items {
                    Items::Empty => {}
                    Items::Uniform(item) => stack.push((&**item, times.saturating_mul(*length))),
                    Items::PerIndex(items) => stack.extend(items.iter().map(|s| (s, times))),
                },
                Self::Object { properties, .. } => {
                    stack.extend(properties.values().map(|s| (s, times)));
                }
            }
        }
        count
    }

    /// The shape of a tensor-typed node: uniform `tensor` arrays down to a
    /// `tensor` scalar. `None` for anything else.
    pub fn tensor_shape(&self) -> Option<Shape> {
        let mut shape = Shape::new();
        let mut node = self;
        loop {
            match node {
                Self::Scalar { type_tag } if type_tag == TENSOR => return Some(shape),
                Self::Array {
                    type_tag,
                    length,
                    items: Items::Uniform(item),
                } if type_tag == TENSOR => {
                    shape.push(*length);
                    node = &**item;
                }
                _ => return None,
            }
        }
    }

    /// Nesting depth, counted like [`Record::depth`].
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((schema, depth)) = stack.pop() {
            match schema {
                Self::Scalar { .. } => deepest = deepest.max(depth),
                Self::Array { items, .. } => {
                    deepest = deepest.max(depth + 1);
                    match items {
                        Items::Empty => {}
                        Items::Uniform(item) => stack.push((&**item, depth + 1)),
                        Items::PerIndex(items) => stack.extend(items.iter().map(|s| (s, depth + 1))),
                    }
                }
                Self::Object { properties, .. } => {
                    deepest = deepest.max(depth + 1);
                    stack.extend(properties.values().map(|s| (s, depth + 1)));
                }
            }
        }
        deepest
    }

    /// Whether `record` has exactly the shape this schema describes.
    ///
    /// Equivalent to `Schema::of(record) == *self` without building the
    /// record's schema.
    pub fn describes(&self, record: &Record) -> bool {
        let mut stack = vec![(self, record.node())];
        while let Some((schema, node)) = stack.pop() {
            match (schema, node) {
                (Self::Scalar { type_tag }, Node::Scalar(s)) => {
                    if type_tag != s.type_tag() {
                        return false;
                    }
                }
                (_, Node::Tensor(view)) => {
                    if !schema.describes_tensor(view) {
                        return false;
                    }
                }
                (
                    Self::Array {
                        type_tag,
                        length,
                        items,
                    },
                    Node::Sequence(children),
                ) => {
                    if type_tag != SEQUENCE || *length != children.len() {
                        return false;
                    }
                    match items {
                        Items::Empty => {
                            if !children.is_empty() {
                                return false;
                            }
                        }
                        Items::Uniform(item) => {
                            if children.is_empty() {
                                return false;
                            }
                            stack.extend(children.iter().map(|c| (&**item, c.node())));
                        }
                        Items::PerIndex(schemas) => {
                            if schemas.len() != children.len() {
                                return false;
                            }
                            stack.extend(schemas.iter().zip(children.iter().map(Record::node)));
                        }
                    }
                }
                (
                    Self::Object {
                        type_tag,
                        properties,
                    },
                    Node::Mapping(mapping),
                ) => {
                    if type_tag != mapping.type_name().unwrap_or(OBJECT)
                        || properties.len() != mapping.len()
                    {
                        return false;
                    }
                    for ((name, schema), (field, child)) in properties.iter().zip(mapping.iter()) {
                        if name != field {
                            return false;
                        }
                        stack.push((schema, child.node()));
                    }
                }
                _ => return false,
            }
        }
        true
    }

    fn describes_tensor(&self, view: TensorView<'_>) -> bool {
        let mut schema = self;
        for &extent in view.shape() {
            match schema {
                Self::Array {
                    type_tag,
                    length,
                    items: Items::Uniform(item),
                } if type_tag == TENSOR && *length == extent => schema = &**item,
                _ => return false,
            }
        }
        matches!(schema, Self::Scalar { type_tag } if type_tag == TENSOR)
    }
}

impl Items {
    /// Collapse per-item schemas: uniform when every item agrees.
    ///
    /// Heterogeneous sequences keep one schema per position so that the
    /// unflatten replay can rebuild them exactly.
    pub fn from_children(mut children: Vec<Schema>) -> Self {
        if children.is_empty() {
            return Self::Empty;
        }
        if children[1..].iter().all(|c| *c == children[0]) {
            children.truncate(1);
            return Self::Uniform(Box::new(children.swap_remove(0)));
        }
        Self::PerIndex(children)
    }

    /// The schema of the item at `index`, if the array has one there.
    pub fn get(&self, index: usize) -> Option<&Schema> {
        match self {
            Self::Empty => None,
            Self::Uniform(item) => Some(item.as_ref()),
            Self::PerIndex(items) => items.get(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plait_core::{Scalar, Tensor};
    use plait_test_utils::{arb_record, fixtures};
    use proptest::prelude::*;

    #[test]
    fn object_fields_keep_insertion_order() {
        let schema = Schema::of(&fixtures::xyz());
        let Schema::Object { properties, type_tag } = &schema else {
            panic!("mapping must produce an object schema");
        };
        assert_eq!(type_tag, OBJECT);
        let names: Vec<&String> = properties.keys().collect();
        assert_eq!(names, ["x", "y", "z"]);
    }

    #[test]
    fn rank_zero_tensor_is_scalar() {
        let schema = Schema::of(&Record::Tensor(Tensor::scalar(3.0)));
        assert_eq!(schema, Schema::scalar(TENSOR));
        assert_eq!(schema.leaf_count(), 1);
    }

    #[test]
    fn tensor_schema_uses_first_axis_extent() {
        let t = Tensor::new([2usize, 3].as_slice(), vec![0.0; 6]).unwrap();
        let schema = Schema::of(&Record::Tensor(t));
        let Schema::Array { type_tag, length, items } = &schema else {
            panic!("rank-2 tensor must produce an array schema");
        };
        assert_eq!(type_tag, TENSOR);
        assert_eq!(*length, 2);
        assert_eq!(items.get(0), Some(&Schema::of_tensor(&[3])));
        assert_eq!(schema.leaf_count(), 6);
    }

    #[test]
    fn zero_extent_tensor_keeps_inner_shape() {
        let schema = Schema::of_tensor(&[0, 4]);
        assert_eq!(schema.leaf_count(), 0);
        assert_eq!(schema.depth(), 2);
        let t = Tensor::new([0usize, 4].as_slice(), vec![]).unwrap();
        assert!(schema.describes(&Record::Tensor(t)));
        let other = Tensor::new([0usize, 5].as_slice(), vec![]).unwrap();
        assert!(!schema.describes(&Record::Tensor(other)));
    }

    #[test]
    fn schema_ignores_values() {
        let a = fixtures::nested();
        let b = fixtures::nested_scaled(10);
        assert_ne!(a, b);
        assert_eq!(Schema::of(&a), Schema::of(&b));
    }

    #[test]
    fn uniform_sequence_collapses_items() {
        let schema = Schema::of(&fixtures::nested());
        let Schema::Object { properties, .. } = &schema else {
            panic!("expected object");
        };
        let Schema::Array { length, items, .. } = &properties["b"] else {
            panic!("b must be an array");
        };
        assert_eq!(*length, 2);
        assert!(matches!(items, Items::Uniform(_)));
        assert_eq!(schema.leaf_count(), 12);
    }

    #[test]
    fn heterogeneous_sequence_keeps_per_index_items() {
        let r = Record::Sequence(vec![
            Record::from(1),
            Record::from("two"),
            Mapping::new().with("three", 3.0).into(),
        ]);
        let schema = Schema::of(&r);
        let Schema::Array { items: Items::PerIndex(items), .. } = &schema else {
            panic!("mixed items must be kept per index");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], Schema::scalar("string"));
        assert!(schema.describes(&r));
    }

    #[test]
    fn empty_sequence_has_no_items() {
        let schema = Schema::of(&Record::Sequence(vec![]));
        assert_eq!(
            schema,
            Schema::Array {
                type_tag: SEQUENCE.into(),
                length: 0,
                items: Items::Empty
            }
        );
        assert_eq!(schema.leaf_count(), 0);
    }

    #[test]
    fn typed_mapping_reports_its_type_name() {
        let r: Record = Mapping::typed("Pose").with("x", 0.0).into();
        assert_eq!(Schema::of(&r).type_tag(), "Pose");
    }

    #[test]
    fn describes_rejects_other_shapes() {
        let schema = Schema::of(&fixtures::nested());
        assert!(schema.describes(&fixtures::nested_scaled(3)));
        assert!(!schema.describes(&fixtures::xyz()));
        assert!(!schema.describes(&Record::Scalar(Scalar::Int(1))));
    }

    #[test]
    fn deep_records_do_not_overflow() {
        let mut r = Record::from(1);
        for _ in 0..10_000 {
            r = Record::Sequence(vec![r]);
        }
        let schema = Schema::of(&r);
        assert_eq!(schema.depth(), 10_000);
        assert_eq!(schema.leaf_count(), 1);
        // Tear down without recursive drops blowing the test thread's stack.
        std::mem::forget(schema);
        std::mem::forget(r);
    }

    #[test]
    fn node_count_treats_tensors_as_one_node() {
        let image = Tensor::new([4usize, 4, 3].as_slice(), vec![0.0; 48]).unwrap();
        let r: Record = Mapping::new()
            .with("image", image)
            .with("xs", Record::from_iter([1, 2, 3]))
            .into();
        // root, image, xs, three items
        assert_eq!(Schema::of(&r).node_count(), 6);
        assert_eq!(Schema::of_tensor(&[2, 2]).tensor_shape().as_deref(), Some(&[2usize, 2][..]));
        assert_eq!(Schema::of(&fixtures::xyz()).tensor_shape(), None);
    }

    #[test]
    fn node_count_saturates_on_huge_lengths() {
        let schema = Schema::Array {
            type_tag: SEQUENCE.into(),
            length: usize::MAX,
            items: Items::Uniform(Box::new(Schema::Object {
                type_tag: OBJECT.into(),
                properties: IndexMap::new(),
            })),
        };
        assert_eq!(schema.leaf_count(), 0);
        assert_eq!(schema.node_count(), usize::MAX);
    }

    proptest! {
        #[test]
        fn schema_agrees_with_record(record in arb_record()) {
            let schema = Schema::of(&record);
            prop_assert!(schema.describes(&record));
            prop_assert_eq!(schema.leaf_count(), record.leaf_count());
            prop_assert_eq!(schema.depth(), record.depth());
            prop_assert_eq!(Schema::of(&record.clone()), schema);
        }
    }
}
