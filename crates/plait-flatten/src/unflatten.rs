//! Rebuild records from leaves and a schema.
//!
//! The schema drives the replay: object properties in declared order,
//! exactly `length` items per array, one leaf per scalar slot. Array
//! lengths come from the schema, never from the leaves. Before anything
//! is built, the leaf count is checked against [`Schema::leaf_count`] and
//! the node count against a limit, so a short or long leaf list fails up
//! front with [`UnflattenError::LeafCountMismatch`] and a tiny document
//! cannot declare an unbounded amount of work. An array whose item
//! schemas disagree with its `length` fails with
//! [`UnflattenError::MalformedSchema`], and the replay must end exactly
//! on the last leaf.
//!
//! Tensor-typed nodes consume their whole block of leaves at once and
//! come back as a [`Tensor`] of the recorded shape. Mapping type names
//! recorded in the schema are restored.

use indexmap::IndexMap;

use plait_core::tensor::element_count;
use plait_core::{LeafPath, Mapping, Record, Scalar, Segment, Shape, Tensor, UnflattenError};
use plait_schema::{Items, Schema};

use crate::config::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES};
use crate::flatten::unravel;

/// Rebuild a record from `leaves` in traversal order.
pub fn unflatten(leaves: &[Scalar], schema: &Schema) -> Result<Record, UnflattenError> {
    unflatten_with_limits(leaves, schema, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES)
}

/// Rebuild a record from a minimal-path map.
///
/// Keys are not interpreted; values are consumed in map order, which is
/// the traversal order a dict flatten produces.
pub fn unflatten_paths(
    paths: &IndexMap<String, Scalar>,
    schema: &Schema,
) -> Result<Record, UnflattenError> {
    let leaves: Vec<Scalar> = paths.values().cloned().collect();
    unflatten(&leaves, schema)
}

/// [`unflatten`] with an explicit nesting limit.
pub fn unflatten_with_limit(
    leaves: &[Scalar],
    schema: &Schema,
    max_depth: usize,
) -> Result<Record, UnflattenError> {
    unflatten_with_limits(leaves, schema, max_depth, DEFAULT_MAX_NODES)
}

/// [`unflatten`] with explicit nesting and node limits.
pub fn unflatten_with_limits(
    leaves: &[Scalar],
    schema: &Schema,
    max_depth: usize,
    max_nodes: usize,
) -> Result<Record, UnflattenError> {
    let expected = schema.leaf_count();
    if expected != leaves.len() {
        return Err(UnflattenError::LeafCountMismatch {
            expected,
            actual: leaves.len(),
        });
    }
    let nodes = schema.node_count();
    if nodes > max_nodes {
        return Err(UnflattenError::TooManyNodes {
            count: nodes,
            limit: max_nodes,
        });
    }

    let mut replay = Replay {
        leaves,
        cursor: 0,
        path: LeafPath::root(),
        max_depth,
    };
    let record = replay.run(schema)?;
    if replay.cursor != leaves.len() {
        return Err(UnflattenError::LeafCountMismatch {
            expected: replay.cursor,
            actual: leaves.len(),
        });
    }
    tracing::debug!(leaves = leaves.len(), nodes, "unflattened");
    Ok(record)
}

enum Task<'s> {
    Visit(&'s Schema),
    Enter(Segment, &'s Schema),
    Leave,
    /// Items `next..length` of an array, produced one at a time.
    Items {
        items: &'s Items,
        next: usize,
        length: usize,
    },
    Sequence {
        len: usize,
    },
    Object {
        type_tag: &'s str,
        names: &'s IndexMap<String, Schema>,
    },
}

struct Replay<'l> {
    leaves: &'l [Scalar],
    cursor: usize,
    path: LeafPath,
    max_depth: usize,
}

impl<'l> Replay<'l> {
    fn run(&mut self, schema: &Schema) -> Result<Record, UnflattenError> {
        let mut results: Vec<Record> = Vec::new();
        let mut tasks = vec![Task::Visit(schema)];

        while let Some(task) = tasks.pop() {
            let schema = match task {
                Task::Visit(schema) => schema,
                Task::Enter(segment, schema) => {
                    self.path.push(segment);
                    tasks.push(Task::Leave);
                    schema
                }
                Task::Leave => {
                    self.path.pop();
                    continue;
                }
                Task::Items {
                    items,
                    next,
                    length,
                } => {
                    if next < length {
                        let item = items.get(next).ok_or_else(|| self.malformed(length, items))?;
                        tasks.push(Task::Items {
                            items,
                            next: next + 1,
                            length,
                        });
                        tasks.push(Task::Enter(Segment::Index(next), item));
                    }
                    continue;
                }
                Task::Sequence { len } => {
                    let items = results.split_off(results.len() - len);
                    results.push(Record::Sequence(items));
                    continue;
                }
                Task::Object { type_tag, names } => {
                    let values = results.split_off(results.len() - names.len());
                    let mut mapping: Mapping = names.keys().cloned().zip(values).collect();
                    mapping.set_type_name(Some(type_tag.to_owned()));
                    results.push(Record::Mapping(mapping));
                    continue;
                }
            };

            self.check_depth(0)?;

            if let Some(shape) = schema.tensor_shape() {
                self.check_depth(shape.len())?;
                results.push(Record::Tensor(self.take_tensor(shape)?));
                continue;
            }

            match schema {
                Schema::Scalar { .. } => {
                    let leaf = self.take()?;
                    results.push(Record::Scalar(leaf.clone()));
                }
                Schema::Array { length, items, .. } => {
                    let consistent = match items {
                        Items::Empty => *length == 0,
                        Items::Uniform(_) => true,
                        Items::PerIndex(schemas) => schemas.len() == *length,
                    };
                    if !consistent {
                        return Err(self.malformed(*length, items));
                    }
                    tasks.push(Task::Sequence { len: *length });
                    tasks.push(Task::Items {
                        items,
                        next: 0,
                        length: *length,
                    });
                }
                Schema::Object {
                    type_tag,
                    properties,
                } => {
                    tasks.push(Task::Object {
                        type_tag: type_tag.as_str(),
                        names: properties,
                    });
                    tasks.extend(
                        properties
                            .iter()
                            .rev()
                            .map(|(name, s)| Task::Enter(Segment::Field(name.clone()), s)),
                    );
                }
            }
        }

        debug_assert_eq!(results.len(), 1);
        results.pop().ok_or(UnflattenError::LeafCountMismatch {
            expected: self.cursor,
            actual: self.leaves.len(),
        })
    }

    fn malformed(&self, length: usize, items: &Items) -> UnflattenError {
        let held = match items {
            Items::Empty => 0,
            Items::Uniform(_) => 1,
            Items::PerIndex(schemas) => schemas.len(),
        };
        UnflattenError::MalformedSchema {
            path: self.path.clone(),
            reason: format!("array declares length {length} but holds {held} item schemas"),
        }
    }

    fn check_depth(&self, extra: usize) -> Result<(), UnflattenError> {
        if self.path.len() + extra > self.max_depth {
            return Err(UnflattenError::DepthExceeded {
                path: self.path.clone(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn take(&mut self) -> Result<&'l Scalar, UnflattenError> {
        let leaf = self
            .leaves
            .get(self.cursor)
            .ok_or(UnflattenError::LeafCountMismatch {
                expected: self.cursor + 1,
                actual: self.leaves.len(),
            })?;
        self.cursor += 1;
        Ok(leaf)
    }

    fn take_tensor(&mut self, shape: Shape) -> Result<Tensor, UnflattenError> {
        let count = element_count(&shape).ok_or(UnflattenError::LeafCountMismatch {
            expected: usize::MAX,
            actual: self.leaves.len(),
        })?;
        let mut data = Vec::with_capacity(count.min(self.leaves.len() - self.cursor));
        for _ in 0..count {
            let offset = data.len();
            let leaf = self.take()?;
            let value = leaf.as_f64().ok_or_else(|| UnflattenError::LeafTypeMismatch {
                path: element_path(&self.path, offset, &shape),
                expected: "number",
                found: leaf.type_tag(),
            })?;
            data.push(value);
        }
        let len = data.len();
        Tensor::new(shape, data).map_err(|_| UnflattenError::LeafCountMismatch {
            expected: count,
            actual: len,
        })
    }
}

fn element_path(base: &LeafPath, flat: usize, shape: &[usize]) -> LeafPath {
    let mut path = base.clone();
    for i in unravel(flat, shape) {
        path.push(Segment::Index(i));
    }
    path
}
