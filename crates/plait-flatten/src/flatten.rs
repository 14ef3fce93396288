//! The flatten engine.
//!
//! A depth-first, pre-order walk emits one leaf per scalar and one per
//! tensor element: mapping fields in insertion order, sequence items and
//! tensor elements in index order. The walk uses an explicit stack and
//! enforces the configured depth limit, so deep records fail cleanly with
//! [`FlattenError::DepthExceeded`] instead of exhausting the call stack.
//!
//! The leaf order is exactly the order [`unflatten`](fn@crate::unflatten)
//! consumes, which is what makes `unflatten(flatten(r), Schema::of(r))`
//! reproduce `r`.

use indexmap::IndexMap;

use plait_core::{FlattenError, LeafPath, Node, Record, Scalar, Segment};

use crate::config::{ConfigError, FlattenConfig, NonNumericalPolicy, OutputKind};
use crate::index::PathIndex;
use crate::select::{select, Pattern};

/// Result of a flatten.
#[derive(Clone, Debug, PartialEq)]
pub enum Flattened {
    /// Leaf values in traversal order.
    Leaves(Vec<Scalar>),
    /// Leaf values keyed by minimal path, in traversal order.
    Paths(IndexMap<String, Scalar>),
    /// Sub-records matched by a selector, in expansion order.
    Selection(Vec<Record>),
}

impl Flattened {
    /// Number of leaves or selected records.
    pub fn len(&self) -> usize {
        match self {
            Self::Leaves(v) => v.len(),
            Self::Paths(m) => m.len(),
            Self::Selection(v) => v.len(),
        }
    }

    /// Whether nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail with [`FlattenError::EmptyStructure`] if nothing was emitted.
    pub fn require_non_empty(self) -> Result<Self, FlattenError> {
        if self.is_empty() {
            return Err(FlattenError::EmptyStructure);
        }
        Ok(self)
    }

    /// The leaf values in traversal order, whatever the output kind.
    ///
    /// `None` for selections, which hold sub-records rather than leaves.
    pub fn into_leaves(self) -> Option<Vec<Scalar>> {
        match self {
            Self::Leaves(v) => Some(v),
            Self::Paths(m) => Some(m.into_values().collect()),
            Self::Selection(_) => None,
        }
    }
}

/// A validated, reusable flatten configuration.
#[derive(Clone, Debug, Default)]
pub struct Flattener {
    config: FlattenConfig,
    selector: Option<Pattern>,
}

impl Flattener {
    /// Validate `config` and parse its selector.
    pub fn new(config: FlattenConfig) -> Result<Self, ConfigError> {
        let selector = config.compile_selector()?;
        Ok(Self { config, selector })
    }

    /// The configuration this flattener was built from.
    pub fn config(&self) -> &FlattenConfig {
        &self.config
    }

    /// The parsed selector, if any.
    pub fn selector(&self) -> Option<&Pattern> {
        self.selector.as_ref()
    }

    /// Flatten `record` according to the configured output kind.
    pub fn flatten(&self, record: &Record) -> Result<Flattened, FlattenError> {
        match (self.config.output, &self.selector) {
            (OutputKind::Selection, Some(pattern)) => Ok(Flattened::Selection(select(
                record,
                pattern,
                self.config.max_depth,
            )?)),
            (OutputKind::Dict, _) => self.paths(record).map(Flattened::Paths),
            // `new` rejects selection without a selector.
            (OutputKind::List | OutputKind::Selection, _) => {
                self.leaves(record).map(Flattened::Leaves)
            }
        }
    }

    /// Leaf values in traversal order, ignoring the configured output kind.
    pub fn leaves(&self, record: &Record) -> Result<Vec<Scalar>, FlattenError> {
        let mut out = Collected::default();
        self.walk(record, false, &mut out)?;
        tracing::debug!(leaves = out.values.len(), "flattened to list");
        Ok(out.values)
    }

    /// Leaf values keyed by minimal path, ignoring the configured output kind.
    ///
    /// Keys are computed over the leaves that survive the ignore set and the
    /// non-numerical policy, so a dropped leaf never lengthens another's key.
    pub fn paths(&self, record: &Record) -> Result<IndexMap<String, Scalar>, FlattenError> {
        let mut out = Collected::default();
        self.walk(record, true, &mut out)?;
        let index = PathIndex::build(&out.paths, &self.config.separator)?;
        tracing::debug!(leaves = index.len(), "flattened to dict");
        Ok(index.into_keys().into_iter().zip(out.values).collect())
    }

    fn walk<'a>(
        &self,
        record: &'a Record,
        want_paths: bool,
        out: &mut Collected,
    ) -> Result<(), FlattenError> {
        let limit = self.config.max_depth;
        let mut path = LeafPath::root();
        let mut stack = vec![Step::Visit(record.node())];

        while let Some(step) = stack.pop() {
            let node = match step {
                Step::Leave => {
                    path.pop();
                    continue;
                }
                Step::Enter(segment, node) => {
                    path.push(segment);
                    stack.push(Step::Leave);
                    node
                }
                Step::Visit(node) => node,
            };

            if path.len() > limit {
                return Err(FlattenError::DepthExceeded {
                    path: path.clone(),
                    limit,
                });
            }

            match node {
                Node::Scalar(value) => self.emit(value, &path, want_paths, out)?,
                Node::Sequence(items) => {
                    stack.extend(
                        items
                            .iter()
                            .enumerate()
                            .rev()
                            .map(|(i, item)| Step::Enter(Segment::Index(i), item.node())),
                    );
                }
                Node::Mapping(mapping) => {
                    stack.extend(
                        mapping
                            .iter()
                            .rev()
                            .filter(|(name, _)| !self.config.ignore.contains(name.as_str()))
                            .map(|(name, child)| {
                                Step::Enter(Segment::Field(name.clone()), child.node())
                            }),
                    );
                }
                Node::Tensor(view) => {
                    if path.len() + view.rank() > limit {
                        return Err(FlattenError::DepthExceeded {
                            path: path.clone(),
                            limit,
                        });
                    }
                    out.values.extend(view.data().iter().map(|&v| Scalar::Float(v)));
                    if want_paths {
                        let shape = view.shape();
                        for flat in 0..view.data().len() {
                            let mut leaf = path.clone();
                            for index in unravel(flat, shape) {
                                leaf.push(Segment::Index(index));
                            }
                            out.paths.push(leaf);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn emit(
        &self,
        value: &Scalar,
        path: &LeafPath,
        want_paths: bool,
        out: &mut Collected,
    ) -> Result<(), FlattenError> {
        if !value.is_numeric() {
            match self.config.non_numerical {
                NonNumericalPolicy::Allow => {}
                NonNumericalPolicy::Ignore => return Ok(()),
                NonNumericalPolicy::Forbid => {
                    return Err(FlattenError::NonNumericalValue {
                        path: path.clone(),
                        found: value.type_tag(),
                    })
                }
            }
        }
        out.values.push(value.clone());
        if want_paths {
            out.paths.push(path.clone());
        }
        Ok(())
    }
}

enum Step<'a> {
    Visit(Node<'a>),
    Enter(Segment, Node<'a>),
    Leave,
}

#[derive(Default)]
struct Collected {
    values: Vec<Scalar>,
    paths: Vec<LeafPath>,
}

/// Row-major multi-index of element `flat` in a tensor of `shape`.
pub(crate) fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (slot, &extent) in index.iter_mut().zip(shape).rev() {
        if extent > 0 {
            *slot = flat % extent;
            flat /= extent;
        }
    }
    index
}

// ── One-shot helpers ───────────────────────────────────────────────

/// Flatten with default settings to the given output kind.
///
/// [`OutputKind::Selection`] needs a selector; use a [`Flattener`] built
/// from [`FlattenConfig::selection`] instead. Asking for it here fails
/// with [`FlattenError::InvalidPattern`].
pub fn flatten(record: &Record, output: OutputKind) -> Result<Flattened, FlattenError> {
    let flattener = Flattener::default();
    match output {
        OutputKind::List => flattener.leaves(record).map(Flattened::Leaves),
        OutputKind::Dict => flattener.paths(record).map(Flattened::Paths),
        OutputKind::Selection => Err(FlattenError::InvalidPattern {
            pattern: String::new(),
            reason: "selection output requires a selector".to_owned(),
        }),
    }
}

/// All leaf values of `record` in traversal order.
pub fn flatten_leaves(record: &Record) -> Result<Vec<Scalar>, FlattenError> {
    Flattener::default().leaves(record)
}

/// All leaf values of `record` keyed by minimal path.
pub fn flatten_paths(record: &Record) -> Result<IndexMap<String, Scalar>, FlattenError> {
    Flattener::default().paths(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plait_core::{Mapping, Tensor};
    use plait_test_utils::fixtures;

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().copied().map(Scalar::Int).collect()
    }

    fn keys(map: &IndexMap<String, Scalar>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    // ── List output ──────────────────────────────────────────

    #[test]
    fn list_of_simple_mapping() {
        assert_eq!(flatten_leaves(&fixtures::xyz()).unwrap(), ints(&[1, 2, 3, 4]));
    }

    #[test]
    fn list_of_nested_record() {
        let leaves = flatten_leaves(&fixtures::nested()).unwrap();
        assert_eq!(leaves, ints(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]));
    }

    #[test]
    fn rank_zero_tensor_is_one_leaf() {
        let record = Record::Tensor(Tensor::scalar(2.5));
        assert_eq!(flatten_leaves(&record).unwrap(), [Scalar::Float(2.5)]);

        let wrapped: Record = Mapping::new().with("v", Tensor::scalar(-1.0)).into();
        assert_eq!(
            flatten_paths(&wrapped).unwrap(),
            IndexMap::from([("v".to_owned(), Scalar::Float(-1.0))])
        );
    }

    #[test]
    fn tensor_elements_in_row_major_order() {
        let t = Tensor::new([2usize, 3].as_slice(), (0..6).map(f64::from).collect()).unwrap();
        let leaves = flatten_leaves(&Record::Tensor(t)).unwrap();
        let expected: Vec<Scalar> = (0..6).map(|v| Scalar::Float(f64::from(v))).collect();
        assert_eq!(leaves, expected);
    }

    #[test]
    fn empty_containers_emit_nothing() {
        let record: Record = Mapping::new()
            .with("empty_seq", Record::Sequence(vec![]))
            .with("empty_map", Mapping::new())
            .with("empty_tensor", Tensor::new([0usize, 3].as_slice(), vec![]).unwrap())
            .into();
        let flat = flatten(&record, OutputKind::List).unwrap();
        assert!(flat.is_empty());
        assert_eq!(flat.require_non_empty(), Err(FlattenError::EmptyStructure));
    }

    #[test]
    fn root_scalar_is_one_leaf() {
        assert_eq!(flatten_leaves(&Record::from(7)).unwrap(), ints(&[7]));
        let paths = flatten_paths(&Record::from(7)).unwrap();
        assert_eq!(keys(&paths), [""]);
    }

    // ── Dict output ──────────────────────────────────────────

    #[test]
    fn dict_uses_terminal_names_when_unique() {
        let paths = flatten_paths(&fixtures::xyz()).unwrap();
        assert_eq!(keys(&paths), ["x", "y", "a", "b"]);
        assert_eq!(paths["a"], Scalar::Int(3));
    }

    #[test]
    fn dict_grows_colliding_names() {
        let record: Record = Mapping::new()
            .with("x", 1)
            .with("y", 2)
            .with("z", Mapping::new().with("a", 3).with("x", 4))
            .into();
        let paths = flatten_paths(&record).unwrap();
        assert_eq!(keys(&paths), ["x", "y", "a", "z.x"]);
    }

    #[test]
    fn dict_of_nested_record() {
        let paths = flatten_paths(&fixtures::nested()).unwrap();
        assert_eq!(
            keys(&paths),
            [
                "a", "b.0.c", "b.0.d.0", "b.0.d.1", "b.1.c", "b.1.d.0", "b.1.d.1", "f", "g.0.h",
                "g.0.i", "g.1.h", "g.1.i",
            ]
        );
        let values: Vec<Scalar> = paths.into_values().collect();
        assert_eq!(values, ints(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]));
    }

    #[test]
    fn dict_tensor_elements_carry_indices() {
        let t = Tensor::new([2usize, 2].as_slice(), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let record: Record = Mapping::new().with("img", t).into();
        let paths = flatten_paths(&record).unwrap();
        assert_eq!(keys(&paths), ["img.0.0", "img.0.1", "img.1.0", "img.1.1"]);
    }

    #[test]
    fn dict_with_custom_separator() {
        let config = FlattenConfig::dict().with_separator("/");
        let flat = Flattener::new(config).unwrap().flatten(&fixtures::nested()).unwrap();
        let Flattened::Paths(paths) = flat else {
            panic!("dict output must produce paths");
        };
        assert!(paths.contains_key("b/0/d/1"));
    }

    // ── Filtering ────────────────────────────────────────────

    #[test]
    fn forbid_reports_first_non_numeric_path() {
        let config = FlattenConfig::list().with_non_numerical(NonNumericalPolicy::Forbid);
        let err = Flattener::new(config)
            .unwrap()
            .flatten(&fixtures::mixed())
            .unwrap_err();
        let expected_path: LeafPath = [Segment::from("s")].into_iter().collect();
        assert_eq!(
            err,
            FlattenError::NonNumericalValue {
                path: expected_path,
                found: "string",
            }
        );
    }

    #[test]
    fn ignore_policy_drops_non_numeric() {
        let config = FlattenConfig::list().with_non_numerical(NonNumericalPolicy::Ignore);
        let flat = Flattener::new(config).unwrap().flatten(&fixtures::mixed()).unwrap();
        assert_eq!(flat, Flattened::Leaves(vec![Scalar::Int(1), Scalar::Float(0.5)]));
    }

    #[test]
    fn allow_policy_keeps_everything() {
        let leaves = flatten_leaves(&fixtures::mixed()).unwrap();
        assert_eq!(leaves.len(), 6);
        assert_eq!(leaves[4], Scalar::Null);
    }

    #[test]
    fn ignored_fields_are_skipped_at_any_depth() {
        let config = FlattenConfig::dict().ignoring("instruction").ignoring("image");
        let flat = Flattener::new(config).unwrap().flatten(&fixtures::episode(2)).unwrap();
        let Flattened::Paths(paths) = flat else {
            panic!("dict output must produce paths");
        };
        assert_eq!(
            keys(&paths),
            [
                "steps.0.action.gripper",
                "steps.0.action.xyz.0",
                "steps.0.action.xyz.1",
                "steps.0.action.xyz.2",
                "steps.0.reward",
                "steps.1.action.gripper",
                "steps.1.action.xyz.0",
                "steps.1.action.xyz.1",
                "steps.1.action.xyz.2",
                "steps.1.reward",
            ]
        );
    }

    #[test]
    fn dropped_leaves_do_not_lengthen_keys() {
        let record: Record = Mapping::new()
            .with("a", Mapping::new().with("v", 1))
            .with("b", Mapping::new().with("v", "text"))
            .into();
        let config = FlattenConfig::dict().with_non_numerical(NonNumericalPolicy::Ignore);
        let flat = Flattener::new(config).unwrap().flatten(&record).unwrap();
        let Flattened::Paths(paths) = flat else {
            panic!("dict output must produce paths");
        };
        assert_eq!(keys(&paths), ["v"]);
    }

    // ── Selection and limits ─────────────────────────────────

    #[test]
    fn selection_output_delegates_to_selector() {
        let flattener = Flattener::new(FlattenConfig::selection("steps.*.reward")).unwrap();
        let flat = flattener.flatten(&fixtures::episode(3)).unwrap();
        assert_eq!(
            flat,
            Flattened::Selection(vec![Record::from(1.0), Record::from(0.0), Record::from(1.0)])
        );
        assert!(flat.into_leaves().is_none());
    }

    #[test]
    fn one_shot_selection_needs_selector() {
        let err = flatten(&fixtures::xyz(), OutputKind::Selection).unwrap_err();
        assert!(matches!(err, FlattenError::InvalidPattern { .. }));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut record = Record::from(1);
        for _ in 0..10 {
            record = Record::Sequence(vec![record]);
        }
        let flattener = Flattener::new(FlattenConfig::list().with_max_depth(9)).unwrap();
        match flattener.flatten(&record).unwrap_err() {
            FlattenError::DepthExceeded { path, limit } => {
                assert_eq!(limit, 9);
                assert_eq!(path.len(), 10);
            }
            other => panic!("expected a depth error, got {other:?}"),
        }

        let flattener = Flattener::new(FlattenConfig::list().with_max_depth(10)).unwrap();
        assert_eq!(flattener.flatten(&record).unwrap().len(), 1);
    }

    #[test]
    fn tensor_rank_counts_towards_depth() {
        let t = Tensor::new([1usize, 1, 1].as_slice(), vec![0.0]).unwrap();
        let record: Record = Mapping::new().with("t", t).into();
        let shallow = Flattener::new(FlattenConfig::list().with_max_depth(3)).unwrap();
        assert!(matches!(
            shallow.flatten(&record),
            Err(FlattenError::DepthExceeded { .. })
        ));
        let deep = Flattener::new(FlattenConfig::list().with_max_depth(4)).unwrap();
        assert!(deep.flatten(&record).is_ok());
    }

    #[test]
    fn unravel_row_major() {
        assert_eq!(unravel(0, &[2, 3]), [0, 0]);
        assert_eq!(unravel(4, &[2, 3]), [1, 1]);
        assert_eq!(unravel(5, &[2, 3]), [1, 2]);
        assert!(unravel(0, &[]).is_empty());
    }
}
