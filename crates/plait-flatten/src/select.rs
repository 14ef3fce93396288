//! Wildcard selection of recurring sub-records.
//!
//! A [`Pattern`] is a separator-joined list of segments. A literal
//! segment names a mapping field exactly (case-sensitive); a literal that
//! parses as an integer also indexes a sequence or tensor. A `*` segment
//! expands every child of a sequence or tensor, and matching continues
//! independently below each child. Results concatenate in expansion order.
//!
//! ```text
//! steps.*.action   ->  [steps[0].action, steps[1].action, ...]
//! ```
//!
//! Branches that do not match simply contribute nothing. Only when a
//! segment matches nothing on any branch does selection fail, with
//! [`FlattenError::PatternNotFound`] naming that segment and the prefix
//! consumed so far.

use std::fmt;
use std::str::FromStr;

use plait_core::{FlattenError, LeafPath, Node, Record, Segment};

use crate::config::{DEFAULT_MAX_DEPTH, DEFAULT_SEPARATOR};

/// One step of a [`Pattern`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatternSegment {
    /// Exact field name, or an index into a sequence or tensor.
    Literal(String),
    /// Every child of a sequence or tensor.
    Wildcard,
}

impl PatternSegment {
    fn index(&self) -> Option<usize> {
        match self {
            Self::Literal(text) => text.parse().ok(),
            Self::Wildcard => None,
        }
    }
}

impl fmt::Display for PatternSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Wildcard => f.write_str("*"),
        }
    }
}

/// A parsed selector.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    separator: String,
    segments: Vec<PatternSegment>,
}

impl Pattern {
    /// Parse `text`, splitting on `sep`.
    ///
    /// Rejects an empty separator, an empty pattern, and empty segments
    /// (`a..b`, leading or trailing separators).
    pub fn parse(text: &str, sep: &str) -> Result<Self, FlattenError> {
        let invalid = |reason: String| FlattenError::InvalidPattern {
            pattern: text.to_owned(),
            reason,
        };
        if sep.is_empty() {
            return Err(invalid("separator is empty".to_owned()));
        }
        if text.is_empty() {
            return Err(invalid("pattern is empty".to_owned()));
        }
        let segments = text
            .split(sep)
            .enumerate()
            .map(|(i, part)| match part {
                "" => Err(invalid(format!("segment {i} is empty"))),
                "*" => Ok(PatternSegment::Wildcard),
                literal => Ok(PatternSegment::Literal(literal.to_owned())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            separator: sep.to_owned(),
            segments,
        })
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// The separator the pattern was parsed with.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a parsed pattern; provided for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether any segment is a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&PatternSegment::Wildcard)
    }

    fn prefix(&self, n: usize) -> String {
        self.segments[..n]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.segments.len()))
    }
}

impl FromStr for Pattern {
    type Err = FlattenError;

    /// Parse with the default `.` separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, DEFAULT_SEPARATOR)
    }
}

/// Every node matching `pattern`, copied out in expansion order.
///
/// Fails with [`FlattenError::DepthExceeded`] if the pattern is longer
/// than `max_depth`.
pub fn select(
    record: &Record,
    pattern: &Pattern,
    max_depth: usize,
) -> Result<Vec<Record>, FlattenError> {
    let found = matches(record, pattern, max_depth)?;
    tracing::debug!(pattern = %pattern, matches = found.len(), "selected");
    Ok(found.iter().map(|(_, node)| node.to_record()).collect())
}

/// The full path of every node matching `pattern`, in expansion order.
pub fn select_paths(
    record: &Record,
    pattern: &Pattern,
    max_depth: usize,
) -> Result<Vec<LeafPath>, FlattenError> {
    Ok(matches(record, pattern, max_depth)?
        .into_iter()
        .map(|(path, _)| path)
        .collect())
}

fn matches<'a>(
    record: &'a Record,
    pattern: &Pattern,
    max_depth: usize,
) -> Result<Vec<(LeafPath, Node<'a>)>, FlattenError> {
    let mut frontier = vec![(LeafPath::root(), record.node())];

    for (depth, segment) in pattern.segments().iter().enumerate() {
        let mut next = Vec::new();
        for (path, node) in &frontier {
            match segment {
                PatternSegment::Wildcard => {
                    let len = node.indexed_len().unwrap_or(0);
                    for i in 0..len {
                        let step = Segment::Index(i);
                        if let Some(child) = node.child(&step) {
                            next.push((path.child(step), child));
                        }
                    }
                }
                PatternSegment::Literal(name) => {
                    let step = match (node, segment.index()) {
                        (Node::Mapping(_), _) => Some(Segment::Field(name.clone())),
                        (Node::Sequence(_) | Node::Tensor(_), Some(i)) => Some(Segment::Index(i)),
                        _ => None,
                    };
                    if let Some(step) = step {
                        if let Some(child) = node.child(&step) {
                            next.push((path.child(step), child));
                        }
                    }
                }
            }
        }

        if next.is_empty() {
            return Err(FlattenError::PatternNotFound {
                segment: segment.to_string(),
                prefix: pattern.prefix(depth),
            });
        }
        if depth + 1 > max_depth {
            return Err(FlattenError::DepthExceeded {
                path: next.swap_remove(0).0,
                limit: max_depth,
            });
        }
        frontier = next;
    }

    Ok(frontier)
}

// ── Multi-pattern selection ────────────────────────────────────────

/// Matches of several patterns zipped into rows.
///
/// Column `j` holds the matches of pattern `j`. Row `i` holds the `i`-th
/// match of every pattern; patterns with fewer matches are padded with
/// `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<Record>>>,
}

impl SelectionTable {
    /// Column names: the patterns as written.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, each one cell per column.
    pub fn rows(&self) -> &[Vec<Option<Record>>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The cells of column `index`, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<&Record>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).and_then(Option::as_ref))
    }
}

/// Select every pattern from `record` and zip the matches into rows.
///
/// Any pattern that matches nothing fails the whole call.
pub fn select_rows(record: &Record, patterns: &[Pattern]) -> Result<SelectionTable, FlattenError> {
    let mut columns = Vec::with_capacity(patterns.len());
    let mut matched = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        columns.push(pattern.to_string());
        matched.push(select(record, pattern, DEFAULT_MAX_DEPTH)?);
    }

    let height = matched.iter().map(Vec::len).max().unwrap_or(0);
    let mut cells: Vec<_> = matched.into_iter().map(Vec::into_iter).collect();
    let rows = (0..height)
        .map(|_| cells.iter_mut().map(Iterator::next).collect())
        .collect();

    Ok(SelectionTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plait_core::{Mapping, Scalar, Tensor};
    use plait_test_utils::fixtures;

    fn pattern(text: &str) -> Pattern {
        text.parse().unwrap()
    }

    // ── Parsing ──────────────────────────────────────────────

    #[test]
    fn parse_literals_and_wildcards() {
        let p = pattern("steps.*.action");
        assert_eq!(
            p.segments(),
            [
                PatternSegment::Literal("steps".into()),
                PatternSegment::Wildcard,
                PatternSegment::Literal("action".into()),
            ]
        );
        assert!(p.has_wildcard());
        assert_eq!(p.to_string(), "steps.*.action");
    }

    #[test]
    fn parse_custom_separator() {
        let p = Pattern::parse("a/*/b.c", "/").unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.segments()[2], PatternSegment::Literal("b.c".into()));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        for bad in ["", "a..b", ".a", "a."] {
            let err = Pattern::parse(bad, ".").unwrap_err();
            assert!(
                matches!(err, FlattenError::InvalidPattern { .. }),
                "{bad:?} gave {err:?}"
            );
        }
        assert!(Pattern::parse("a", "").is_err());
    }

    // ── Selection ────────────────────────────────────────────

    #[test]
    fn wildcard_selects_one_per_element() {
        let record = fixtures::items_with_dict_value();
        let got = select(&record, &pattern("items.*.dict_value"), 256).unwrap();
        assert_eq!(got.len(), 3);
        for (n, sub) in got.iter().enumerate() {
            let expected: Record = Mapping::new()
                .with("key", "k")
                .with("value", n as i64 * 10)
                .into();
            assert_eq!(*sub, expected);
        }
    }

    #[test]
    fn literal_path_without_wildcard() {
        let got = select(&fixtures::xyz(), &pattern("z.b"), 256).unwrap();
        assert_eq!(got, [Record::from(4)]);
    }

    #[test]
    fn numeric_literal_indexes_sequences() {
        let got = select(&fixtures::nested(), &pattern("b.1.d"), 256).unwrap();
        assert_eq!(got, [Record::from_iter([6, 7])]);
    }

    #[test]
    fn wildcard_over_tensor_yields_slices() {
        let t = Tensor::new([2usize, 2].as_slice(), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let record: Record = Mapping::new().with("t", t).into();
        let got = select(&record, &pattern("t.*"), 256).unwrap();
        assert_eq!(
            got,
            [
                Record::Tensor(Tensor::from_vec(vec![1.0, 2.0])),
                Record::Tensor(Tensor::from_vec(vec![3.0, 4.0])),
            ]
        );
    }

    #[test]
    fn nested_wildcards_concatenate_in_order() {
        let got = select(&fixtures::nested(), &pattern("b.*.d.*"), 256).unwrap();
        let values: Vec<Record> = [3, 4, 6, 7].into_iter().map(Record::from).collect();
        assert_eq!(got, values);
    }

    #[test]
    fn wildcard_on_mapping_matches_nothing() {
        let err = select(&fixtures::xyz(), &pattern("z.*"), 256).unwrap_err();
        assert_eq!(
            err,
            FlattenError::PatternNotFound {
                segment: "*".into(),
                prefix: "z".into(),
            }
        );
    }

    #[test]
    fn missing_field_reports_deepest_segment() {
        let record = fixtures::episode(2);
        let err = select(&record, &pattern("steps.*.action.torque"), 256).unwrap_err();
        assert_eq!(
            err,
            FlattenError::PatternNotFound {
                segment: "torque".into(),
                prefix: "steps.*.action".into(),
            }
        );
        let err = select(&record, &pattern("stepz"), 256).unwrap_err();
        assert_eq!(err.to_string(), "pattern segment 'stepz' matched nothing at the root");
    }

    #[test]
    fn partial_branches_are_skipped() {
        let record: Record = Mapping::new()
            .with(
                "items",
                Record::Sequence(vec![
                    Mapping::new().with("a", 1).into(),
                    Mapping::new().with("b", 2).into(),
                    Mapping::new().with("a", 3).into(),
                ]),
            )
            .into();
        let got = select(&record, &pattern("items.*.a"), 256).unwrap();
        assert_eq!(got, [Record::from(1), Record::from(3)]);
    }

    #[test]
    fn field_names_are_case_sensitive() {
        assert!(select(&fixtures::xyz(), &pattern("X"), 256).is_err());
    }

    #[test]
    fn depth_limit_applies() {
        let err = select(&fixtures::nested(), &pattern("e.g.0.h"), 3).unwrap_err();
        assert!(matches!(err, FlattenError::DepthExceeded { limit: 3, .. }));
    }

    #[test]
    fn select_paths_reports_positions() {
        let paths = select_paths(&fixtures::nested(), &pattern("e.g.*.i"), 256).unwrap();
        let rendered: Vec<String> = paths.iter().map(|p| p.render(".")).collect();
        assert_eq!(rendered, ["e.g.0.i", "e.g.1.i"]);
    }

    // ── Multi-pattern rows ───────────────────────────────────

    #[test]
    fn rows_zip_columns_and_pad() {
        let record = fixtures::nested();
        let table = select_rows(&record, &[pattern("b.*.c"), pattern("a")]).unwrap();
        assert_eq!(table.columns(), ["b.*.c", "a"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[0],
            [Some(Record::from(2)), Some(Record::from(1))]
        );
        assert_eq!(table.rows()[1], [Some(Record::from(5)), None]);
        let second: Vec<_> = table.column(1).collect();
        assert_eq!(second, [Some(&Record::from(1)), None]);
    }

    #[test]
    fn rows_fail_if_any_pattern_misses() {
        let err = select_rows(&fixtures::xyz(), &[pattern("x"), pattern("w")]).unwrap_err();
        assert!(matches!(err, FlattenError::PatternNotFound { .. }));
    }

    #[test]
    fn selected_scalars_are_copies() {
        let record = fixtures::mixed();
        let got = select(&record, &pattern("s"), 256).unwrap();
        assert_eq!(got, [Record::Scalar(Scalar::Str("text".into()))]);
    }
}
