//! Leaf paths: positions inside a record.
//!
//! A [`LeafPath`] is the chain of [`Segment`]s from the root of a record
//! down to one node. Field segments name a mapping entry; index segments
//! name a position in a sequence or tensor.

use std::fmt;

use smallvec::SmallVec;

/// One step of a [`LeafPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// A mapping field name.
    Field(String),
    /// A position in a sequence or along a tensor's first axis.
    Index(usize),
}

impl Segment {
    /// The field name, or `None` for index segments.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_owned())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Root-to-node path. Most paths are shallow, so eight segments stay inline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafPath {
    segments: SmallVec<[Segment; 8]>,
}

impl LeafPath {
    /// The empty path, naming the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Append a segment.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    /// A copy of this path extended by one segment.
    pub fn child(&self, segment: Segment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// The segments, root first.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The innermost field name, skipping trailing index segments.
    pub fn terminal_field(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(Segment::as_field)
    }

    /// Join the segments with `sep`.
    pub fn render(&self, sep: &str) -> String {
        render_segments(&self.segments, sep)
    }
}

/// Join `segments` with `sep`.
pub fn render_segments(segments: &[Segment], sep: &str) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        match seg {
            Segment::Field(name) => out.push_str(name),
            Segment::Index(idx) => out.push_str(&idx.to_string()),
        }
    }
    out
}

impl fmt::Display for LeafPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.render("."))
    }
}

impl FromIterator<Segment> for LeafPath {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LeafPath {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
