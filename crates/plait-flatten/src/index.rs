//! Minimal-path keys for dict output.
//!
//! Every leaf gets the shortest path suffix that still tells it apart
//! from every other leaf. Suffixes are measured in named units: a field
//! segment together with the index segments that trail it. `b.0.d.1`
//! has units `b.0` and `d.1`, so its candidate keys are `d.1` and then
//! `b.0.d.1`. A key never starts with a bare index.
//!
//! [`PathIndex::build`] runs in two passes. Pass one groups leaves by
//! terminal field name. Pass two grows one suffix length per group until
//! the group's keys are distinct. Growth is per group, so a collision
//! between `b.*.c` leaves never lengthens the key of an unrelated `x`.
//! If keys from different groups still collide, both groups keep
//! growing; a collision that survives the full path fails with
//! [`FlattenError::AmbiguousPath`].

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use smallvec::SmallVec;

use plait_core::path::render_segments;
use plait_core::{FlattenError, LeafPath, Segment};

/// Segment ranges of each named unit of one path, root first.
type Units = SmallVec<[Range<usize>; 8]>;

/// Minimal keys for a set of leaf paths, in the order the paths were given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathIndex {
    keys: Vec<String>,
}

struct Group {
    members: Vec<usize>,
    /// Number of trailing units rendered for every member.
    units: usize,
    /// Largest unit count among the members.
    max_units: usize,
}

impl PathIndex {
    /// Compute a minimal key for every path.
    ///
    /// Duplicate paths are reported as [`FlattenError::AmbiguousPath`].
    pub fn build(paths: &[LeafPath], sep: &str) -> Result<Self, FlattenError> {
        let units: Vec<Units> = paths.iter().map(|p| split_units(p.segments())).collect();

        // Pass 1: group by terminal field name.
        let mut group_of: HashMap<Option<&str>, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            let g = *group_of.entry(path.terminal_field()).or_insert_with(|| {
                groups.push(Group {
                    members: Vec::new(),
                    units: 1,
                    max_units: 0,
                });
                groups.len() - 1
            });
            groups[g].members.push(i);
            groups[g].max_units = groups[g].max_units.max(units[i].len());
        }

        let render = |i: usize, n: usize| -> String {
            let u = &units[i];
            let start = u.len().saturating_sub(n);
            let from = u.get(start).map_or(0, |r| r.start);
            render_segments(&paths[i].segments()[from..], sep)
        };

        // Pass 2: grow each group until its own keys are distinct.
        let mut keys = vec![String::new(); paths.len()];
        for group in &mut groups {
            loop {
                let mut seen = HashSet::with_capacity(group.members.len());
                let mut distinct = true;
                for &i in &group.members {
                    let key = render(i, group.units);
                    if !seen.insert(key.clone()) {
                        distinct = false;
                    }
                    keys[i] = key;
                }
                if distinct || group.units >= group.max_units {
                    break;
                }
                group.units += 1;
                tracing::trace!(
                    terminal = ?paths[group.members[0]].terminal_field(),
                    units = group.units,
                    "growing minimal-path suffix"
                );
            }
        }

        // Cross-group collisions: keep growing the groups involved.
        loop {
            let mut owner: HashMap<&str, usize> = HashMap::with_capacity(keys.len());
            let mut clash: Option<(usize, usize)> = None;
            for (i, key) in keys.iter().enumerate() {
                if let Some(&j) = owner.get(key.as_str()) {
                    clash = Some((j, i));
                    break;
                }
                owner.insert(key.as_str(), i);
            }
            let Some((a, b)) = clash else { break };

            let mut grew = false;
            for leaf in [a, b] {
                let g = group_of[&paths[leaf].terminal_field()];
                let group = &mut groups[g];
                if group.units < group.max_units {
                    group.units += 1;
                    for &i in &group.members {
                        keys[i] = render(i, group.units);
                    }
                    grew = true;
                }
            }
            if !grew {
                return Err(FlattenError::AmbiguousPath {
                    key: keys[b].clone(),
                });
            }
        }

        Ok(Self { keys })
    }

    /// The keys, one per input path.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Consume the index, returning its keys.
    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Split a path into named units. Index segments before the first field
/// (a record whose root is a sequence) form a leading unit of their own.
fn split_units(segments: &[Segment]) -> Units {
    let mut units = Units::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Field(_) => units.push(i..i + 1),
            Segment::Index(_) => match units.last_mut() {
                Some(unit) => unit.end = i + 1,
                None => units.push(i..i + 1),
            },
        }
    }
    units
}
