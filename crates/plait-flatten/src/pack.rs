//! Transposing between a list of mappings and a mapping of lists.
//!
//! ```text
//! [{a: 1, b: 4},          {a: [1, 2, 3],
//!  {a: 2, b: 5},   <->     b: [4, 5, 6]}
//!  {a: 3, b: 6}]
//! ```
//!
//! [`unpack_from`] goes left to right, [`pack`] right to left. Ragged
//! inputs are resolved by a [`Padding`] strategy.

use plait_core::{Mapping, PackError, Record};

/// How to reconcile inputs of different lengths.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Padding {
    /// Keep only what every input has.
    #[default]
    Truncate,
    /// Keep everything, filling gaps with the given value.
    Longest(Record),
}

/// Zip a list of mappings into one mapping of sequences.
///
/// Field names and the type name come from the first mapping. Under
/// [`Padding::Truncate`] a field is kept only if every mapping has it;
/// under [`Padding::Longest`] missing values are filled with the pad.
pub fn unpack_from(records: &[Record], padding: &Padding) -> Result<Mapping, PackError> {
    let mappings = records
        .iter()
        .enumerate()
        .map(|(index, r)| match r {
            Record::Mapping(m) => Ok(m),
            _ => Err(PackError::ExpectedMapping { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let first = mappings.first().ok_or(PackError::Empty)?;

    let mut packed = Mapping::new();
    packed.set_type_name(first.type_name().map(str::to_owned));
    for name in first.keys() {
        let column: Option<Vec<Record>> = mappings
            .iter()
            .map(|m| match (m.get(name), padding) {
                (Some(value), _) => Some(value.clone()),
                (None, Padding::Longest(pad)) => Some(pad.clone()),
                (None, Padding::Truncate) => None,
            })
            .collect();
        if let Some(column) = column {
            packed.insert(name.clone(), Record::Sequence(column));
        }
    }
    Ok(packed)
}

/// Split a mapping of sequences into a list of mappings.
///
/// The row count is the shortest sequence field under
/// [`Padding::Truncate`] and the longest under [`Padding::Longest`].
/// Non-sequence fields are repeated in every row. A mapping with no
/// sequence fields has no rows. Every row keeps the input's type name.
pub fn pack(mapping: &Mapping, padding: &Padding) -> Vec<Record> {
    let lengths = mapping.iter().filter_map(|(_, v)| match v {
        Record::Sequence(items) => Some(items.len()),
        _ => None,
    });
    let rows = match padding {
        Padding::Truncate => lengths.min(),
        Padding::Longest(_) => lengths.max(),
    };
    let Some(rows) = rows else {
        return Vec::new();
    };

    (0..rows)
        .map(|i| {
            let mut row = Mapping::new();
            row.set_type_name(mapping.type_name().map(str::to_owned));
            for (name, value) in mapping {
                let cell = match (value, padding) {
                    (Record::Sequence(items), Padding::Longest(pad)) => {
                        items.get(i).unwrap_or(pad).clone()
                    }
                    (Record::Sequence(items), Padding::Truncate) => items[i].clone(),
                    (other, _) => other.clone(),
                };
                row.insert(name.clone(), cell);
            }
            Record::Mapping(row)
        })
        .collect()
}
