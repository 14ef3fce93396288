//! Schema interchange document.
//!
//! The plain structural form a [`Schema`] takes on the wire:
//!
//! ```json
//! {"kind": "object", "type": "object", "properties": {"x": {"kind": "scalar", "type": "integer"}}}
//! {"kind": "array", "type": "sequence", "length": 2, "items": {"kind": "scalar", "type": "number"}}
//! {"kind": "scalar", "type": "tensor"}
//! ```
//!
//! Heterogeneous arrays carry `"prefixItems"` (one schema per position)
//! instead of `"items"`; empty arrays carry neither. Property order is
//! load-bearing: unflatten consumes leaves in that order.
//!
//! Documents carry schemas up to [`MAX_DOCUMENT_DEPTH`] levels deep, the
//! same depth the flatten engine accepts by default. Writing a deeper
//! schema fails, and so does reading a document whose JSON nesting could
//! hold one, before any of it is parsed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use plait_core::SchemaError;

use crate::schema::{Items, Schema};

/// Serialized form of a [`Schema`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemaDocument {
    /// Named fields.
    Object {
        /// Object type tag.
        #[serde(rename = "type")]
        type_tag: String,
        /// Field schemas in declaration order.
        properties: IndexMap<String, SchemaDocument>,
    },
    /// Indexed items.
    Array {
        /// Array type tag.
        #[serde(rename = "type")]
        type_tag: String,
        /// Declared number of items.
        length: usize,
        /// Shared item schema.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<SchemaDocument>>,
        /// Per-position item schemas.
        #[serde(
            default,
            rename = "prefixItems",
            skip_serializing_if = "Vec::is_empty"
        )]
        prefix_items: Vec<SchemaDocument>,
    },
    /// A leaf.
    Scalar {
        /// Leaf type tag.
        #[serde(rename = "type")]
        type_tag: String,
    },
}

impl From<Schema> for SchemaDocument {
    fn from(schema: Schema) -> Self {
        match schema {
            Schema::Scalar { type_tag } => Self::Scalar { type_tag },
            Schema::Array {
                type_tag,
                length,
                items,
            } => {
                let (items, prefix_items) = match items {
                    Items::Empty => (None, Vec::new()),
                    Items::Uniform(item) => (Some(Box::new(Self::from(*item))), Vec::new()),
                    Items::PerIndex(items) => (None, items.into_iter().map(Self::from).collect()),
                };
                Self::Array {
                    type_tag,
                    length,
                    items,
                    prefix_items,
                }
            }
            Schema::Object {
                type_tag,
                properties,
            } => Self::Object {
                type_tag,
                properties: properties
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            },
        }
    }
}

impl TryFrom<SchemaDocument> for Schema {
    type Error = SchemaError;

    fn try_from(doc: SchemaDocument) -> Result<Self, Self::Error> {
        match doc {
            SchemaDocument::Scalar { type_tag } => Ok(Self::Scalar { type_tag }),
            SchemaDocument::Array {
                type_tag,
                length,
                items,
                prefix_items,
            } => {
                let items = match (items, prefix_items.is_empty()) {
                    (Some(_), false) => {
                        return Err(document_error(format!(
                            "array '{type_tag}' has both items and prefixItems"
                        )))
                    }
                    (Some(item), true) => Items::Uniform(Box::new(Self::try_from(*item)?)),
                    (None, false) => {
                        if prefix_items.len() != length {
                            return Err(document_error(format!(
                                "array '{type_tag}' declares length {length} but has {} prefixItems",
                                prefix_items.len()
                            )));
                        }
                        Items::PerIndex(
                            prefix_items
                                .into_iter()
                                .map(Self::try_from)
                                .collect::<Result<_, _>>()?,
                        )
                    }
                    (None, true) => {
                        if length != 0 {
                            return Err(document_error(format!(
                                "array '{type_tag}' declares length {length} but has no item schema"
                            )));
                        }
                        Items::Empty
                    }
                };
                Ok(Self::Array {
                    type_tag,
                    length,
                    items,
                })
            }
            SchemaDocument::Object {
                type_tag,
                properties,
            } => Ok(Self::Object {
                type_tag,
                properties: properties
                    .into_iter()
                    .map(|(k, v)| Ok((k, Self::try_from(v)?)))
                    .collect::<Result<_, SchemaError>>()?,
            }),
        }
    }
}

fn document_error(reason: String) -> SchemaError {
    SchemaError::Document { reason }
}

/// Deepest schema a document may carry.
pub const MAX_DOCUMENT_DEPTH: usize = 256;

/// JSON nesting of a document holding a schema `depth` levels deep.
///
/// Objects and `prefixItems` arrays take two JSON levels per schema
/// level, `items` one, and the innermost node one more.
const fn max_json_nesting(depth: usize) -> usize {
    2 * depth + 1
}

impl Schema {
    /// Serialize to the interchange document as compact JSON.
    ///
    /// Fails with [`SchemaError::TooDeep`] beyond [`MAX_DOCUMENT_DEPTH`].
    pub fn to_json(&self) -> Result<String, SchemaError> {
        let doc = self.to_document()?;
        serde_json::to_string(&doc).map_err(|e| document_error(e.to_string()))
    }

    /// Serialize to the interchange document as a JSON value.
    pub fn to_json_value(&self) -> Result<serde_json::Value, SchemaError> {
        let doc = self.to_document()?;
        serde_json::to_value(doc).map_err(|e| document_error(e.to_string()))
    }

    /// Parse an interchange document.
    ///
    /// The JSON nesting is measured first, so an over-deep document is
    /// rejected without recursing into it.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        let nesting = json_nesting(text);
        let limit = max_json_nesting(MAX_DOCUMENT_DEPTH);
        if nesting > limit {
            return Err(document_error(format!(
                "document nests {nesting} levels, limit is {limit}"
            )));
        }

        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let doc = SchemaDocument::deserialize(&mut de)
            .and_then(|doc| de.end().map(|()| doc))
            .map_err(|e| document_error(e.to_string()))?;
        let schema = Self::try_from(doc)?;

        let depth = schema.depth();
        if depth > MAX_DOCUMENT_DEPTH {
            return Err(SchemaError::TooDeep {
                depth,
                limit: MAX_DOCUMENT_DEPTH,
            });
        }
        Ok(schema)
    }

    fn to_document(&self) -> Result<SchemaDocument, SchemaError> {
        let depth = self.depth();
        if depth > MAX_DOCUMENT_DEPTH {
            return Err(SchemaError::TooDeep {
                depth,
                limit: MAX_DOCUMENT_DEPTH,
            });
        }
        Ok(SchemaDocument::from(self.clone()))
    }
}

/// Deepest `{`/`[` nesting in `text`, skipping string contents.
fn json_nesting(text: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}
