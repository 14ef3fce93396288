//! Scalar leaf values.

use std::fmt;

/// A single leaf value.
///
/// Scalars are the only values a flatten emits. Tensor elements are
/// surfaced as [`Scalar::Float`].
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Signed integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Boolean.
    Bool(bool),
    /// Explicit absence of a value.
    Null,
    /// Opaque binary blob.
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Whether this scalar is a number (`Int` or `Float`).
    ///
    /// Booleans are not numbers here, even though some array libraries
    /// would coerce them.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Numeric value widened to `f64`, or `None` for non-numeric scalars.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The schema type tag for this scalar.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Null => "null",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_numeric() {
        assert!(Scalar::Int(3).is_numeric());
        assert!(Scalar::Float(0.5).is_numeric());
        assert!(!Scalar::Bool(true).is_numeric());
        assert!(!Scalar::Null.is_numeric());
        assert!(!Scalar::from("3").is_numeric());
        assert!(!Scalar::Bytes(vec![1, 2]).is_numeric());
    }

    #[test]
    fn as_f64_widens_integers() {
        assert_eq!(Scalar::Int(-4).as_f64(), Some(-4.0));
        assert_eq!(Scalar::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(Scalar::Str("x".into()).as_f64(), None);
    }

    #[test]
    fn option_none_is_null() {
        let none: Option<i64> = None;
        assert_eq!(Scalar::from(none), Scalar::Null);
        assert_eq!(Scalar::from(Some(7i64)), Scalar::Int(7));
    }

    #[test]
    fn type_tags() {
        assert_eq!(Scalar::Int(1).type_tag(), "integer");
        assert_eq!(Scalar::Float(1.0).type_tag(), "number");
        assert_eq!(Scalar::Bytes(vec![]).type_tag(), "bytes");
    }
}
