//! Serde support for records and scalars.
//!
//! Records serialize as plain nested data: mappings as maps (field order
//! preserved, type name dropped), sequences as sequences, tensors as nested
//! sequences of floats. Deserializing produces scalars, sequences, and
//! untyped mappings; tensors are never inferred from nested lists.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::record::{Mapping, Record};
use crate::tensor::{TensorNode, TensorView};
use crate::value::Scalar;

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Null => serializer.serialize_unit(),
            Self::Bytes(b) => serializer.serialize_bytes(b),
        }
    }
}

impl Serialize for TensorView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.node() {
            TensorNode::Scalar(v) => serializer.serialize_f64(v),
            TensorNode::Slices(slices) => {
                let mut seq = serializer.serialize_seq(Some(slices.len()))?;
                for slice in slices {
                    seq.serialize_element(&slice)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(s) => s.serialize(serializer),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(m) => m.serialize(serializer),
            Self::Tensor(t) => t.view().serialize(serializer),
        }
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, sequence, or map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Record, E> {
        Ok(Record::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Record, E> {
        Ok(Record::Scalar(Scalar::Int(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Record, E> {
        Ok(Record::Scalar(match i64::try_from(v) {
            Ok(i) => Scalar::Int(i),
            Err(_) => Scalar::Float(v as f64),
        }))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Record, E> {
        Ok(Record::Scalar(Scalar::Float(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Record, E> {
        Ok(Record::Scalar(Scalar::Str(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Record, E> {
        Ok(Record::Scalar(Scalar::Str(v)))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Record, E> {
        Ok(Record::Scalar(Scalar::Bytes(v.to_vec())))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Record, E> {
        Ok(Record::Scalar(Scalar::Bytes(v)))
    }

    fn visit_none<E: de::Error>(self) -> Result<Record, E> {
        Ok(Record::null())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Record, E> {
        Ok(Record::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Record, D::Error> {
        Record::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Record, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Record::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
        let mut mapping = Mapping::new();
        while let Some((key, value)) = map.next_entry::<String, Record>()? {
            mapping.try_insert(key, value).map_err(de::Error::custom)?;
        }
        Ok(Record::Mapping(mapping))
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RecordVisitor)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match deserializer.deserialize_any(RecordVisitor)? {
            Record::Scalar(s) => Ok(s),
            _ => Err(de::Error::custom("expected a scalar leaf")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;
    use smallvec::smallvec;

    #[test]
    fn json_object_order_is_preserved() {
        let r: Record = serde_json::from_str(r#"{"z": 1, "a": [2.5, "s"], "m": null}"#).unwrap();
        let expected: Record = Mapping::new()
            .with("z", 1)
            .with("a", Record::Sequence(vec![2.5.into(), "s".into()]))
            .with("m", Record::null())
            .into();
        assert_eq!(r, expected);
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"z":1,"a":[2.5,"s"],"m":null}"#
        );
    }

    #[test]
    fn tensor_serializes_as_nested_lists() {
        let t = Tensor::new(smallvec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let json = serde_json::to_string(&Record::Tensor(t)).unwrap();
        assert_eq!(json, "[[1.0,2.0],[3.0,4.0]]");
        let scalar = serde_json::to_string(&Record::Tensor(Tensor::scalar(0.5))).unwrap();
        assert_eq!(scalar, "0.5");
    }

    #[test]
    fn duplicate_json_keys_are_rejected() {
        let err = serde_json::from_str::<Record>(r#"{"a": 1, "a": 2}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate field 'a'"));
    }

    #[test]
    fn scalar_rejects_containers() {
        assert!(serde_json::from_str::<Scalar>("[1]").is_err());
        assert_eq!(serde_json::from_str::<Scalar>("7").unwrap(), Scalar::Int(7));
    }
}
