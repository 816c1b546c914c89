//! Serde integration and document loading
//!
//! Serialization forces deferred values. Deserialization canonicalizes
//! everything it reads, so level contents loaded from JSON or YAML are
//! indistinguishable from contents built in code.

use crate::mapping::{Mapping, Sequence};
use crate::value::{NodeKind, Scalar, Value};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::String(s) => serializer.serialize_str(s),
        }
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for v in self {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(s) => s.serialize(serializer),
            Self::Mapping(m) => m.serialize(serializer),
            Self::Sequence(s) => s.serialize(serializer),
            Self::Deferred(d) => d.force().serialize(serializer),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an attribute value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map_or_else(|_| Value::from(v as f64), Value::from))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut seq = Sequence::new();
        while let Some(item) = access.next_element::<Value>()? {
            seq.push(item);
        }
        Ok(Value::Sequence(seq))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
            map.insert(k, v);
        }
        Ok(Value::Mapping(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Mapping(m) => Ok(m),
            other => Err(de::Error::custom(format!(
                "expected a mapping, found {}",
                other.kind()
            ))),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::null(),
            JsonValue::Bool(b) => Value::from(b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::from)
                .or_else(|| n.as_f64().map(Value::from))
                .unwrap_or_default(),
            JsonValue::String(s) => Value::from(s),
            JsonValue::Array(items) => Value::Sequence(items.into_iter().collect()),
            JsonValue::Object(map) => Value::Mapping(map.into_iter().collect()),
        }
    }
}

impl Value {
    /// Convert to a JSON tree, forcing deferred values
    ///
    /// Non-finite floats have no JSON form and become `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Leaf(Scalar::Null) => JsonValue::Null,
            Self::Leaf(Scalar::Bool(b)) => JsonValue::Bool(*b),
            Self::Leaf(Scalar::Integer(i)) => JsonValue::from(*i),
            Self::Leaf(Scalar::Float(x)) => serde_json::Number::from_f64(*x)
                .map_or(JsonValue::Null, JsonValue::Number),
            Self::Leaf(Scalar::String(s)) => JsonValue::String(s.clone()),
            Self::Mapping(m) => JsonValue::Object(
                m.iter().map(|(k, v)| (k.to_owned(), v.to_json())).collect(),
            ),
            Self::Sequence(s) => JsonValue::Array(s.iter().map(Value::to_json).collect()),
            Self::Deferred(d) => d.force().to_json(),
        }
    }
}

impl Mapping {
    /// Parse a JSON document whose root is an object
    ///
    /// # Errors
    /// Returns error if the JSON is invalid or its root is not an object
    pub fn from_json_str(json: &str) -> Result<Self, ValueError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_document(value)
    }

    /// Parse a YAML document whose root is a mapping
    ///
    /// # Errors
    /// Returns error if the YAML is invalid or its root is not a mapping
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ValueError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_document(value)
    }

    fn from_document(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Mapping(m) => Ok(m),
            other => Err(ValueError::NotAMapping(other.kind())),
        }
    }
}

/// Errors loading values from documents
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// Malformed JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Malformed YAML
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Document root is not a mapping
    #[error("document root must be a mapping, found {0}")]
    NotAMapping(NodeKind),
}
