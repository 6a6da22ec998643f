use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Alias for maps.
pub type Map<K, V> = BTreeMap<K, V>;

/// Alias for objects with string keys.
pub type Object = Map<String, Value>;

/// Represents a field value of a wide event.
///
/// Values are JSON-compatible: timestamps serialize as RFC 3339 strings with
/// millisecond precision, everything else maps onto the corresponding JSON
/// type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean value.
    Bool(bool),
    /// A signed integer value.
    I64(i64),
    /// An unsigned integer value.
    U64(u64),
    /// A floating point value.
    F64(f64),
    /// A string value.
    String(String),
    /// A point in time.
    Timestamp(DateTime<Utc>),
    /// An array of values.
    Array(Vec<Value>),
    /// A mapping of strings to values.
    Object(Object),
}

impl Value {
    /// Returns the string if this value is a string, otherwise `None`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(string) => Some(string.as_str()),
            _ => None,
        }
    }

    /// Returns the boolean if this value is a boolean, otherwise `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a signed integer, if this value can be represented as one.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(value) => Some(value),
            Value::U64(value) => i64::try_from(value).ok(),
            _ => None,
        }
    }

    /// Returns an unsigned integer, if this value can be represented as one.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::I64(value) => u64::try_from(value).ok(),
            Value::U64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns a float, if this value is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::I64(value) => Some(value as f64),
            Value::U64(value) => Some(value as f64),
            Value::F64(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the object if this value is an object, otherwise `None`.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Coerces scalar values into their canonical string form.
///
/// Arrays and objects have no scalar string form and return an error.
impl TryFrom<&Value> for String {
    type Error = ();

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Bool(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Timestamp(v) => v.to_rfc3339_opts(SecondsFormat::Millis, true),
            _ => return Err(()),
        })
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Value::Bool(val) => serializer.serialize_bool(val),
            Value::I64(val) => serializer.serialize_i64(val),
            Value::U64(val) => serializer.serialize_u64(val),
            Value::F64(val) => serializer.serialize_f64(val),
            Value::String(ref val) => serializer.serialize_str(val),
            Value::Timestamp(ref val) => {
                serializer.serialize_str(&val.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Array(ref items) => {
                let mut seq_ser = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq_ser.serialize_element(item)?;
                }
                seq_ser.end()
            }
            Value::Object(ref items) => {
                let mut map_ser = serializer.serialize_map(Some(items.len()))?;
                for (key, value) in items {
                    map_ser.serialize_entry(key, value)?;
                }
                map_ser.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match String::try_from(self) {
            Ok(string) => f.pad(&string),
            Err(()) => match self {
                Value::Array(_) => f.pad("an array"),
                Value::Object(_) => f.pad("an object"),
                _ => unreachable!(),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I64(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::U64(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::Array(value.into_iter().map(Value::String).collect())
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> serde_json::Value {
        match value {
            Value::Bool(value) => serde_json::Value::Bool(value),
            Value::I64(value) => serde_json::Value::from(value),
            Value::U64(value) => serde_json::Value::from(value),
            Value::F64(value) => serde_json::Value::from(value),
            Value::String(value) => serde_json::Value::String(value),
            Value::Timestamp(value) => {
                serde_json::Value::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(items) => serde_json::Value::Object(
                items.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_timestamp_serializes_with_millis() {
        let ts = Utc.with_ymd_and_hms(2024, 12, 4, 12, 10, 32).unwrap();
        let json = serde_json::to_string(&Value::Timestamp(ts)).unwrap();
        assert_eq!(json, "\"2024-12-04T12:10:32.000Z\"");
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(String::try_from(&Value::U64(42)), Ok("42".to_owned()));
        assert_eq!(String::try_from(&Value::Bool(true)), Ok("true".to_owned()));
        assert_eq!(
            String::try_from(&Value::String("user_9".to_owned())),
            Ok("user_9".to_owned())
        );
        assert_eq!(String::try_from(&Value::Array(vec![])), Err(()));
    }

    #[test]
    fn test_numeric_coercions() {
        assert_eq!(Value::I64(-1).as_u64(), None);
        assert_eq!(Value::U64(7).as_i64(), Some(7));
        assert_eq!(Value::U64(7).as_f64(), Some(7.0));
        assert_eq!(Value::String("7".to_owned()).as_i64(), None);
    }

    #[test]
    fn test_nested_json_conversion() {
        let mut user = Object::new();
        user.insert("id".to_owned(), Value::U64(1));
        user.insert("email".to_owned(), Value::from("a@b.c"));

        let json: serde_json::Value = Value::Object(user).into();
        assert_eq!(json, serde_json::json!({"id": 1, "email": "a@b.c"}));
    }
}
