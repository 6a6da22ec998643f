use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Object, Value};

/// The final classification of a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The request completed normally.
    Success,
    /// The request failed or returned an error status.
    Error,
}

impl Outcome {
    /// Returns the string representation stored in the event record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }

    pub(crate) fn from_str(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Outcome::Success),
            "error" => Some(Outcome::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A finalized wide event.
///
/// This is an immutable snapshot of the accumulator state, taken at the two
/// handoff points of the request lifecycle: the sampling decision and the
/// sink. Consumers never alias the live mutable builder.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WideEvent {
    fields: Object,
}

impl WideEvent {
    pub(crate) fn from_fields(fields: Object) -> Self {
        Self { fields }
    }

    /// Returns the value of a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns an iterator over all fields in the record.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the request identifier, if present.
    pub fn request_id(&self) -> Option<&str> {
        self.get("request_id")?.as_str()
    }

    /// Returns the request path, if present.
    pub fn path(&self) -> Option<&str> {
        self.get("path")?.as_str()
    }

    /// Returns the response status code, if the record was finalized.
    pub fn status_code(&self) -> Option<u16> {
        u16::try_from(self.get("status_code")?.as_u64()?).ok()
    }

    /// Returns the total request duration in milliseconds, if finalized.
    pub fn duration_ms(&self) -> Option<u64> {
        self.get("duration_ms")?.as_u64()
    }

    /// Returns the resolved outcome of the request.
    pub fn outcome(&self) -> Option<Outcome> {
        Outcome::from_str(self.get("outcome")?.as_str()?)
    }

    /// Returns `true` if error context was captured for this request.
    pub fn has_error(&self) -> bool {
        self.get("error").is_some()
    }

    /// Returns the `user.id` sub-field, if user context was captured.
    pub fn user_id(&self) -> Option<&Value> {
        self.get("user")?.as_object()?.get("id")
    }

    /// Serializes the record into a single JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<WideEvent> for serde_json::Value {
    fn from(event: WideEvent) -> serde_json::Value {
        Value::Object(event.fields).into()
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn event(fields: Vec<(&str, Value)>) -> WideEvent {
        WideEvent::from_fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        )
    }

    #[test]
    fn test_typed_accessors() {
        let event = event(vec![
            ("path", Value::from("/admin/users")),
            ("status_code", Value::U64(503)),
            ("duration_ms", Value::U64(120)),
            ("outcome", Value::from("error")),
        ]);

        assert_eq!(event.path(), Some("/admin/users"));
        assert_eq!(event.status_code(), Some(503));
        assert_eq!(event.duration_ms(), Some(120));
        assert_eq!(event.outcome(), Some(Outcome::Error));
        assert!(!event.has_error());
    }

    #[test]
    fn test_user_id_reads_nested_object() {
        let mut user = Object::new();
        user.insert("id".to_owned(), Value::U64(42));

        let event = event(vec![("user", Value::Object(user))]);
        assert_eq!(event.user_id(), Some(&Value::U64(42)));

        let event = self::event(vec![]);
        assert_eq!(event.user_id(), None);
    }

    #[test]
    fn test_to_json_is_flat() {
        let event = event(vec![
            ("method", Value::from("GET")),
            ("status_code", Value::U64(200)),
        ]);

        assert_eq!(
            event.to_json().unwrap(),
            r#"{"method":"GET","status_code":200}"#
        );
    }
}
