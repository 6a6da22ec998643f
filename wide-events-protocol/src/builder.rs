use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ErrorContext, Object, UserContext, Value, WideEvent};

/// Maximum number of backtrace frames captured into an event.
const MAX_BACKTRACE_FRAMES: usize = 5;

/// Identity of the service emitting wide events.
///
/// These fields are attached to every record at creation time and do not
/// participate in sampling decisions. Absent optional fields are omitted from
/// the record rather than stored as null.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceContext {
    /// The name of the service.
    pub service_name: String,
    /// The version of the service.
    pub service_version: String,
    /// The identifier of the running deployment, if known.
    pub deployment_id: Option<String>,
    /// The region the service runs in, if known.
    pub region: Option<String>,
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self {
            service_name: "unknown".to_owned(),
            service_version: "unknown".to_owned(),
            deployment_id: None,
            region: None,
        }
    }
}

/// Request attributes captured at the start of the lifecycle.
///
/// Optional fields that are empty or blank are stored as absent in the event
/// record, keeping it dense but not noisy.
#[derive(Clone, Debug, Default)]
pub struct RequestInfo {
    /// An externally supplied request identifier.
    ///
    /// When absent, the accumulator generates a fresh random v4 UUID.
    pub request_id: Option<String>,
    /// The HTTP method.
    pub method: String,
    /// The request path.
    pub path: String,
    /// The raw query string.
    pub query_string: Option<String>,
    /// The remote address of the client.
    pub ip: Option<String>,
    /// The user agent reported by the client.
    pub user_agent: Option<String>,
    /// The referer reported by the client.
    pub referer: Option<String>,
}

impl RequestInfo {
    /// Creates request information with the required fields.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// The mutable per-request accumulator for one [`WideEvent`].
///
/// One builder is created per request, enriched by the lifecycle coordinator
/// and by business logic, finalized exactly once and never reused. All
/// enrichment operations are total: missing optional input yields absent
/// fields, never a failure. Methods return the builder to permit chaining.
#[derive(Debug)]
pub struct EventBuilder {
    created: DateTime<Utc>,
    fields: Object,
}

impl EventBuilder {
    /// Creates an accumulator stamped with the current time.
    pub fn new(service: &ServiceContext) -> Self {
        Self::with_timestamp(service, Utc::now())
    }

    /// Creates an accumulator stamped with an explicit creation time.
    pub fn with_timestamp(service: &ServiceContext, now: DateTime<Utc>) -> Self {
        let mut fields = Object::new();
        fields.insert("timestamp".to_owned(), Value::Timestamp(now));
        fields.insert(
            "service".to_owned(),
            Value::from(service.service_name.as_str()),
        );
        fields.insert(
            "version".to_owned(),
            Value::from(service.service_version.as_str()),
        );
        if let Some(deployment_id) = non_blank(&service.deployment_id) {
            fields.insert("deployment_id".to_owned(), Value::from(deployment_id));
        }
        if let Some(region) = non_blank(&service.region) {
            fields.insert("region".to_owned(), Value::from(region));
        }

        Self {
            created: now,
            fields,
        }
    }

    /// Adds request attributes to the event.
    ///
    /// Generates a random request identifier if none was supplied.
    pub fn add_request_info(&mut self, request: &RequestInfo) -> &mut Self {
        let request_id = match non_blank(&request.request_id) {
            Some(id) => id.to_owned(),
            None => Uuid::new_v4().to_string(),
        };

        self.set("request_id", Value::String(request_id));
        self.set("method", Value::from(request.method.as_str()));
        self.set("path", Value::from(request.path.as_str()));
        if let Some(query_string) = non_blank(&request.query_string) {
            self.set("query_string", Value::from(query_string));
        }
        if let Some(ip) = non_blank(&request.ip) {
            self.set("ip", Value::from(ip));
        }
        if let Some(user_agent) = non_blank(&request.user_agent) {
            self.set("user_agent", Value::from(user_agent));
        }
        if let Some(referer) = non_blank(&request.referer) {
            self.set("referer", Value::from(referer));
        }
        self
    }

    /// Adds user identity to the event by probing each capability.
    ///
    /// A `None` user leaves the accumulator unchanged. Capabilities the
    /// identity object does not expose are stored as absent sub-fields.
    pub fn add_user_context(&mut self, user: Option<&dyn UserContext>) -> &mut Self {
        let Some(user) = user else {
            return self;
        };

        let mut object = Object::new();
        if let Some(id) = user.id() {
            object.insert("id".to_owned(), id);
        }
        if let Some(email) = user.email() {
            object.insert("email".to_owned(), Value::String(email));
        }
        if let Some(subscription) = user.subscription() {
            object.insert("subscription".to_owned(), Value::String(subscription));
        }
        if let Some(created_at) = user.created_at() {
            let age_days = (self.created - created_at).num_days();
            object.insert("account_age_days".to_owned(), Value::I64(age_days));
        }
        if let Some(ltv) = user.lifetime_value_cents() {
            object.insert("lifetime_value_cents".to_owned(), Value::I64(ltv));
        }

        self.set("user", Value::Object(object));
        self
    }

    /// Shallow-merges business context into the event.
    ///
    /// Existing keys are silently overwritten, last write wins.
    pub fn add_business_context<I, K, V>(&mut self, context: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in context {
            self.set(key, value.into());
        }
        self
    }

    /// Captures an application error and forces the outcome to `error`.
    ///
    /// At most the first five backtrace frames are retained.
    pub fn add_error(&mut self, error: &dyn ErrorContext) -> &mut Self {
        let mut object = Object::new();
        object.insert("type".to_owned(), Value::from(error.kind()));
        object.insert("message".to_owned(), Value::String(error.message()));
        if let Some(code) = error.code() {
            object.insert("code".to_owned(), Value::String(code));
        }
        object.insert("retriable".to_owned(), Value::Bool(error.retriable()));

        let mut backtrace = error.backtrace();
        if !backtrace.is_empty() {
            backtrace.truncate(MAX_BACKTRACE_FRAMES);
            object.insert("backtrace".to_owned(), Value::from(backtrace));
        }

        self.set("error", Value::Object(object));
        self.set("outcome", Value::from("error"));
        self
    }

    /// Adds the response status and total duration at finalize time.
    ///
    /// Derives the outcome from the status code only if no earlier enrichment
    /// has set it, so an error captured through [`add_error`](Self::add_error)
    /// is never reclassified.
    pub fn add_response_info(&mut self, status_code: u16, duration_ms: u64) -> &mut Self {
        self.set("status_code", Value::from(status_code));
        self.set("duration_ms", Value::U64(duration_ms));
        if !self.fields.contains_key("outcome") {
            let outcome = if status_code >= 400 { "error" } else { "success" };
            self.set("outcome", Value::from(outcome));
        }
        self
    }

    /// Sets a single ad-hoc metadata field.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.set(key, value.into());
        self
    }

    /// Returns an immutable copy of the current record state.
    pub fn snapshot(&self) -> WideEvent {
        WideEvent::from_fields(self.fields.clone())
    }

    /// Consumes the accumulator and returns the finalized record.
    pub fn finish(self) -> WideEvent {
        WideEvent::from_fields(self.fields)
    }

    fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        // The creation timestamp is written once and immutable thereafter.
        if key == "timestamp" && self.fields.contains_key("timestamp") {
            return;
        }
        self.fields.insert(key, value);
    }
}

/// A cloneable accumulator handle for requests that fan out to sub-tasks.
///
/// The plain [`EventBuilder`] is owned by the single logical processing flow
/// of a request. When processing fans out to concurrent sub-tasks that enrich
/// the same record, this handle serializes their writes behind one lock per
/// accumulator.
#[derive(Clone, Debug)]
pub struct SharedEventBuilder {
    inner: Arc<Mutex<EventBuilder>>,
}

impl SharedEventBuilder {
    /// Wraps an accumulator into a shared handle.
    pub fn new(builder: EventBuilder) -> Self {
        Self {
            inner: Arc::new(Mutex::new(builder)),
        }
    }

    /// Locks the underlying accumulator for a sequence of enrichments.
    pub fn lock(&self) -> MutexGuard<'_, EventBuilder> {
        self.inner.lock()
    }

    /// Shallow-merges business context into the event.
    pub fn add_business_context<I, K, V>(&self, context: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.inner.lock().add_business_context(context);
        self
    }

    /// Sets a single ad-hoc metadata field.
    pub fn add_metadata(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.inner.lock().add_metadata(key, value);
        self
    }

    /// Returns an immutable copy of the current record state.
    pub fn snapshot(&self) -> WideEvent {
        self.inner.lock().snapshot()
    }
}
