//! Tail-sampled wide event telemetry for request processing.
//!
//! For every inbound request this crate accumulates a single dense record of
//! contextual attributes across the full request lifecycle, then decides
//! *after* the request finishes whether to retain or discard it. Head
//! samplers decide before the outcome is known and therefore systematically
//! under-sample the events operators most need; tail sampling keeps every
//! error and every slow request while applying a background rate to the rest.
//!
//! # Architecture
//!
//! - [`EventBuilder`] accumulates attributes incrementally during the
//!   request, including from code that runs after an error was raised.
//! - [`SamplingConfig`] is the retention policy, read lock-free by all
//!   concurrent requests.
//! - [`RequestLifecycle`] wires both into a host framework: it finalizes the
//!   record on every exit path, evaluates the policy and hands retained
//!   records to a [`Sink`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wide_events::{Config, MemorySink, RequestInfo, RequestLifecycle};
//!
//! let mut config = Config::default();
//! config.sampling.sample_rate = 1.0;
//! let lifecycle = RequestLifecycle::new(config, Arc::new(MemorySink::new()));
//!
//! let status: Result<u16, wide_events::BoxedError> =
//!     lifecycle.handle(RequestInfo::new("GET", "/hello"), None, |builder| {
//!         builder.add_metadata("greeting", "hello");
//!         Ok(200)
//!     });
//! assert_eq!(status.unwrap(), 200);
//! ```

#![warn(missing_docs)]

mod config;
mod helpers;
mod middleware;
mod sink;

pub use self::config::*;
pub use self::helpers::*;
pub use self::middleware::*;
pub use self::sink::*;

pub use wide_events_protocol::{
    ErrorContext, EventBuilder, Outcome, RequestInfo, ServiceContext, SharedEventBuilder,
    UserContext, Value, WideEvent,
};
pub use wide_events_sampling::{
    evaluate, should_sample, MatchedRule, SamplingConfig, SamplingDecision,
};

/// A boxed error with the standard [`ErrorContext`] capabilities.
///
/// Convenience error type for hosts that do not define their own error enum.
#[derive(Debug)]
pub struct BoxedError(Box<dyn std::error::Error + Send + Sync>);

impl BoxedError {
    /// Boxes any standard error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }
}

impl std::fmt::Display for BoxedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ErrorContext for BoxedError {
    fn kind(&self) -> &str {
        "BoxedError"
    }

    fn message(&self) -> String {
        self.0.to_string()
    }
}
