//! Tail sampling for wide events.
//!
//! Head samplers decide whether to keep a request record before the request
//! runs, which systematically under-samples the events operators most need:
//! errors and slow requests are only identifiable after completion. This crate
//! instead evaluates a retention policy over the *finished* record.
//!
//! # Components
//!
//! - [`SamplingConfig`]: the process-wide policy. Immutable while requests are
//!   in flight, read by every concurrent request without synchronization.
//! - [`GlobPatterns`]: serializable glob patterns matched against the request
//!   path.
//! - [`evaluate`]: the decision function, a pure function of the finalized
//!   event and the policy plus a source of randomness.
//!
//! # Decision order
//!
//! The policy is evaluated as an ordered short-circuit cascade. The order is a
//! contract, not an optimization: rules are allowed to disagree and the order
//! defines precedence.
//!
//! 1. Kill switch: a disabled policy retains nothing.
//! 2. Errors are always kept when `alwaysSampleErrors` is set.
//! 3. Slow requests are always kept when `alwaysSampleSlowRequests` is set.
//! 4. Configured user ids are always kept.
//! 5. Configured path patterns are always kept.
//! 6. Everything else is subject to the background sample rate.
//!
//! ```
//! use wide_events_sampling::{should_sample, SamplingConfig};
//! use wide_events_protocol::{EventBuilder, RequestInfo, ServiceContext};
//!
//! let config = SamplingConfig {
//!     sample_rate: 0.0,
//!     ..SamplingConfig::default()
//! };
//!
//! let mut builder = EventBuilder::new(&ServiceContext::default());
//! builder.add_request_info(&RequestInfo::new("GET", "/checkout"));
//! builder.add_response_info(500, 12);
//!
//! // Errors are retained regardless of the background rate.
//! assert!(should_sample(&builder.finish(), &config));
//! ```

#![warn(missing_docs)]

mod config;
mod evaluation;
mod glob;

pub use self::config::*;
pub use self::evaluation::*;
pub use self::glob::*;
