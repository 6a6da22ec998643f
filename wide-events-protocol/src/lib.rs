//! Event record, value primitives and the per-request accumulator for wide events.
//!
//! A *wide event* is a single dense record per request: identity, request and
//! response attributes, business context and the final outcome, all collected
//! into one flat structure that is queried post-hoc instead of aggregated up
//! front.
//!
//! # Components
//!
//! - [`Value`]: a JSON-compatible value used for all event fields.
//! - [`WideEvent`]: the immutable, finalized record handed to the sampler and
//!   the sink.
//! - [`EventBuilder`]: the mutable per-request accumulator. One instance is
//!   created at request start, enriched throughout the request lifecycle and
//!   finalized exactly once.
//! - [`UserContext`] and [`ErrorContext`]: capability traits through which
//!   heterogeneous user and error representations are probed. A capability
//!   that is not implemented yields an absent field, never a failure.
//!
//! # Example
//!
//! ```
//! use wide_events_protocol::{EventBuilder, RequestInfo, ServiceContext};
//!
//! let service = ServiceContext::default();
//! let mut builder = EventBuilder::new(&service);
//! builder
//!     .add_request_info(&RequestInfo::new("GET", "/checkout"))
//!     .add_metadata("cart_items", 3i64)
//!     .add_response_info(200, 42);
//!
//! let event = builder.finish();
//! assert_eq!(event.status_code(), Some(200));
//! ```

#![warn(missing_docs)]

mod builder;
mod event;
mod traits;
mod value;

pub use self::builder::*;
pub use self::event::*;
pub use self::traits::*;
pub use self::value::*;
