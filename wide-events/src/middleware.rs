use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;

use wide_events_protocol::{ErrorContext, EventBuilder, RequestInfo, UserContext};
use wide_events_sampling::evaluate;

use crate::{Config, Sink};

/// Response attributes consumed at finalize time.
///
/// Implemented for `u16` so hosts without a response type can return the
/// status code directly.
pub trait ResponseInfo {
    /// The HTTP status code of the response.
    fn status_code(&self) -> u16;
}

impl ResponseInfo for u16 {
    fn status_code(&self) -> u16 {
        *self
    }
}

/// Wires the accumulator and the sampling policy into one request.
///
/// The host framework calls [`handle`](Self::handle) once per request. The
/// coordinator builds the accumulator, exposes it to the request handler for
/// enrichment, finalizes the record on every exit path and applies the tail
/// sampling decision. Concurrent requests read the configuration through an
/// atomically swapped snapshot and never contend on a lock.
#[derive(Debug)]
pub struct RequestLifecycle<S> {
    config: ArcSwap<Config>,
    sink: S,
}

impl<S: Sink> RequestLifecycle<S> {
    /// Creates a lifecycle coordinator with the given configuration and sink.
    pub fn new(config: Config, sink: S) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            sink,
        }
    }

    /// Returns the current configuration snapshot.
    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Returns the sink retained events are handed to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Atomically replaces the configuration.
    ///
    /// Requests already in flight finish under the snapshot they started
    /// with; new requests observe the new value immediately.
    pub fn reconfigure(&self, config: Config) {
        self.config.store(Arc::new(config));
    }

    /// Processes one request.
    ///
    /// The closure receives the live accumulator for business enrichment and
    /// returns the host's response or error.
    ///
    /// On success the record is finalized with the response status and the
    /// measured duration, and retained if the sampling policy says so. On
    /// failure the error is captured into the record, the record is written
    /// to the sink unconditionally, and the original error is returned to the
    /// caller unchanged. Failures are observed, never swallowed or altered.
    pub fn handle<T, E, F>(
        &self,
        request: RequestInfo,
        user: Option<&dyn UserContext>,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&mut EventBuilder) -> Result<T, E>,
        T: ResponseInfo,
        E: ErrorContext,
    {
        let config = self.config.load();
        let start = Instant::now();

        let mut builder = EventBuilder::new(&config.service);
        builder.add_request_info(&request);
        builder.add_user_context(user);

        match f(&mut builder) {
            Ok(response) => {
                builder.add_response_info(response.status_code(), elapsed_ms(start));
                let event = builder.finish();

                let decision = evaluate(&event, &config.sampling);
                wide_events_log::trace!(
                    keep = decision.should_keep(),
                    rule = decision.matched_rule().map(|rule| rule.name()),
                    "tail sampling decision"
                );
                if decision.should_keep() {
                    self.sink.write(&event);
                }

                Ok(response)
            }
            Err(error) => {
                // Error enrichment runs before the response info so that the
                // outcome can never be reclassified by the status code.
                builder.add_error(&error);
                builder.add_response_info(500, elapsed_ms(start));
                let event = builder.finish();

                // Errors are never lost to sampling at the point of failure
                // capture; the sink write bypasses the decision engine.
                self.sink.write(&event);

                Err(error)
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
