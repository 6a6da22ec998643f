use std::io::Write;

use parking_lot::Mutex;

use wide_events_protocol::WideEvent;

/// A destination for retained wide events.
///
/// Writes are fire and forget: the lifecycle coordinator does not retry,
/// backpressure or propagate sink failures, and an implementation must never
/// panic the calling request.
pub trait Sink: Send + Sync {
    /// Durably hands off one finalized event.
    fn write(&self, event: &WideEvent);
}

/// A sink that emits each retained event as a JSON line through the log
/// facade at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn write(&self, event: &WideEvent) {
        match event.to_json() {
            Ok(json) => wide_events_log::info!(target: "wide_events", "{json}"),
            Err(error) => {
                wide_events_log::error!(target: "wide_events", "failed to serialize event: {error}")
            }
        }
    }
}

/// A sink that writes each retained event as a JSON line to stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write(&self, event: &WideEvent) {
        let Ok(json) = event.to_json() else {
            return;
        };

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}").ok();
    }
}

/// An in-memory sink that collects retained events.
///
/// Intended for tests and for hosts that drain retained events themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<WideEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of retained events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if no event was retained.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Removes and returns all retained events.
    pub fn drain(&self) -> Vec<WideEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl Sink for MemorySink {
    fn write(&self, event: &WideEvent) {
        self.events.lock().push(event.clone());
    }
}

impl<S: Sink> Sink for std::sync::Arc<S> {
    fn write(&self, event: &WideEvent) {
        (**self).write(event);
    }
}
