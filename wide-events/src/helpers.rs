use std::time::Instant;

use wide_events_protocol::EventBuilder;

/// Measures the wall-clock duration of an operation and records it.
///
/// The elapsed milliseconds are stored under `key` via
/// [`EventBuilder::add_metadata`], and the closure result is returned.
///
/// ```
/// use wide_events_protocol::{EventBuilder, ServiceContext};
///
/// let mut builder = EventBuilder::new(&ServiceContext::default());
/// let total = wide_events::measure(&mut builder, "pricing_ms", || 19 + 23);
/// assert_eq!(total, 42);
/// assert!(builder.snapshot().get("pricing_ms").is_some());
/// ```
pub fn measure<T, F>(builder: &mut EventBuilder, key: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    builder.add_metadata(key, elapsed_ms(start));
    result
}

/// Measures the wall-clock duration of a fallible operation and records it.
///
/// The duration is recorded before the result is returned, so a failed
/// operation still carries its timing; the error is then propagated
/// unchanged.
pub fn try_measure<T, E, F>(builder: &mut EventBuilder, key: &str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
{
    let start = Instant::now();
    let result = f();
    builder.add_metadata(key, elapsed_ms(start));
    result
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
