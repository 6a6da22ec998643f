use chrono::{DateTime, Utc};

use crate::Value;

/// Capability probing for heterogeneous user representations.
///
/// Applications model authenticated identity in many shapes. Instead of
/// requiring a fixed schema, the accumulator probes each capability
/// independently and stores only the sub-fields the identity object exposes.
/// Every method defaults to `None`, so implementors override only what they
/// can provide; a missing capability is a normal outcome, not an error.
///
/// # Example
///
/// ```
/// use wide_events_protocol::{UserContext, Value};
///
/// struct ApiKeyPrincipal {
///     key_id: u64,
/// }
///
/// impl UserContext for ApiKeyPrincipal {
///     fn id(&self) -> Option<Value> {
///         Some(self.key_id.into())
///     }
/// }
/// ```
pub trait UserContext {
    /// The stable identifier of the user, in its native representation.
    fn id(&self) -> Option<Value> {
        None
    }

    /// The primary email address of the user.
    fn email(&self) -> Option<String> {
        None
    }

    /// The subscription tier or plan name.
    fn subscription(&self) -> Option<String> {
        None
    }

    /// The time the account was created, used to derive the account age.
    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// The lifetime value of the account in cents.
    fn lifetime_value_cents(&self) -> Option<i64> {
        None
    }
}

/// Capability probing for application error values.
///
/// The accumulator captures errors without imposing an error type: any value
/// that can name itself and render a message can be recorded. Code,
/// retriability and backtrace are optional capabilities that default to
/// absent, not retriable and empty.
pub trait ErrorContext {
    /// The error type or class name.
    fn kind(&self) -> &str;

    /// The human readable error message.
    fn message(&self) -> String;

    /// A machine readable error code, if the error has a code concept.
    fn code(&self) -> Option<String> {
        None
    }

    /// Whether the failed operation may be retried.
    fn retriable(&self) -> bool {
        false
    }

    /// An ordered list of stack frame descriptions, outermost first.
    fn backtrace(&self) -> Vec<String> {
        Vec::new()
    }
}
