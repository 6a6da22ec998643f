//! Logging facade for the wide events crates.
//!
//! # Setup
//!
//! To enable logging, invoke the [`init`] function with a [`LogConfig`]. The
//! configuration implements `serde` traits, so it can be obtained from
//! configuration files.
//!
//! ```
//! use wide_events_log::{LogConfig, LogFormat};
//!
//! let config = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//!
//! wide_events_log::init(&config);
//! ```
//!
//! # Logging
//!
//! The five logging macros [`error!`], [`warn!`], [`info!`], [`debug!`] and
//! [`trace!`] are re-exported from `tracing`. Log messages should start
//! lowercase and end without punctuation. Choose the log level according to
//! these rules:
//!
//! - [`error!`] for bugs and invalid behavior.
//! - [`warn!`] for undesirable behavior.
//! - [`info!`] for messages relevant to the average user.
//! - [`debug!`] for messages usually relevant to debugging.
//! - [`trace!`] for full auxiliary information.
//!
//! # Testing
//!
//! For unit tests there is a separate initialization macro [`init_test!`]
//! that should be called at the beginning of the test method. It logs to the
//! output capture registered by the Rust test runner.
//!
//! ```
//! # fn doc() {
//! wide_events_log::init_test!();
//! # }
//! ```

#![warn(missing_docs)]

mod setup;
pub use setup::*;

pub use test::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{debug, error, info, trace, warn};
