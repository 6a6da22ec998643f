use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::GlobPatterns;

/// The tail sampling policy.
///
/// Constructed once at process start and treated as immutable while requests
/// are in flight; runtime reconfiguration replaces the whole value atomically
/// instead of mutating fields in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplingConfig {
    /// Global kill switch. When `false`, nothing is ever retained.
    pub enabled: bool,

    /// Background retention probability in `[0, 1]`.
    ///
    /// Applied to events matched by no deterministic rule.
    pub sample_rate: f64,

    /// Always retain events classified as errors.
    pub always_sample_errors: bool,

    /// Always retain requests slower than [`slow_threshold_ms`](Self::slow_threshold_ms).
    pub always_sample_slow_requests: bool,

    /// Duration threshold in milliseconds above which a request is slow.
    pub slow_threshold_ms: u64,

    /// User ids that are always retained, compared against `user.id`.
    ///
    /// Ids are configured as strings; numeric event values are coerced for
    /// comparison.
    pub always_sample_user_ids: BTreeSet<String>,

    /// Path patterns that are always retained, matched against `path`.
    pub always_sample_path_patterns: GlobPatterns,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 0.05,
            always_sample_errors: true,
            always_sample_slow_requests: true,
            slow_threshold_ms: 2000,
            always_sample_user_ids: BTreeSet::new(),
            always_sample_path_patterns: GlobPatterns::default(),
        }
    }
}

impl SamplingConfig {
    /// Validates the policy.
    pub fn validate(&self) -> Result<(), SamplingConfigError> {
        if !self.sample_rate.is_finite() || !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(SamplingConfigError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }
}

/// An error returned for invalid sampling policies.
#[derive(Debug, thiserror::Error)]
pub enum SamplingConfigError {
    /// The configured sample rate is outside of `[0, 1]`.
    #[error("sample rate must be within [0, 1], got {0}")]
    InvalidSampleRate(f64),
}
