use std::fmt;

use rand::distributions::Uniform;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::Serialize;
use uuid::Uuid;

use wide_events_protocol::{Outcome, WideEvent};

use crate::SamplingConfig;

/// The policy rule that decided the fate of an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedRule {
    /// The global kill switch is off.
    Disabled,
    /// The event is classified as an error.
    Error,
    /// The request exceeded the slow threshold.
    SlowRequest,
    /// The user id is in the always-sample set.
    UserId,
    /// The request path matched a configured pattern.
    PathPattern,
    /// The background sample rate retained the event.
    SampleRate,
}

impl MatchedRule {
    /// Returns the rule name used in logs and test assertions.
    pub fn name(&self) -> &'static str {
        match self {
            MatchedRule::Disabled => "disabled",
            MatchedRule::Error => "error",
            MatchedRule::SlowRequest => "slow_request",
            MatchedRule::UserId => "user_id",
            MatchedRule::PathPattern => "path_pattern",
            MatchedRule::SampleRate => "sample_rate",
        }
    }
}

impl fmt::Display for MatchedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// The outcome of evaluating the sampling policy over a finalized event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplingDecision {
    keep: bool,
    rule: Option<MatchedRule>,
}

impl SamplingDecision {
    fn keep(rule: MatchedRule) -> Self {
        Self {
            keep: true,
            rule: Some(rule),
        }
    }

    fn drop(rule: Option<MatchedRule>) -> Self {
        Self { keep: false, rule }
    }

    /// Returns `true` if the event should be retained.
    pub fn should_keep(&self) -> bool {
        self.keep
    }

    /// Returns `true` if the event should be discarded.
    pub fn should_drop(&self) -> bool {
        !self.keep
    }

    /// Returns the rule that decided this event, if any.
    ///
    /// `None` means no deterministic rule matched and the background coin
    /// flip discarded the event.
    pub fn matched_rule(&self) -> Option<MatchedRule> {
        self.rule
    }
}

/// Evaluates the retention policy over a finalized event.
///
/// Rules run as an ordered short-circuit cascade, first match wins. The
/// deterministic rules are never subject to the background coin flip, and the
/// kill switch dominates everything else.
pub fn evaluate(event: &WideEvent, config: &SamplingConfig) -> SamplingDecision {
    if !config.enabled {
        return SamplingDecision::drop(Some(MatchedRule::Disabled));
    }

    if config.always_sample_errors && is_error(event) {
        return SamplingDecision::keep(MatchedRule::Error);
    }

    if config.always_sample_slow_requests && is_slow(event, config) {
        return SamplingDecision::keep(MatchedRule::SlowRequest);
    }

    if matches_user(event, config) {
        return SamplingDecision::keep(MatchedRule::UserId);
    }

    if matches_path(event, config) {
        return SamplingDecision::keep(MatchedRule::PathPattern);
    }

    let roll = sample_roll(event);
    wide_events_log::trace!(
        sample_rate = config.sample_rate,
        roll,
        "applying background sampling to finished event"
    );

    if roll < config.sample_rate {
        SamplingDecision::keep(MatchedRule::SampleRate)
    } else {
        SamplingDecision::drop(None)
    }
}

/// Shorthand for [`evaluate`] when only the boolean matters.
pub fn should_sample(event: &WideEvent, config: &SamplingConfig) -> bool {
    evaluate(event, config).should_keep()
}

/// Classifies an event as an error.
///
/// Any one signal suffices: an error status code, captured error context, or
/// an error outcome. Partially populated records still classify.
fn is_error(event: &WideEvent) -> bool {
    event.status_code().is_some_and(|status| status >= 400)
        || event.has_error()
        || event.outcome() == Some(Outcome::Error)
}

fn is_slow(event: &WideEvent, config: &SamplingConfig) -> bool {
    event
        .duration_ms()
        .is_some_and(|duration| duration > config.slow_threshold_ms)
}

/// Matches `user.id` against the configured set, tolerating type mismatches:
/// a numeric id in the event matches its string form in the configuration.
fn matches_user(event: &WideEvent, config: &SamplingConfig) -> bool {
    if config.always_sample_user_ids.is_empty() {
        return false;
    }

    let Some(user_id) = event.user_id() else {
        return false;
    };

    match String::try_from(user_id) {
        Ok(id) => config.always_sample_user_ids.contains(&id),
        Err(()) => false,
    }
}

fn matches_path(event: &WideEvent, config: &SamplingConfig) -> bool {
    if config.always_sample_path_patterns.is_empty() {
        return false;
    }

    match event.path() {
        Some(path) => config.always_sample_path_patterns.is_match(path),
        None => false,
    }
}

/// Draws the uniform value in `[0, 1)` for the background sample.
///
/// When the event carries a UUID-shaped request id, the generator is seeded
/// from it, which makes the decision reproducible for the same request.
/// Events without a parseable id fall back to the thread RNG.
fn sample_roll(event: &WideEvent) -> f64 {
    let dist = Uniform::new(0f64, 1f64);
    match event.request_id().and_then(|id| Uuid::parse_str(id).ok()) {
        Some(id) => pseudo_random_from_uuid(id),
        None => rand::thread_rng().sample(dist),
    }
}

/// Generates a pseudo random number by seeding the generator with the given id.
///
/// The return is deterministic, always generates the same number from the same id.
fn pseudo_random_from_uuid(id: Uuid) -> f64 {
    let big_seed = id.as_u128();
    let mut generator = Pcg32::new((big_seed >> 64) as u64, big_seed as u64);
    let dist = Uniform::new(0f64, 1f64);
    generator.sample(dist)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use similar_asserts::assert_eq;

    use wide_events_protocol::{
        ErrorContext, EventBuilder, RequestInfo, ServiceContext, UserContext, Value,
    };

    use super::*;

    struct TestUser(Value);

    impl UserContext for TestUser {
        fn id(&self) -> Option<Value> {
            Some(self.0.clone())
        }
    }

    struct TestError;

    impl ErrorContext for TestError {
        fn kind(&self) -> &str {
            "Timeout"
        }

        fn message(&self) -> String {
            "upstream timed out".to_owned()
        }
    }

    fn finished_event(path: &str, status: u16, duration_ms: u64) -> WideEvent {
        let mut builder = EventBuilder::new(&ServiceContext::default());
        builder.add_request_info(&RequestInfo::new("GET", path));
        builder.add_response_info(status, duration_ms);
        builder.finish()
    }

    fn disabled_rules() -> SamplingConfig {
        SamplingConfig {
            always_sample_errors: false,
            always_sample_slow_requests: false,
            ..SamplingConfig::default()
        }
    }

    #[test]
    fn test_kill_switch_dominates_everything() {
        let config = SamplingConfig {
            enabled: false,
            sample_rate: 1.0,
            always_sample_user_ids: ["42".to_owned()].into(),
            always_sample_path_patterns: ["/admin"].into_iter().collect(),
            ..SamplingConfig::default()
        };

        // An event that qualifies for every deterministic rule at once.
        let mut builder = EventBuilder::new(&ServiceContext::default());
        builder.add_request_info(&RequestInfo::new("GET", "/admin/users"));
        builder.add_user_context(Some(&TestUser(Value::U64(42))));
        builder.add_error(&TestError);
        builder.add_response_info(500, 10_000);
        let event = builder.finish();

        let decision = evaluate(&event, &config);
        assert!(decision.should_drop());
        assert_eq!(decision.matched_rule(), Some(MatchedRule::Disabled));
    }

    #[test]
    fn test_errors_kept_at_rate_zero() {
        let config = SamplingConfig {
            sample_rate: 0.0,
            ..SamplingConfig::default()
        };

        for _ in 0..100 {
            let event = finished_event("/checkout", 500, 12);
            let decision = evaluate(&event, &config);
            assert!(decision.should_keep());
            assert_eq!(decision.matched_rule(), Some(MatchedRule::Error));
        }
    }

    #[test]
    fn test_error_classification_is_generous() {
        let config = SamplingConfig {
            sample_rate: 0.0,
            ..SamplingConfig::default()
        };

        // Status code alone.
        assert!(should_sample(&finished_event("/a", 400, 1), &config));

        // Error field alone, even with a success status.
        let mut builder = EventBuilder::new(&ServiceContext::default());
        builder.add_request_info(&RequestInfo::new("POST", "/b"));
        builder.add_error(&TestError);
        builder.add_response_info(200, 1);
        assert!(should_sample(&builder.finish(), &config));

        // Plain fast success is not an error.
        assert!(!should_sample(&finished_event("/c", 200, 1), &config));
    }

    #[test]
    fn test_slow_request_scenario() {
        let config = SamplingConfig {
            sample_rate: 0.0,
            slow_threshold_ms: 2000,
            ..SamplingConfig::default()
        };

        let decision = evaluate(&finished_event("/report", 200, 2500), &config);
        assert!(decision.should_keep());
        assert_eq!(decision.matched_rule(), Some(MatchedRule::SlowRequest));

        // At the threshold is not slow; the comparison is strict.
        assert!(should_sample(&finished_event("/report", 200, 2001), &config));
        assert!(!should_sample(&finished_event("/report", 200, 2000), &config));
    }

    #[test]
    fn test_slow_rule_respects_toggle() {
        let config = SamplingConfig {
            sample_rate: 0.0,
            always_sample_slow_requests: false,
            ..SamplingConfig::default()
        };
        assert!(!should_sample(&finished_event("/report", 200, 10_000), &config));
    }

    #[test]
    fn test_user_id_matching_is_type_tolerant() {
        let config = SamplingConfig {
            sample_rate: 0.0,
            always_sample_user_ids: BTreeSet::from(["42".to_owned()]),
            ..disabled_rules()
        };

        for id in [Value::U64(42), Value::I64(42), Value::from("42")] {
            let mut builder = EventBuilder::new(&ServiceContext::default());
            builder.add_request_info(&RequestInfo::new("GET", "/profile"));
            builder.add_user_context(Some(&TestUser(id.clone())));
            builder.add_response_info(200, 5);

            let decision = evaluate(&builder.finish(), &config);
            assert!(decision.should_keep(), "id {id:?} must match");
            assert_eq!(decision.matched_rule(), Some(MatchedRule::UserId));
        }

        let mut builder = EventBuilder::new(&ServiceContext::default());
        builder.add_request_info(&RequestInfo::new("GET", "/profile"));
        builder.add_user_context(Some(&TestUser(Value::U64(7))));
        builder.add_response_info(200, 5);
        assert!(!should_sample(&builder.finish(), &config));
    }

    #[test]
    fn test_path_pattern_scenario() {
        let config = SamplingConfig {
            sample_rate: 0.0,
            always_sample_path_patterns: ["/admin"].into_iter().collect(),
            ..disabled_rules()
        };

        let decision = evaluate(&finished_event("/admin/users", 200, 5), &config);
        assert!(decision.should_keep());
        assert_eq!(decision.matched_rule(), Some(MatchedRule::PathPattern));

        assert!(!should_sample(&finished_event("/api/users", 200, 5), &config));
    }

    #[test]
    fn test_background_rate_zero_drops_everything_else() {
        let config = SamplingConfig {
            sample_rate: 0.0,
            ..disabled_rules()
        };

        for _ in 0..100 {
            let decision = evaluate(&finished_event("/", 200, 1), &config);
            assert!(decision.should_drop());
            assert_eq!(decision.matched_rule(), None);
        }
    }

    #[test]
    fn test_background_rate_one_keeps_everything_else() {
        let config = SamplingConfig {
            sample_rate: 1.0,
            ..disabled_rules()
        };

        for _ in 0..100 {
            let decision = evaluate(&finished_event("/", 200, 1), &config);
            assert!(decision.should_keep());
            assert_eq!(decision.matched_rule(), Some(MatchedRule::SampleRate));
        }
    }

    #[test]
    fn test_probabilistic_calibration() {
        let config = SamplingConfig {
            sample_rate: 0.05,
            ..disabled_rules()
        };

        let mut kept = 0;
        let trials = 100_000;
        for _ in 0..trials {
            if should_sample(&finished_event("/", 200, 1), &config) {
                kept += 1;
            }
        }

        // Binomial confidence band around 5% of 100k trials.
        assert!(
            (4000..=6000).contains(&kept),
            "kept {kept} of {trials} events at 5%"
        );
    }

    #[test]
    fn test_decision_is_deterministic_per_request_id() {
        let config = SamplingConfig {
            sample_rate: 0.5,
            ..disabled_rules()
        };

        let mut builder = EventBuilder::new(&ServiceContext::default());
        builder.add_request_info(&RequestInfo {
            request_id: Some("4a106cf6-b151-44eb-9131-ae7db1a157a3".to_owned()),
            ..RequestInfo::new("GET", "/")
        });
        builder.add_response_info(200, 1);
        let event = builder.finish();

        let first = evaluate(&event, &config);
        for _ in 0..10 {
            assert_eq!(evaluate(&event, &config), first);
        }
    }

    #[test]
    fn test_repeatable_seed() {
        let id = "4a106cf6-b151-44eb-9131-ae7db1a157a3".parse().unwrap();

        let val1 = pseudo_random_from_uuid(id);
        let val2 = pseudo_random_from_uuid(id);
        assert!(val1 + f64::EPSILON > val2 && val2 + f64::EPSILON > val1);
    }
}
