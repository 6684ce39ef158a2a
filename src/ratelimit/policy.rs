//! Rate limit policy and decision value objects.

/// Denial text used when a policy does not carry its own message.
pub const DEFAULT_DENIAL_MESSAGE: &str = "Too many requests";

/// An immutable admission policy: how many requests are allowed within a
/// trailing time window.
///
/// Policies are built once at startup from configuration and never change
/// afterwards. Validation (`max_requests > 0`, `window_ms > 0`) happens in
/// [`crate::config::LimiterConfig`], not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum requests admitted per window
    pub max_requests: u32,
    /// Trailing window length in milliseconds
    pub window_ms: i64,
    /// User-facing denial text; a generic message is used when absent
    pub message: Option<String>,
}

impl RateLimitPolicy {
    /// Create a policy with the default denial message.
    pub fn new(max_requests: u32, window_ms: i64) -> Self {
        Self {
            max_requests,
            window_ms,
            message: None,
        }
    }

    /// Create a policy with a custom denial message.
    pub fn with_message(max_requests: u32, window_ms: i64, message: impl Into<String>) -> Self {
        Self {
            max_requests,
            window_ms,
            message: Some(message.into()),
        }
    }

    /// Window length in whole seconds, rounded up.
    ///
    /// Used for key expiration on the shared store, which only accepts
    /// second granularity.
    pub fn window_secs(&self) -> i64 {
        (self.window_ms + 999) / 1000
    }

    /// The denial text for this policy.
    pub fn denial_message(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_DENIAL_MESSAGE)
    }
}

/// The outcome of a single admission check.
///
/// Decisions are created fresh per call and never mutated. Two invariants
/// hold by construction: `remaining <= limit`, and `remaining == 0` whenever
/// `allowed` is false. `message` is present only on denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// Requests still permitted in the current window for this key
    pub remaining: u32,
    /// The policy's admission ceiling
    pub limit: u32,
    /// Epoch seconds at which the current window opens back up
    pub reset_epoch_seconds: i64,
    /// Denial text, set only when `allowed` is false
    pub message: Option<String>,
}

impl RateLimitDecision {
    /// Build an admission decision.
    pub fn admitted(policy: &RateLimitPolicy, remaining: u32, reset_epoch_seconds: i64) -> Self {
        Self {
            allowed: true,
            remaining: remaining.min(policy.max_requests),
            limit: policy.max_requests,
            reset_epoch_seconds,
            message: None,
        }
    }

    /// Build a denial decision carrying the policy's message.
    pub fn denied(policy: &RateLimitPolicy, reset_epoch_seconds: i64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            limit: policy.max_requests,
            reset_epoch_seconds,
            message: Some(policy.denial_message().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_secs_rounds_up() {
        assert_eq!(RateLimitPolicy::new(5, 60_000).window_secs(), 60);
        assert_eq!(RateLimitPolicy::new(5, 1_500).window_secs(), 2);
        assert_eq!(RateLimitPolicy::new(5, 1).window_secs(), 1);
    }

    #[test]
    fn test_admitted_caps_remaining_at_limit() {
        let policy = RateLimitPolicy::new(10, 60_000);
        let decision = RateLimitDecision::admitted(&policy, 99, 1_000);

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 10);
        assert!(decision.message.is_none());
    }

    #[test]
    fn test_denied_has_zero_remaining_and_message() {
        let policy = RateLimitPolicy::new(10, 60_000);
        let decision = RateLimitDecision::denied(&policy, 1_000);

        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.limit, 10);
        assert_eq!(decision.message.as_deref(), Some(DEFAULT_DENIAL_MESSAGE));
    }

    #[test]
    fn test_denied_uses_policy_message() {
        let policy = RateLimitPolicy::with_message(5, 1_000, "Slow down");
        let decision = RateLimitDecision::denied(&policy, 1_000);

        assert_eq!(decision.message.as_deref(), Some("Slow down"));
    }
}
