//! Core rate limiter implementation.

use std::sync::Arc;

use tracing::{trace, warn};

use super::backend::WindowStore;
use super::local::LocalWindowStore;
use super::policy::{RateLimitDecision, RateLimitPolicy};

/// The admission check for one policy.
///
/// A limiter runs every check against the shared store first so that all
/// instances sharing that store enforce one combined ceiling. If the shared
/// store errors, the same logical check is rerun against an in-process
/// fallback for that single call: a store outage degrades limiting precision,
/// it never turns into a failed request. While degraded, each instance
/// enforces the ceiling on its own, so the effective limit grows with the
/// instance count until the shared store recovers.
pub struct RateLimiter {
    policy: RateLimitPolicy,
    shared: Arc<dyn WindowStore>,
    fallback: LocalWindowStore,
}

impl RateLimiter {
    /// Create a limiter for `policy` over the given shared store.
    pub fn new(policy: RateLimitPolicy, shared: Arc<dyn WindowStore>) -> Self {
        Self {
            policy,
            shared,
            fallback: LocalWindowStore::new(),
        }
    }

    /// The policy this limiter enforces.
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Decide admission for `identifier`.
    ///
    /// The identifier is treated as an opaque key; callers resolve it with
    /// [`crate::http::resolve_identifier`] or supply their own. Never fails:
    /// shared-store errors are logged and absorbed by the local fallback.
    pub async fn check_limit(&self, identifier: &str) -> RateLimitDecision {
        trace!(identifier = %identifier, "Checking rate limit");

        match self.shared.check(identifier, &self.policy).await {
            Ok(decision) => decision,
            Err(error) => {
                warn!(
                    identifier = %identifier,
                    error = %error,
                    "Shared store check failed, falling back to local window"
                );
                self.fallback.check(identifier, &self.policy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;

    use crate::error::{FloodgateError, Result};
    use crate::ratelimit::policy::DEFAULT_DENIAL_MESSAGE;

    use super::*;

    /// Store that admits everything and counts how often it was asked.
    struct CountingStore {
        calls: AtomicU32,
    }

    #[async_trait]
    impl WindowStore for CountingStore {
        async fn check(&self, _key: &str, policy: &RateLimitPolicy) -> Result<RateLimitDecision> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RateLimitDecision::admitted(policy, policy.max_requests - 1, 0))
        }
    }

    /// Store that always reports an outage.
    struct UnreachableStore;

    #[async_trait]
    impl WindowStore for UnreachableStore {
        async fn check(&self, _key: &str, _policy: &RateLimitPolicy) -> Result<RateLimitDecision> {
            Err(FloodgateError::Unavailable("connection refused".into()))
        }
    }

    /// Store that behaves like a healthy window store until switched off.
    struct TogglingStore {
        healthy: AtomicBool,
        inner: LocalWindowStore,
    }

    impl TogglingStore {
        fn new() -> Self {
            Self {
                healthy: AtomicBool::new(true),
                inner: LocalWindowStore::new(),
            }
        }
    }

    #[async_trait]
    impl WindowStore for TogglingStore {
        async fn check(&self, key: &str, policy: &RateLimitPolicy) -> Result<RateLimitDecision> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(self.inner.check(key, policy))
            } else {
                Err(FloodgateError::Unavailable("timed out".into()))
            }
        }
    }

    #[tokio::test]
    async fn test_healthy_store_serves_the_decision() {
        let store = Arc::new(CountingStore {
            calls: AtomicU32::new(0),
        });
        let limiter = RateLimiter::new(RateLimitPolicy::new(10, 60_000), store.clone());

        let decision = limiter.check_limit("client").await;

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 9);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            limiter.fallback.tracked_identifiers(),
            0,
            "fallback must stay untouched while the shared store is healthy"
        );
    }

    #[tokio::test]
    async fn test_store_outage_never_surfaces_as_an_error() {
        let limiter = RateLimiter::new(RateLimitPolicy::new(3, 60_000), Arc::new(UnreachableStore));

        let decision = limiter.check_limit("client").await;

        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
        assert_eq!(limiter.fallback.tracked_identifiers(), 1);
    }

    #[tokio::test]
    async fn test_concrete_denial_scenario_on_fallback_path() {
        // Policy 5 per 60s for one address; the shared store is down for the
        // whole sequence.
        let limiter = RateLimiter::new(RateLimitPolicy::new(5, 60_000), Arc::new(UnreachableStore));

        for expected_remaining in (0..5).rev() {
            let decision = limiter.check_limit("203.0.113.7").await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
            assert_eq!(decision.limit, 5);
        }

        let decision = limiter.check_limit("203.0.113.7").await;
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.message.as_deref(), Some(DEFAULT_DENIAL_MESSAGE));
    }

    #[tokio::test]
    async fn test_mid_sequence_outage_switches_to_fallback() {
        let store = Arc::new(TogglingStore::new());
        let limiter = RateLimiter::new(RateLimitPolicy::new(3, 60_000), store.clone());

        // Two checks land on the shared store.
        assert!(limiter.check_limit("client").await.allowed);
        assert!(limiter.check_limit("client").await.allowed);
        assert_eq!(store.inner.tracked_identifiers(), 1);

        // The store goes away; the very next call is served locally and the
        // local window still enforces the ceiling for this process.
        store.healthy.store(false, Ordering::SeqCst);

        assert!(limiter.check_limit("client").await.allowed);
        assert!(limiter.check_limit("client").await.allowed);
        assert!(limiter.check_limit("client").await.allowed);
        let decision = limiter.check_limit("client").await;
        assert!(!decision.allowed, "fourth local call must exceed the ceiling");
    }

    #[tokio::test]
    async fn test_identifiers_do_not_interfere_across_fallback() {
        let limiter = RateLimiter::new(RateLimitPolicy::new(1, 60_000), Arc::new(UnreachableStore));

        assert!(limiter.check_limit("a").await.allowed);
        assert!(!limiter.check_limit("a").await.allowed);
        assert!(limiter.check_limit("b").await.allowed);
    }
}
