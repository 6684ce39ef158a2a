//! Window store trait for abstracting shared and local implementations.

use async_trait::async_trait;

use crate::error::Result;

use super::policy::{RateLimitDecision, RateLimitPolicy};

/// Trait for window store implementations.
///
/// A window store answers one question: given a policy and an opaque key, how
/// many timestamped events fall inside the trailing window, and is one more
/// admissible? This abstracts over the Redis-backed [`RedisWindowStore`] and
/// the in-process [`LocalWindowStore`] so the limiter can run the same check
/// against either, and so tests can inject a store that fails on demand.
///
/// [`RedisWindowStore`]: super::shared::RedisWindowStore
/// [`LocalWindowStore`]: super::local::LocalWindowStore
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Record an attempt for `key` and decide admission under `policy`.
    ///
    /// Implementations mutate their state on every call, admitted or not; a
    /// denied call still counts as an attempt.
    async fn check(&self, key: &str, policy: &RateLimitPolicy) -> Result<RateLimitDecision>;
}
