//! In-process fallback window store.
//!
//! Used only while the shared store is unreachable. Exact sliding-window
//! semantics are not worth the bookkeeping here; a fixed window that resets
//! wholesale is enough to keep throttling something until the shared store
//! comes back.
//!
//! State lives only in this process. In a horizontally scaled deployment a
//! shared-store outage therefore raises the effective ceiling to
//! `max_requests x instance count`, since every instance enforces the policy
//! independently. That is an accepted degradation, not a bug.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;

use super::backend::WindowStore;
use super::policy::{RateLimitDecision, RateLimitPolicy};

/// Chance per call that a check also sweeps out expired entries.
///
/// Sweeping on a dice roll instead of a timer keeps the fallback free of
/// background tasks while still bounding memory held for identifiers that
/// stopped sending traffic.
const SWEEP_PROBABILITY: f64 = 0.01;

/// One identifier's counter within its current fixed window.
#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at_ms: i64,
}

/// Fixed-window counter store held in process memory.
///
/// Entries are created lazily on first use, reset in place when their window
/// elapses, and dropped by the probabilistic sweep once stale.
pub struct LocalWindowStore {
    entries: DashMap<String, WindowEntry>,
}

impl LocalWindowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Record an attempt and decide admission. Infallible; all state is local.
    pub fn check(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        self.check_at(key, policy, Utc::now().timestamp_millis())
    }

    /// Clock-injected variant of [`check`](Self::check).
    fn check_at(&self, key: &str, policy: &RateLimitPolicy, now_ms: i64) -> RateLimitDecision {
        if rand::random::<f64>() < SWEEP_PROBABILITY {
            self.sweep(now_ms);
        }

        let mut entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| WindowEntry {
                count: 0,
                reset_at_ms: now_ms + policy.window_ms,
            });

        if now_ms >= entry.reset_at_ms {
            entry.count = 0;
            entry.reset_at_ms = now_ms + policy.window_ms;
        }

        // Denied attempts count too, so a throttled client cannot probe for
        // free slots before its window resets.
        entry.count = entry.count.saturating_add(1);

        let reset_epoch_seconds = entry.reset_at_ms / 1000;
        if entry.count > policy.max_requests {
            debug!(
                key = %key,
                count = entry.count,
                limit = policy.max_requests,
                "Rate limit exceeded on local fallback"
            );
            RateLimitDecision::denied(policy, reset_epoch_seconds)
        } else {
            RateLimitDecision::admitted(
                policy,
                policy.max_requests - entry.count,
                reset_epoch_seconds,
            )
        }
    }

    /// Drop entries whose window has already elapsed.
    fn sweep(&self, now_ms: i64) {
        self.entries.retain(|_, entry| entry.reset_at_ms > now_ms);
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_identifiers(&self) -> usize {
        self.entries.len()
    }
}

impl Default for LocalWindowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WindowStore for LocalWindowStore {
    async fn check(&self, key: &str, policy: &RateLimitPolicy) -> Result<RateLimitDecision> {
        Ok(LocalWindowStore::check(self, key, policy))
    }
}
