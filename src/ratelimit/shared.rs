//! Redis-backed sliding window store.
//!
//! Each admitted request leaves one member in a sorted set keyed by the
//! identifier and scored by its timestamp in milliseconds. A check trims
//! members that have aged out of the trailing window, counts what is left,
//! and only then records the new event, so the window boundary moves
//! continuously with the clock instead of resetting on bucket edges.
//!
//! The trim/count/add sequence is issued as separate commands, not as one
//! atomic transaction. Concurrent checks for the same key can interleave
//! between the count and the add, admitting slightly more than the ceiling
//! in rare race windows. Deployments that need a hard guarantee would move
//! the sequence into a server-side Lua script; this store accepts the
//! approximation to keep the check a plain pipeline of cheap commands.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use tracing::{debug, trace};

use crate::error::Result;

use super::backend::WindowStore;
use super::policy::{RateLimitDecision, RateLimitPolicy};

/// Prefix for every limiter key in the shared store.
const KEY_PREFIX: &str = "rate_limit";

/// Sliding-window store backed by a shared Redis instance.
///
/// All processes pointing at the same Redis enforce one combined ceiling
/// per key. The key carries a TTL equal to the window length, refreshed on
/// every admission, so abandoned identifiers clean themselves up without a
/// sweep.
pub struct RedisWindowStore {
    client: Arc<redis::Client>,
}

impl RedisWindowStore {
    /// Create a store from an owned client.
    pub fn new(client: redis::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Create a store from a client already shared with other subsystems.
    pub fn from_shared(client: Arc<redis::Client>) -> Self {
        Self { client }
    }

    fn storage_key(key: &str) -> String {
        format!("{}:{}", KEY_PREFIX, key)
    }

    /// Sorted-set member for an event observed at `now_ms`.
    ///
    /// The random suffix keeps two events in the same millisecond distinct;
    /// without it the second ZADD would overwrite the first member and the
    /// count would undershoot.
    fn event_member(now_ms: i64) -> String {
        format!("{}-{}", now_ms, rand::random::<u32>())
    }

    /// Decision arithmetic after the trim and count, free of store I/O.
    ///
    /// `count` is the number of events still inside the window and
    /// `oldest_score` the timestamp of the oldest surviving event, when one
    /// was fetched. On denial the window opens back up when that oldest
    /// event ages out; `None` means the set emptied under a concurrent
    /// trimmer, in which case a full window from `now_ms` is reported.
    fn decide(
        policy: &RateLimitPolicy,
        count: u64,
        oldest_score: Option<i64>,
        now_ms: i64,
    ) -> RateLimitDecision {
        if count >= policy.max_requests as u64 {
            let reset_ms = oldest_score
                .map(|score| score + policy.window_ms)
                .unwrap_or(now_ms + policy.window_ms);
            return RateLimitDecision::denied(policy, reset_ms / 1000);
        }

        let remaining = policy.max_requests.saturating_sub(count as u32 + 1);
        RateLimitDecision::admitted(policy, remaining, (now_ms + policy.window_ms) / 1000)
    }
}

#[async_trait]
impl WindowStore for RedisWindowStore {
    async fn check(&self, key: &str, policy: &RateLimitPolicy) -> Result<RateLimitDecision> {
        let now_ms = Utc::now().timestamp_millis();
        let window_start = now_ms - policy.window_ms;
        let storage_key = Self::storage_key(key);

        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // Expire events that have slid out of the trailing window, then
        // count what is left.
        let _: () = conn.zrembyscore(&storage_key, "-inf", window_start).await?;
        let count: u64 = conn.zcard(&storage_key).await?;

        if count >= policy.max_requests as u64 {
            let oldest: Vec<(String, i64)> = conn.zrange_withscores(&storage_key, 0, 0).await?;
            let oldest_score = oldest.first().map(|(_, score)| *score);

            debug!(
                key = %key,
                count = count,
                limit = policy.max_requests,
                "Rate limit exceeded on shared store"
            );
            return Ok(Self::decide(policy, count, oldest_score, now_ms));
        }

        let _: () = conn
            .zadd(&storage_key, Self::event_member(now_ms), now_ms)
            .await?;
        let _: () = conn.expire(&storage_key, policy.window_secs()).await?;

        let decision = Self::decide(policy, count, None, now_ms);
        trace!(
            key = %key,
            remaining = decision.remaining,
            "Request admitted on shared store"
        );
        Ok(decision)
    }
}
