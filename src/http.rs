//! HTTP edge helpers: identifier resolution and response decoration.
//!
//! These are the only two points where the limiter touches transport-level
//! state. The handler layer itself (routing, 429 responses) stays outside
//! this crate.

use chrono::Utc;
use http::{HeaderMap, HeaderValue};

use crate::ratelimit::RateLimitDecision;

/// Bucket used when no client address can be determined.
///
/// Unattributable traffic is throttled together under this one key, a
/// conservative default rather than an error.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

/// Derive the admission key for a request from its headers.
///
/// Prefers the left-most `x-forwarded-for` entry, which is conventionally
/// the original client in a proxy chain, then `x-real-ip`, then the
/// [`UNKNOWN_IDENTIFIER`] sentinel. Never fails.
pub fn resolve_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
        })
        .unwrap_or(UNKNOWN_IDENTIFIER)
        .to_string()
}

/// Write the standard rate-limit headers for a decision.
///
/// Always sets `x-ratelimit-limit`, `x-ratelimit-remaining` and
/// `x-ratelimit-reset` (epoch seconds); sets `retry-after` only on denial.
/// Pure header arithmetic, no I/O.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    apply_rate_limit_headers_at(headers, decision, Utc::now().timestamp());
}

fn apply_rate_limit_headers_at(
    headers: &mut HeaderMap,
    decision: &RateLimitDecision,
    now_epoch_seconds: i64,
) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from(decision.reset_epoch_seconds),
    );

    if !decision.allowed {
        let retry_after = (decision.reset_epoch_seconds - now_epoch_seconds).max(1);
        headers.insert("retry-after", HeaderValue::from(retry_after));
    }
}
