//! Floodgate - request admission for API endpoints.
//!
//! This crate implements a sliding-window rate limiter over a shared Redis
//! store, with an automatic per-process fallback when that store is
//! unreachable. Handlers resolve an identifier from the request, ask a named
//! limiter for a decision, and decorate the response with the standard
//! rate-limit headers; a negative decision is theirs to turn into a 429.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;

pub use config::LimiterConfig;
pub use error::{FloodgateError, Result};
pub use http::{apply_rate_limit_headers, resolve_identifier};
pub use ratelimit::{
    PolicyRegistry, RateLimitDecision, RateLimitPolicy, RateLimiter, RedisWindowStore,
};
