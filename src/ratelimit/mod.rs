//! Rate limiting logic and state management.

mod backend;
mod limiter;
mod local;
mod policy;
mod registry;
mod shared;

pub use backend::WindowStore;
pub use limiter::RateLimiter;
pub use local::LocalWindowStore;
pub use policy::{RateLimitDecision, RateLimitPolicy, DEFAULT_DENIAL_MESSAGE};
pub use registry::PolicyRegistry;
pub use shared::RedisWindowStore;
