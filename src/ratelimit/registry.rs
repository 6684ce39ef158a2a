//! Named, pre-built rate limiters.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::LimiterConfig;
use crate::error::Result;

use super::backend::WindowStore;
use super::limiter::RateLimiter;

/// The set of limiters a process runs with, one per named policy.
///
/// Built once during process initialization from a validated
/// [`LimiterConfig`] and passed to handlers explicitly, never referenced as
/// ambient global state. All limiters share one handle to the shared store;
/// each carries its own local fallback. Adding a policy means adding a table
/// entry, no code changes elsewhere.
pub struct PolicyRegistry {
    limiters: HashMap<String, Arc<RateLimiter>>,
}

impl PolicyRegistry {
    /// Build limiters for every policy in `config`.
    pub fn new(config: &LimiterConfig, shared: Arc<dyn WindowStore>) -> Result<Self> {
        config.validate()?;

        let mut limiters = HashMap::new();
        for (name, policy_config) in &config.policies {
            let policy = policy_config.to_policy();
            debug!(
                policy = %name,
                limit = policy.max_requests,
                window_ms = policy.window_ms,
                "Registering rate limit policy"
            );
            limiters.insert(
                name.clone(),
                Arc::new(RateLimiter::new(policy, shared.clone())),
            );
        }

        Ok(Self { limiters })
    }

    /// Build a registry with the standard policy table.
    pub fn with_defaults(shared: Arc<dyn WindowStore>) -> Result<Self> {
        Self::new(&LimiterConfig::default(), shared)
    }

    /// Look up the limiter for a named policy.
    pub fn get(&self, name: &str) -> Option<Arc<RateLimiter>> {
        self.limiters.get(name).cloned()
    }

    /// Names of all registered policies.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.limiters.keys().map(String::as_str)
    }

    /// Number of registered policies.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Whether the registry holds no policies.
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}
