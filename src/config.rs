//! Policy table configuration.
//!
//! Policies form a closed, enumerated table (name -> ceiling, window,
//! message) validated once at load. Callers pick policies by name through the
//! [`PolicyRegistry`](crate::ratelimit::PolicyRegistry); nothing constructs
//! ad-hoc policies at check time.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FloodgateError, Result};
use crate::ratelimit::RateLimitPolicy;

/// Configuration for one named policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum requests admitted per window
    pub max_requests: u32,
    /// Window length in milliseconds
    pub window_ms: i64,
    /// Optional user-facing denial text
    #[serde(default)]
    pub message: Option<String>,
}

impl PolicyConfig {
    pub(crate) fn to_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_requests: self.max_requests,
            window_ms: self.window_ms,
            message: self.message.clone(),
        }
    }
}

/// The complete policy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Map of policy name to its configuration
    #[serde(default)]
    pub policies: HashMap<String, PolicyConfig>,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        let mut policies = HashMap::new();
        policies.insert(
            "auth".to_string(),
            PolicyConfig {
                max_requests: 5,
                window_ms: 15 * 60 * 1000,
                message: Some(
                    "Too many authentication attempts, please try again later".to_string(),
                ),
            },
        );
        policies.insert(
            "api".to_string(),
            PolicyConfig {
                max_requests: 100,
                window_ms: 15 * 60 * 1000,
                message: None,
            },
        );
        policies.insert(
            "expensive".to_string(),
            PolicyConfig {
                max_requests: 10,
                window_ms: 60 * 60 * 1000,
                message: Some("Rate limit exceeded for this operation".to_string()),
            },
        );
        policies.insert(
            "public".to_string(),
            PolicyConfig {
                max_requests: 300,
                window_ms: 15 * 60 * 1000,
                message: None,
            },
        );
        Self { policies }
    }
}

impl LimiterConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading rate limit configuration");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| FloodgateError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LimiterConfig = serde_yaml::from_str(yaml)
            .map_err(|e| FloodgateError::Config(format!("Failed to parse policy table: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every policy for startup-time misconfiguration.
    ///
    /// A non-positive ceiling or window is a programming error in the
    /// deployment, not a condition the limiter recovers from at check time.
    pub fn validate(&self) -> Result<()> {
        for (name, policy) in &self.policies {
            if policy.max_requests == 0 {
                return Err(FloodgateError::Config(format!(
                    "policy `{}`: max_requests must be greater than zero",
                    name
                )));
            }
            if policy.window_ms <= 0 {
                return Err(FloodgateError::Config(format!(
                    "policy `{}`: window_ms must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Build the immutable policy for `name`, if configured.
    pub fn policy(&self, name: &str) -> Option<RateLimitPolicy> {
        self.policies.get(name).map(PolicyConfig::to_policy)
    }
}
