//! Runtime configuration types for operational parameters
//!
//! These types control how deferred resources are loaded: the retry budget
//! and delay of each loader, plus the network settings used by HTTP producers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Loader retry policies
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Loader policy configurations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Policy used when no per-resource policy matches
    #[serde(default)]
    pub default: LoadPolicy,

    /// Per-resource policies, keyed by resource name
    #[serde(default)]
    pub resources: HashMap<String, LoadPolicy>,
}

impl LoaderConfig {
    /// Policy for a named resource, falling back to the default
    pub fn policy_for(&self, resource: &str) -> LoadPolicy {
        self.resources
            .get(resource)
            .copied()
            .unwrap_or(self.default)
    }
}

/// Retry budget and delay for a single loader instance
///
/// `max_retries = 0` allows exactly one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoadPolicy {
    /// Maximum number of caller-initiated retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between a retry request and the attempt, in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl LoadPolicy {
    /// Delay as a `Duration`
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}

/// Network and HTTP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    300 // 5 minutes
}
fn default_user_agent() -> String {
    format!(
        "infinder/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_policy_defaults() {
        let policy = LoadPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.retry_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: RuntimeConfig = serde_yaml_ng::from_str(
            r#"
loader:
  default:
    max-retries: 0
  resources:
    avatar:
      retry-delay-ms: 250
"#,
        )
        .unwrap();

        assert_eq!(config.loader.default.max_retries, 0);
        assert_eq!(config.loader.default.retry_delay_ms, 1000);

        let avatar = config.loader.policy_for("avatar");
        assert_eq!(avatar.max_retries, 3);
        assert_eq!(avatar.retry_delay_ms, 250);

        assert_eq!(config.network.http_timeout_secs, 300);
    }

    #[test]
    fn test_policy_for_unknown_resource_falls_back() {
        let config = LoaderConfig {
            default: LoadPolicy {
                max_retries: 5,
                retry_delay_ms: 10,
            },
            resources: HashMap::new(),
        };
        assert_eq!(config.policy_for("dashboard"), config.default);
    }

    #[test]
    fn test_user_agent_mentions_version() {
        let network = NetworkConfig::default();
        assert!(network.user_agent.starts_with("infinder/"));
        assert!(network.user_agent.contains(env!("CARGO_PKG_VERSION")));
    }
}
