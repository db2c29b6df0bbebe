//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. User config (~/.infinder/infinder.yaml) or an explicit `--config` file
//! 3. Environment variables (INFINDER_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{LoaderConfig, RuntimeConfig};
use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;

/// Name of the user configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "infinder.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader rooted at ~/.infinder
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.infinder)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::invalid_config("Could not determine home directory"))?;

        Ok(Utf8PathBuf::from(home).join(".infinder"))
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = RuntimeConfig::default();

        let config_path = self.config_file();
        if config_path.exists() {
            let file_config = self.load_yaml_file::<RuntimeConfig>(&config_path)?;
            config = Self::merge_runtime_config(config, file_config);
        }

        self.apply_env_overrides(config)
    }

    /// Load runtime configuration from an explicit file
    ///
    /// Unlike the user config file, an explicit file must exist.
    pub fn load_runtime_config_from(&self, path: &Utf8Path) -> Result<RuntimeConfig> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }

        let file_config = self.load_yaml_file::<RuntimeConfig>(path)?;
        let config = Self::merge_runtime_config(RuntimeConfig::default(), file_config);

        self.apply_env_overrides(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let config: T =
            serde_yaml_ng::from_str(&content).map_err(|e| Error::yaml_parse(path.as_str(), e))?;
        Ok(config)
    }

    /// Merge two runtime configs (base is overridden by overlay)
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            loader: Self::merge_loader_config(base.loader, overlay.loader),
            network: overlay.network,
        }
    }

    /// Merge loader policies
    fn merge_loader_config(mut base: LoaderConfig, overlay: LoaderConfig) -> LoaderConfig {
        for (key, policy) in overlay.resources {
            base.resources.insert(key, policy);
        }
        base.default = overlay.default;
        base
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("INFINDER_MAX_RETRIES") {
            config.loader.default.max_retries = val.parse().map_err(|_| {
                Error::invalid_config("INFINDER_MAX_RETRIES must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("INFINDER_RETRY_DELAY_MS") {
            config.loader.default.retry_delay_ms = val.parse().map_err(|_| {
                Error::invalid_config("INFINDER_RETRY_DELAY_MS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("INFINDER_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("INFINDER_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("INFINDER_USER_AGENT") {
            config.network.user_agent = val;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Path of the user configuration file
    pub fn config_file(&self) -> Utf8PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoadPolicy;
    use serial_test::serial;
    use tempfile::TempDir;

    fn create_temp_loader() -> (HierarchicalConfigLoader, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_dir =
            Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("Invalid UTF-8 path");
        let loader = HierarchicalConfigLoader::with_dir(config_dir);
        (loader, temp_dir)
    }

    #[test]
    #[serial]
    fn test_load_runtime_config_defaults() {
        let (loader, _temp) = create_temp_loader();
        let config = loader.load_runtime_config().unwrap();
        assert_eq!(config.loader.default, LoadPolicy::default());
        assert_eq!(config.network.http_timeout_secs, 300);
    }

    #[test]
    #[serial]
    fn test_load_runtime_config_from_file() {
        let (loader, _temp) = create_temp_loader();

        let config_content = r#"
loader:
  default:
    max-retries: 1
    retry-delay-ms: 50
  resources:
    analytics:
      max-retries: 5
network:
  http-timeout-secs: 30
"#;
        fs::write(loader.config_file(), config_content).unwrap();

        let config = loader.load_runtime_config().unwrap();
        assert_eq!(config.loader.default.max_retries, 1);
        assert_eq!(config.loader.default.retry_delay_ms, 50);
        assert_eq!(config.loader.policy_for("analytics").max_retries, 5);
        assert_eq!(config.network.http_timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_explicit_config_must_exist() {
        let (loader, temp) = create_temp_loader();
        let missing = Utf8PathBuf::from_path_buf(temp.path().join("nope.yaml")).unwrap();

        let err = loader.load_runtime_config_from(&missing).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_malformed_file_is_yaml_parse_error() {
        let (loader, _temp) = create_temp_loader();
        fs::write(loader.config_file(), "loader: [not, a, map]").unwrap();

        let err = loader.load_runtime_config().unwrap_err();
        assert!(matches!(err, Error::YamlParse { .. }));
        assert!(err.to_string().contains("infinder.yaml"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        let (loader, _temp) = create_temp_loader();

        env::set_var("INFINDER_MAX_RETRIES", "7");
        env::set_var("INFINDER_RETRY_DELAY_MS", "20");
        env::set_var("INFINDER_USER_AGENT", "infinder-test");

        let config = loader.load_runtime_config();

        env::remove_var("INFINDER_MAX_RETRIES");
        env::remove_var("INFINDER_RETRY_DELAY_MS");
        env::remove_var("INFINDER_USER_AGENT");

        let config = config.unwrap();
        assert_eq!(config.loader.default.max_retries, 7);
        assert_eq!(config.loader.default.retry_delay_ms, 20);
        assert_eq!(config.network.user_agent, "infinder-test");
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_garbage() {
        let (loader, _temp) = create_temp_loader();

        env::set_var("INFINDER_HTTP_TIMEOUT_SECS", "soon");
        let result = loader.load_runtime_config();
        env::remove_var("INFINDER_HTTP_TIMEOUT_SECS");

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_merge_keeps_base_resources() {
        let mut base = RuntimeConfig::default();
        base.loader
            .resources
            .insert("avatar".into(), LoadPolicy::default());

        let mut overlay = RuntimeConfig::default();
        overlay.loader.resources.insert(
            "charts".into(),
            LoadPolicy {
                max_retries: 0,
                retry_delay_ms: 0,
            },
        );

        let merged = HierarchicalConfigLoader::merge_runtime_config(base, overlay);
        assert!(merged.loader.resources.contains_key("avatar"));
        assert_eq!(merged.loader.policy_for("charts").max_retries, 0);
    }
}
