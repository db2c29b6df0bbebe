//! Error types for infinder-core

use thiserror::Error;

/// Result type alias using infinder-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Infinder
///
/// The loader never surfaces these: producer failures are recorded on the
/// loader state as [`crate::loader::ProducerFailure`].
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// A configuration file is not valid YAML for its schema
    #[error("Failed to parse {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create a YAML parse error for `path`
    pub fn yaml_parse(path: impl Into<String>, source: serde_yaml_ng::Error) -> Self {
        Self::YamlParse {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = Error::invalid_config("INFINDER_MAX_RETRIES must be a valid number");
        assert_eq!(
            err.to_string(),
            "Invalid configuration format: INFINDER_MAX_RETRIES must be a valid number"
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = std::io::Error::other("disk gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("disk gone"));
    }
}
