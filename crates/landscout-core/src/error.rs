//! Core error types for Landscout.
//!
//! `ConfigError` covers loading and saving the config file; `LandscoutError`
//! wraps it together with profile validation failures.

use thiserror::Error;

/// Errors raised while turning configuration into a runnable search.
#[derive(Error, Debug)]
pub enum LandscoutError {
    /// The configuration could not be loaded or the profile is missing
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A profile's criteria cannot describe any listing
    #[error("invalid criteria in profile '{profile}': {reason}")]
    InvalidCriteria {
        /// Profile that failed validation
        profile: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested search profile does not exist
    #[error("profile '{name}' not found")]
    ProfileNotFound {
        /// Profile name that was requested
        name: String,
    },

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `LandscoutError`.
pub type Result<T> = std::result::Result<T, LandscoutError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LandscoutError::InvalidCriteria {
            profile: "montana".to_string(),
            reason: "minAcres must not be negative".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid criteria in profile 'montana': minAcres must not be negative"
        );

        let err = ConfigError::ProfileNotFound {
            name: "montana".to_string(),
        };
        assert_eq!(err.to_string(), "profile 'montana' not found");
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::NoConfigDir;
        let err: LandscoutError = config_err.into();
        assert!(matches!(err, LandscoutError::Config(_)));
    }
}
