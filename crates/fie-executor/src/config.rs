//! Executor Configuration
//!
//! Loaded from optional config files and `FIE__`-prefixed environment
//! variables, e.g. `FIE__REPUTATION__PENALTY=3`.

use fie_attestation::ReputationPolicy;
use fie_sunset::SunsetPolicy;
use fie_trigger::TriggerPolicy;
use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// Executor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieConfig {
    /// Attestation source reputation policy
    #[serde(default)]
    pub reputation: ReputationPolicy,

    /// Trigger coordinator tunables
    #[serde(default)]
    pub trigger: TriggerPolicy,

    /// Sunset workflow tunables
    #[serde(default)]
    pub sunset: SunsetPolicy,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl FieConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> Result<Self, SetupError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("FIE")
                    .separator("__")
                    .try_parsing(true),
            );

        let loaded: FieConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Parse a TOML document, applying defaults for missing sections
    pub fn from_toml_str(toml: &str) -> Result<Self, SetupError> {
        let loaded: FieConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Create a configuration for development/testing
    pub fn development() -> Self {
        Self {
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
            ..Default::default()
        }
    }

    /// Create a configuration for production
    pub fn production() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        self.reputation.validate()?;
        self.trigger.validate()?;
        self.sunset.validate()?;
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(SetupError::Invalid(format!(
                "unknown log format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fie_types::DAY_SECS;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FieConfig::default().validate().is_ok());
        assert!(FieConfig::development().validate().is_ok());
        assert_eq!(FieConfig::production().logging.format, "json");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FieConfig::from_toml_str(
            r#"
            [reputation]
            penalty = 3

            [trigger]
            min_inactivity_secs = 86400
            "#,
        )
        .unwrap();
        assert_eq!(config.reputation.penalty, 3);
        assert_eq!(config.reputation.reward, 1);
        assert_eq!(config.trigger.min_inactivity_secs, DAY_SECS);
        assert_eq!(config.sunset, SunsetPolicy::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_inconsistent_policy_rejected() {
        let err = FieConfig::from_toml_str(
            r#"
            [reputation]
            floor = 60
            participation_floor = 50
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SetupError::Policy(_)));

        let err = FieConfig::from_toml_str("[logging]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, SetupError::Invalid(_)));
    }
}
