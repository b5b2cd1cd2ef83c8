//! Logging setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::SetupError;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), SetupError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = match config.format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).try_init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).try_init(),
    };
    result.map_err(|e| SetupError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_cleanly() {
        let config = LoggingConfig::default();
        // another test may already have installed a subscriber
        let _ = init_logging(&config);
        assert!(matches!(init_logging(&config), Err(SetupError::Logging(_))));
    }
}
