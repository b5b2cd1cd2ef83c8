//! Setup errors
//!
//! Runtime operations return [`fie_types::FieError`]; these cover only
//! configuration loading and logging initialization.

use fie_types::FieError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid policy: {0}")]
    Policy(#[from] FieError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}
