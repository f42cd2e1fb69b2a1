//! Error types for the order lifecycle demo.

use order_sdk::error::OrderError;

use crate::config::ConfigError;

/// Main error type for the order lifecycle demo.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Order lifecycle error: {0}")]
    Order(#[from] OrderError),
}

pub type Result<T> = std::result::Result<T, Error>;
