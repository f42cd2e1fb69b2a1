//! Configuration for the order lifecycle demo.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): the trading identity
//! - CLI arguments: order parameters for the walkthrough

use std::time::Duration;

use clap::Parser;
use fastnum::{UD64, UD128, decimal::Context};
use order_sdk::types::{OrderSide, SubaccountNumber};

/// Environment configuration (trading identity).
///
/// The wallet address is injected here rather than compiled in; the demo
/// never embeds credentials.
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Wallet address the demo subaccount belongs to
    pub wallet_address: String,

    /// Subaccount index under the wallet (default: 0)
    pub subaccount_number: Option<SubaccountNumber>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

/// CLI arguments for the demo walkthrough.
#[derive(Debug, Parser)]
#[command(name = "order-demo")]
#[command(about = "Order lifecycle walkthrough against the in-process venue")]
pub struct CliConfig {
    /// Market to trade (e.g. "ETH-USD")
    #[arg(long, default_value = "ETH-USD")]
    pub market: String,

    /// Order side: buy or sell
    #[arg(long, default_value = "buy")]
    pub side: String,

    /// Limit price
    #[arg(long, default_value = "1000")]
    pub price: String,

    /// Order size
    #[arg(long, default_value = "0.01")]
    pub size: String,

    /// Number of short-term orders to place
    #[arg(long, default_value = "3")]
    pub count: usize,

    /// Collateral to deposit before trading
    #[arg(long, default_value = "1000")]
    pub deposit: String,

    /// Place orders post-only
    #[arg(long)]
    pub post_only: bool,

    /// Time in force of the long-term order, in seconds
    #[arg(long, default_value = "60")]
    pub time_in_force_seconds: u64,

    /// Seed for the id allocator, for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

impl CliConfig {
    /// Convert CLI arguments to the validated config used by the demo.
    pub fn to_demo_config(&self) -> Result<DemoConfig, ConfigError> {
        let side = match self.side.to_ascii_lowercase().as_str() {
            "buy" => OrderSide::Buy,
            "sell" => OrderSide::Sell,
            _ => return Err(ConfigError::InvalidSide(self.side.clone())),
        };

        let price = UD64::from_str(&self.price, Context::default())
            .map_err(|_| ConfigError::InvalidDecimal("price"))?;
        let size = UD64::from_str(&self.size, Context::default())
            .map_err(|_| ConfigError::InvalidDecimal("size"))?;
        let deposit = UD128::from_str(&self.deposit, Context::default())
            .map_err(|_| ConfigError::InvalidDecimal("deposit"))?;

        if self.count == 0 {
            return Err(ConfigError::ZeroCount);
        }

        Ok(DemoConfig {
            market: self.market.clone(),
            side,
            price,
            size,
            count: self.count,
            deposit,
            post_only: self.post_only,
            time_in_force: Duration::from_secs(self.time_in_force_seconds),
            seed: self.seed,
        })
    }
}

/// Validated demo parameters (pure data, no IO concerns).
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub market: String,
    pub side: OrderSide,
    pub price: UD64,
    pub size: UD64,
    pub count: usize,
    pub deposit: UD128,
    pub post_only: bool,
    pub time_in_force: Duration,
    pub seed: Option<u64>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid decimal value for {0}")]
    InvalidDecimal(&'static str),

    #[error("Invalid side: {0} (expected buy or sell)")]
    InvalidSide(String),

    #[error("count must be at least 1")]
    ZeroCount,
}

#[cfg(test)]
mod tests {
    use fastnum::{udec64, udec128};

    use super::*;

    fn cli() -> CliConfig {
        CliConfig {
            market: "ETH-USD".to_string(),
            side: "buy".to_string(),
            price: "1000".to_string(),
            size: "0.01".to_string(),
            count: 3,
            deposit: "1000".to_string(),
            post_only: false,
            time_in_force_seconds: 60,
            seed: None,
        }
    }

    #[test]
    fn test_cli_config_to_demo_config() {
        let config = cli().to_demo_config().unwrap();
        assert_eq!(config.side, OrderSide::Buy);
        assert_eq!(config.price, udec64!(1000));
        assert_eq!(config.size, udec64!(0.01));
        assert_eq!(config.deposit, udec128!(1000));
        assert_eq!(config.time_in_force, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_side() {
        let mut cli = cli();
        cli.side = "hold".to_string();
        assert!(matches!(
            cli.to_demo_config(),
            Err(ConfigError::InvalidSide(_))
        ));
    }

    #[test]
    fn test_invalid_price() {
        let mut cli = cli();
        cli.price = "not-a-number".to_string();
        assert!(matches!(
            cli.to_demo_config(),
            Err(ConfigError::InvalidDecimal("price"))
        ));
    }

    #[test]
    fn test_zero_count() {
        let mut cli = cli();
        cli.count = 0;
        assert!(matches!(cli.to_demo_config(), Err(ConfigError::ZeroCount)));
    }
}
