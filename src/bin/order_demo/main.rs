//! Order lifecycle demo.
//!
//! This binary walks the full order lifecycle (deposit, placement,
//! cancellation, batch cancellation, expiry reconciliation, withdrawal)
//! against the crate's in-process venue, logging each step.

mod config;
mod demo;
mod error;

use std::process::exit;

use clap::Parser;
use order_sdk::types::Subaccount;
use tracing::error;

use config::{CliConfig, EnvConfig};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    let demo_config = match cli_config.to_demo_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let subaccount = Subaccount::new(
        env_config.wallet_address,
        env_config.subaccount_number.unwrap_or(0),
    );

    if let Err(e) = demo::run(subaccount, demo_config).await {
        error!(%e, "Order demo failed");
        exit(1);
    }
}
