//! Order lifecycle SDK for a chain-backed perpetuals venue.
//!
//! # Overview
//!
//! Hardened submission layer between a caller and a remote order-execution
//! endpoint: client-assigned order identifiers that stay unique while an
//! order is in flight, block-height/time-bounded validity windows, an
//! explicit per-order state machine, and fixed-point conversion of transfer
//! amounts.
//!
//! Use [`lifecycle::LifecycleManager`] to place and cancel orders against
//! any implementation of [`endpoint::ExecutionEndpoint`] and
//! [`endpoint::HeightOracle`]. The manager tracks every submitted order per
//! subaccount and exposes reconciliation methods to fold late
//! acknowledgments, timeouts, and observed chain heights back into the
//! tracked state.
//!
//! Use [`transfer::TransferRequest`] to prepare collateral deposits,
//! withdrawals, and subaccount-to-subaccount transfers in quantum units.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * No automatic retry of submissions or cancellations. Retrying a submit
//!   risks duplicate fills; callers own the retry policy and can use the
//!   client id as an idempotency key.
//!
//! * Fill tracking is out of scope. Orders leave the in-flight set through
//!   cancellation, expiry, or failure only.
//!
//! # Testing
//!
//! [`testing`] module provides an in-process venue with a settable chain
//! height and scripted rejections for exercising every lifecycle path
//! without a network.

pub mod alloc;
pub mod endpoint;
pub mod error;
pub mod lifecycle;
pub mod num;
pub mod state;
pub mod stream;
pub mod testing;
pub mod transfer;
pub mod types;
pub mod window;

use types::AssetId;

/// Default asset id of the collateral token.
pub const COLLATERAL_ASSET_ID: AssetId = 0;

/// Default number of fractional digits of the collateral token.
pub const COLLATERAL_DECIMALS: u8 = 6;

/// Default number of blocks a short-term order stays valid for.
pub const DEFAULT_SHORT_TERM_TTL: u64 = 10;

#[derive(Clone, Debug)]
/// Venue the orders are submitted to.
pub struct Venue {
    chain_id: String,
    collateral_asset: AssetId,
    collateral_decimals: u8,
    short_term_ttl: u64,
    max_height_age: u64,
}

impl Venue {
    pub fn testnet() -> Self {
        Self {
            chain_id: "perp-testnet-1".to_string(),
            collateral_asset: COLLATERAL_ASSET_ID,
            collateral_decimals: COLLATERAL_DECIMALS,
            short_term_ttl: DEFAULT_SHORT_TERM_TTL,
            max_height_age: 20,
        }
    }

    pub fn custom(
        chain_id: String,
        collateral_asset: AssetId,
        collateral_decimals: u8,
        short_term_ttl: u64,
        max_height_age: u64,
    ) -> Self {
        Self {
            chain_id,
            collateral_asset,
            collateral_decimals,
            short_term_ttl,
            max_height_age,
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn collateral_asset(&self) -> AssetId {
        self.collateral_asset
    }

    pub fn collateral_decimals(&self) -> u8 {
        self.collateral_decimals
    }

    /// Blocks a freshly placed short-term order stays valid for.
    pub fn short_term_ttl(&self) -> u64 {
        self.short_term_ttl
    }

    /// Maximum age, in blocks, a reference height may lag behind the highest
    /// observed height before it is considered stale.
    pub fn max_height_age(&self) -> u64 {
        self.max_height_age
    }
}
