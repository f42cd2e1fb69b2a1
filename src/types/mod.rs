mod order;
mod request;

pub use order::{GoodTil, OrderFlags, OrderSide};
pub use request::{BatchCancelGroup, CancelRequest, OrderRequest};

pub(crate) use request::validate as validate_order;

use std::fmt;

/// Client-assigned order id.
/// Unique per subaccount for as long as an order referencing it is in
/// flight; free for reuse once that order reaches a terminal state.
pub type ClientId = u32;

/// Index of a sub-ledger under one wallet address.
pub type SubaccountNumber = u32;

/// Venue-assigned id of a transferable asset.
pub type AssetId = u32;

/// Chain block height.
pub type BlockHeight = u64;

/// Market symbol the order book is keyed by, e.g. `ETH-USD`.
pub type MarketId = String;

/// Hash of a submitted venue transaction.
pub type TxHash = String;

/// Sub-ledger under one wallet address, identified by a numeric index.
///
/// Orders hold a non-owning reference to their subaccount; the wallet
/// behind the address is opaque to this crate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subaccount {
    address: String,
    number: SubaccountNumber,
}

impl Subaccount {
    pub fn new(address: impl Into<String>, number: SubaccountNumber) -> Self {
        Self {
            address: address.into(),
            number,
        }
    }

    /// Wallet address owning this subaccount.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Index of this subaccount under the wallet address.
    pub fn number(&self) -> SubaccountNumber {
        self.number
    }
}

impl fmt::Display for Subaccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.number)
    }
}
