use fastnum::UD64;

use crate::error::OrderError;

use super::*;

/// Request to place an order on the venue's order book.
///
/// The two resource classes have distinct constructors on purpose:
/// [`Self::short_term`] takes a block-height bound, [`Self::long_term`]
/// takes a wall-clock bound, and neither can be built with the other's
/// expiry field. Both validate price and size before anything touches the
/// network.
#[derive(Clone, derive_more::Debug)]
pub struct OrderRequest {
    client_id: ClientId,
    market_id: MarketId,
    side: OrderSide,
    #[debug("{price}")]
    price: UD64,
    #[debug("{size}")]
    size: UD64,
    good_til: GoodTil,
    post_only: bool,
    reduce_only: bool,
}

impl OrderRequest {
    /// Create a short-term order request, valid until `good_til_block`.
    #[allow(clippy::too_many_arguments)]
    pub fn short_term(
        client_id: ClientId,
        market_id: &str,
        side: OrderSide,
        price: UD64,
        size: UD64,
        good_til_block: BlockHeight,
        post_only: bool,
        reduce_only: bool,
    ) -> Result<Self, OrderError> {
        validate(market_id, price, size)?;
        Ok(Self {
            client_id,
            market_id: market_id.to_string(),
            side,
            price,
            size,
            good_til: GoodTil::Block(good_til_block),
            post_only,
            reduce_only,
        })
    }

    /// Create a long-term order request, valid until `good_til_block_time`
    /// (unix seconds).
    #[allow(clippy::too_many_arguments)]
    pub fn long_term(
        client_id: ClientId,
        market_id: &str,
        side: OrderSide,
        price: UD64,
        size: UD64,
        good_til_block_time: u64,
        post_only: bool,
        reduce_only: bool,
    ) -> Result<Self, OrderError> {
        validate(market_id, price, size)?;
        Ok(Self {
            client_id,
            market_id: market_id.to_string(),
            side,
            price,
            size,
            good_til: GoodTil::BlockTime(good_til_block_time),
            post_only,
            reduce_only,
        })
    }

    /// Client-assigned id of the order.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Market the order targets.
    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    /// Side of the order.
    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// Limit price of the order.
    pub fn price(&self) -> UD64 {
        self.price
    }

    /// Size of the order.
    pub fn size(&self) -> UD64 {
        self.size
    }

    /// Validity bound of the order.
    pub fn good_til(&self) -> GoodTil {
        self.good_til
    }

    /// Resource class of the order.
    pub fn flags(&self) -> OrderFlags {
        self.good_til.flags()
    }

    /// Post-only flag.
    pub fn post_only(&self) -> bool {
        self.post_only
    }

    /// Reduce-only flag. Orthogonal to [`Self::post_only`].
    pub fn reduce_only(&self) -> bool {
        self.reduce_only
    }
}

/// Request to cancel a single tracked order.
///
/// The validity bound must belong to the same resource class as the order
/// being cancelled; [`crate::lifecycle::LifecycleManager::cancel`] enforces
/// the pairing before constructing one of these.
#[derive(Clone, Debug)]
pub struct CancelRequest {
    client_id: ClientId,
    market_id: MarketId,
    good_til: GoodTil,
}

impl CancelRequest {
    pub fn new(client_id: ClientId, market_id: &str, good_til: GoodTil) -> Self {
        Self {
            client_id,
            market_id: market_id.to_string(),
            good_til,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    pub fn good_til(&self) -> GoodTil {
        self.good_til
    }

    /// Resource class of the order being cancelled.
    pub fn flags(&self) -> OrderFlags {
        self.good_til.flags()
    }
}

/// One market's worth of short-term orders to cancel in a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchCancelGroup {
    /// Market the client ids belong to.
    pub market_id: MarketId,

    /// Client ids of the short-term orders to cancel.
    pub client_ids: Vec<ClientId>,
}

/// Rejects zero prices and sizes before any identifier is consumed or any
/// network call is made. Negative values are unrepresentable by the
/// unsigned decimal type.
pub(crate) fn validate(market_id: &str, price: UD64, size: UD64) -> Result<(), OrderError> {
    if price == UD64::ZERO {
        return Err(OrderError::InvalidOrderParameters {
            market_id: market_id.to_string(),
            reason: "price must be positive".to_string(),
        });
    }
    if size == UD64::ZERO {
        return Err(OrderError::InvalidOrderParameters {
            market_id: market_id.to_string(),
            reason: "size must be positive".to_string(),
        });
    }
    Ok(())
}
