use fastnum::UD64;

use crate::{
    error::OrderError,
    types::{ClientId, GoodTil, MarketId, OrderFlags, OrderRequest, OrderSide, Subaccount, TxHash},
};

/// Lifecycle state of a tracked order.
///
/// ```text
/// Pending --submit--> Submitted --ack--> Confirmed
/// Submitted --reject--> Failed
/// Confirmed --cancel request--> CancelRequested --ack--> Cancelled
/// Confirmed --height past good-til-block--> Expired
/// CancelRequested --reject--> Confirmed
/// ```
///
/// `Cancelled`, `Expired`, and `Failed` are terminal; a terminal order is
/// immutable and its client id is free for reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Submitted,
    Confirmed,
    CancelRequested,
    Cancelled,
    Expired,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::Expired | OrderStatus::Failed
        )
    }

    pub(crate) fn can_become(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Submitted)
                | (OrderStatus::Submitted, OrderStatus::Confirmed)
                | (OrderStatus::Submitted, OrderStatus::Failed)
                | (OrderStatus::Confirmed, OrderStatus::CancelRequested)
                | (OrderStatus::Confirmed, OrderStatus::Expired)
                | (OrderStatus::CancelRequested, OrderStatus::Cancelled)
                | (OrderStatus::CancelRequested, OrderStatus::Confirmed)
        )
    }
}

/// One submission attempt tracked by the lifecycle manager.
///
/// Created at placement, updated only through the state machine above.
/// Holds a non-owning reference to its subaccount.
#[derive(Clone, derive_more::Debug)]
pub struct Order {
    subaccount: Subaccount,
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
    status: OrderStatus,
    tx_hash: Option<TxHash>,
}

impl Order {
    pub(crate) fn pending(subaccount: Subaccount, request: &OrderRequest) -> Self {
        Self {
            subaccount,
            client_id: request.client_id(),
            market_id: request.market_id().to_string(),
            side: request.side(),
            price: request.price(),
            size: request.size(),
            good_til: request.good_til(),
            post_only: request.post_only(),
            reduce_only: request.reduce_only(),
            status: OrderStatus::Pending,
            tx_hash: None,
        }
    }

    /// Subaccount the order was placed for.
    pub fn subaccount(&self) -> &Subaccount {
        &self.subaccount
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

    /// Validity bound of the order, always consistent with
    /// [`Self::flags`].
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

    /// Reduce-only flag.
    pub fn reduce_only(&self) -> bool {
        self.reduce_only
    }

    /// Current lifecycle state.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Hash of the submission transaction, once acknowledged.
    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn transition(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_become(to) {
            return Err(OrderError::InvalidTransition {
                client_id: self.client_id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub(crate) fn record_tx_hash(&mut self, tx_hash: TxHash) {
        self.tx_hash = Some(tx_hash);
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec64;

    use super::*;

    fn order() -> Order {
        let request = OrderRequest::short_term(
            1,
            "ETH-USD",
            OrderSide::Buy,
            udec64!(1000),
            udec64!(0.01),
            110,
            false,
            false,
        )
        .unwrap();
        Order::pending(Subaccount::new("wallet1", 0), &request)
    }

    #[test]
    fn test_placement_path() {
        let mut order = order();
        assert_eq!(order.status(), OrderStatus::Pending);

        order.transition(OrderStatus::Submitted).unwrap();
        order.transition(OrderStatus::Confirmed).unwrap();
        order.transition(OrderStatus::CancelRequested).unwrap();
        order.transition(OrderStatus::Cancelled).unwrap();
        assert!(order.is_terminal());
    }

    #[test]
    fn test_cancel_reject_returns_to_confirmed() {
        let mut order = order();
        order.transition(OrderStatus::Submitted).unwrap();
        order.transition(OrderStatus::Confirmed).unwrap();
        order.transition(OrderStatus::CancelRequested).unwrap();
        order.transition(OrderStatus::Confirmed).unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn test_skipping_submission_rejected() {
        let mut order = order();
        assert!(matches!(
            order.transition(OrderStatus::Confirmed),
            Err(OrderError::InvalidTransition {
                client_id: 1,
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
            })
        ));
    }

    #[test]
    fn test_terminal_order_is_immutable() {
        let mut order = order();
        order.transition(OrderStatus::Submitted).unwrap();
        order.transition(OrderStatus::Failed).unwrap();

        for next in [
            OrderStatus::Submitted,
            OrderStatus::Confirmed,
            OrderStatus::CancelRequested,
            OrderStatus::Cancelled,
        ] {
            assert!(order.clone().transition(next).is_err());
        }
    }
}
