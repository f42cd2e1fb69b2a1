//! Interfaces this crate consumes from its environment.
//!
//! The execution endpoint and the height oracle are supplied by the
//! embedding application (a validator RPC client, a gateway, or the
//! in-process venue from [`crate::testing`]). The lifecycle manager is
//! generic over both and never dials a network itself.
//!
//! None of the calls define their own timeout; callers impose one and feed
//! late acknowledgments back through the reconciliation API of
//! [`crate::lifecycle::LifecycleManager`].

use std::sync::Arc;

use crate::{
    transfer::TransferRequest,
    types::{
        BatchCancelGroup, BlockHeight, CancelRequest, ClientId, MarketId, OrderRequest, Subaccount,
        TxHash,
    },
};

/// Endpoint-specific reason a request was not accepted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("insufficient margin")]
    InsufficientMargin,

    #[error("invalid market: {0}")]
    InvalidMarket(MarketId),

    #[error("validity window already elapsed")]
    StaleWindow,

    #[error("{0}")]
    Other(String),
}

/// Error returned by the execution endpoint or the height oracle.
#[derive(Clone, Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("rejected: {0}")]
    Rejected(RejectionReason),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Acknowledgment of an accepted order submission.
#[derive(Clone, Debug)]
pub struct SubmitAck {
    pub tx_hash: TxHash,
}

/// Acknowledgment of an accepted cancellation.
#[derive(Clone, Debug)]
pub struct CancelAck {
    pub tx_hash: TxHash,
}

/// Result of one group within a batch cancellation.
#[derive(Clone, Debug)]
pub struct GroupOutcome {
    pub market_id: MarketId,

    pub client_ids: Vec<ClientId>,

    /// `None` if the endpoint accepted the group; otherwise why it did not.
    pub rejected: Option<RejectionReason>,
}

/// Result of a batch cancellation.
///
/// Atomicity is endpoint-defined: an endpoint reporting per-group results
/// fills one [`GroupOutcome`] per submitted group, an all-or-nothing
/// endpoint reports a single aggregate group.
#[derive(Clone, Debug)]
pub struct BatchCancelOutcome {
    pub tx_hash: TxHash,
    pub groups: Vec<GroupOutcome>,
}

/// Remote order-execution endpoint of the venue.
pub trait ExecutionEndpoint {
    /// Submit a placement request signed for the given subaccount.
    async fn submit_order(
        &self,
        subaccount: &Subaccount,
        request: &OrderRequest,
    ) -> Result<SubmitAck, EndpointError>;

    /// Cancel a single resting order.
    async fn cancel_order(
        &self,
        subaccount: &Subaccount,
        request: &CancelRequest,
    ) -> Result<CancelAck, EndpointError>;

    /// Cancel several short-term orders sharing one validity window.
    async fn batch_cancel(
        &self,
        subaccount: &Subaccount,
        groups: &[BatchCancelGroup],
        good_til_block: BlockHeight,
    ) -> Result<BatchCancelOutcome, EndpointError>;

    /// Move collateral between the venue's ledgers.
    async fn transfer(&self, request: &TransferRequest) -> Result<TxHash, EndpointError>;
}

/// Source of the venue chain's latest block height.
///
/// The reported height may lag the true tip by an endpoint-defined margin;
/// [`crate::window::WindowTracker`] bounds how much lag is tolerated.
pub trait HeightOracle {
    async fn latest_height(&self) -> Result<BlockHeight, EndpointError>;
}

impl<T: ExecutionEndpoint + Sync> ExecutionEndpoint for &T {
    async fn submit_order(
        &self,
        subaccount: &Subaccount,
        request: &OrderRequest,
    ) -> Result<SubmitAck, EndpointError> {
        (**self).submit_order(subaccount, request).await
    }

    async fn cancel_order(
        &self,
        subaccount: &Subaccount,
        request: &CancelRequest,
    ) -> Result<CancelAck, EndpointError> {
        (**self).cancel_order(subaccount, request).await
    }

    async fn batch_cancel(
        &self,
        subaccount: &Subaccount,
        groups: &[BatchCancelGroup],
        good_til_block: BlockHeight,
    ) -> Result<BatchCancelOutcome, EndpointError> {
        (**self).batch_cancel(subaccount, groups, good_til_block).await
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TxHash, EndpointError> {
        (**self).transfer(request).await
    }
}

impl<T: ExecutionEndpoint + Sync + Send> ExecutionEndpoint for Arc<T> {
    async fn submit_order(
        &self,
        subaccount: &Subaccount,
        request: &OrderRequest,
    ) -> Result<SubmitAck, EndpointError> {
        (**self).submit_order(subaccount, request).await
    }

    async fn cancel_order(
        &self,
        subaccount: &Subaccount,
        request: &CancelRequest,
    ) -> Result<CancelAck, EndpointError> {
        (**self).cancel_order(subaccount, request).await
    }

    async fn batch_cancel(
        &self,
        subaccount: &Subaccount,
        groups: &[BatchCancelGroup],
        good_til_block: BlockHeight,
    ) -> Result<BatchCancelOutcome, EndpointError> {
        (**self).batch_cancel(subaccount, groups, good_til_block).await
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TxHash, EndpointError> {
        (**self).transfer(request).await
    }
}

impl<T: HeightOracle + Sync> HeightOracle for &T {
    async fn latest_height(&self) -> Result<BlockHeight, EndpointError> {
        (**self).latest_height().await
    }
}

impl<T: HeightOracle + Sync + Send> HeightOracle for Arc<T> {
    async fn latest_height(&self) -> Result<BlockHeight, EndpointError> {
        (**self).latest_height().await
    }
}
