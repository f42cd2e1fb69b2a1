use crate::{
    endpoint::{EndpointError, RejectionReason},
    num::QuantumError,
    state::OrderStatus,
    types::{BlockHeight, ClientId, MarketId, Subaccount},
};

/// Error raised by the order lifecycle layer.
///
/// Local validation failures are distinguishable from endpoint rejections
/// without string matching, and each variant carries the identifiers the
/// caller needs to reconcile tracked state against endpoint truth.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Rejected before any identifier was consumed or network call issued.
    #[error("invalid order parameters for {market_id}: {reason}")]
    InvalidOrderParameters { market_id: MarketId, reason: String },

    #[error("client id space exhausted for {subaccount} after {attempts} attempts")]
    AllocatorExhausted {
        subaccount: Subaccount,
        attempts: u32,
    },

    #[error("reference height {supplied} is stale, highest observed is {observed}")]
    StaleReference {
        supplied: BlockHeight,
        observed: BlockHeight,
    },

    /// The supplied validity bound belongs to the other resource class than
    /// the tracked order. Raised before anything is forwarded to the
    /// endpoint.
    #[error("cancel window does not match order {client_id}: {reason}")]
    InvalidCancelWindow { client_id: ClientId, reason: String },

    #[error("quantum conversion failed: {0}")]
    Quantum(#[from] QuantumError),

    /// Endpoint-side rejection, surfaced as-is. This layer never retries;
    /// the client id is the caller's idempotency key if it chooses to.
    #[error("endpoint rejected the request: {reason}")]
    EndpointRejected {
        client_id: Option<ClientId>,
        market_id: Option<MarketId>,
        reason: RejectionReason,
    },

    /// Caller-imposed deadline elapsed without an acknowledgment. The
    /// affected order stays in its in-flight state until reconciled.
    #[error("endpoint request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unknown order {client_id} for subaccount {subaccount}")]
    UnknownOrder {
        subaccount: Subaccount,
        client_id: ClientId,
    },

    #[error("invalid state transition for order {client_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        client_id: ClientId,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl From<EndpointError> for OrderError {
    fn from(value: EndpointError) -> Self {
        match value {
            EndpointError::Rejected(reason) => Self::EndpointRejected {
                client_id: None,
                market_id: None,
                reason,
            },
            EndpointError::Timeout => Self::Timeout,
            EndpointError::Transport(message) => Self::Transport(message),
        }
    }
}
