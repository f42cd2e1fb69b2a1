//! In-process testing venue.
//!
//! [`MockVenue`] implements [`ExecutionEndpoint`] and [`HeightOracle`]
//! without a network: the chain height is a settable counter, submissions
//! and cancellations succeed with generated transaction hashes, and knobs
//! script rejections, timeouts, and per-market batch-group failures. Every
//! call is recorded so tests can assert exactly what reached the venue,
//! including that a given path made no call at all.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use dashmap::DashMap;

use crate::{
    endpoint::{
        BatchCancelOutcome, CancelAck, EndpointError, ExecutionEndpoint, GroupOutcome,
        HeightOracle, RejectionReason, SubmitAck,
    },
    transfer::TransferRequest,
    types::{
        BatchCancelGroup, BlockHeight, CancelRequest, GoodTil, MarketId, OrderRequest, Subaccount,
        TxHash,
    },
};

/// In-process venue with a settable chain height and scripted failures.
#[derive(Debug, Default)]
pub struct MockVenue {
    height: AtomicU64,
    next_tx: AtomicU64,
    reject_submits: Mutex<Option<RejectionReason>>,
    reject_cancels: Mutex<Option<RejectionReason>>,
    timeout_submits: AtomicBool,
    timeout_cancels: AtomicBool,
    reject_groups: DashMap<MarketId, RejectionReason>,
    submissions: Mutex<Vec<OrderRequest>>,
    cancellations: Mutex<Vec<CancelRequest>>,
    batch_cancellations: Mutex<Vec<(Vec<BatchCancelGroup>, BlockHeight)>>,
    transfers: Mutex<Vec<TransferRequest>>,
}

impl MockVenue {
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height: AtomicU64::new(height),
            ..Self::default()
        }
    }

    /// Current chain height reported by the oracle.
    pub fn height(&self) -> BlockHeight {
        self.height.load(Ordering::Acquire)
    }

    pub fn set_height(&self, height: BlockHeight) {
        self.height.store(height, Ordering::Release);
    }

    pub fn advance_height(&self, blocks: u64) -> BlockHeight {
        self.height.fetch_add(blocks, Ordering::AcqRel) + blocks
    }

    /// Make every subsequent submission fail with the given reason;
    /// `None` restores acceptance.
    pub fn reject_submissions(&self, reason: Option<RejectionReason>) {
        *self.reject_submits.lock().expect("MockVenue: mutex poisoned") = reason;
    }

    /// Make every subsequent single cancellation fail with the given
    /// reason; `None` restores acceptance.
    pub fn reject_cancellations(&self, reason: Option<RejectionReason>) {
        *self.reject_cancels.lock().expect("MockVenue: mutex poisoned") = reason;
    }

    /// Make every subsequent submission time out without an acknowledgment.
    pub fn timeout_submissions(&self, enabled: bool) {
        self.timeout_submits.store(enabled, Ordering::Release);
    }

    /// Make every subsequent single cancellation time out without an
    /// acknowledgment.
    pub fn timeout_cancellations(&self, enabled: bool) {
        self.timeout_cancels.store(enabled, Ordering::Release);
    }

    /// Make batch-cancel groups for the given market report as rejected.
    pub fn reject_group(&self, market_id: &str, reason: RejectionReason) {
        self.reject_groups.insert(market_id.to_string(), reason);
    }

    /// Every submission that reached the venue, accepted or not.
    pub fn submissions(&self) -> Vec<OrderRequest> {
        self.submissions
            .lock()
            .expect("MockVenue: mutex poisoned")
            .clone()
    }

    /// Every single cancellation that reached the venue.
    pub fn cancellations(&self) -> Vec<CancelRequest> {
        self.cancellations
            .lock()
            .expect("MockVenue: mutex poisoned")
            .clone()
    }

    /// Every batch cancellation that reached the venue, with the window it
    /// was submitted under.
    pub fn batch_cancellations(&self) -> Vec<(Vec<BatchCancelGroup>, BlockHeight)> {
        self.batch_cancellations
            .lock()
            .expect("MockVenue: mutex poisoned")
            .clone()
    }

    /// Every transfer that reached the venue.
    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.transfers
            .lock()
            .expect("MockVenue: mutex poisoned")
            .clone()
    }

    fn next_tx_hash(&self) -> TxHash {
        format!("{:064X}", self.next_tx.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

impl ExecutionEndpoint for MockVenue {
    async fn submit_order(
        &self,
        _subaccount: &Subaccount,
        request: &OrderRequest,
    ) -> Result<SubmitAck, EndpointError> {
        self.submissions
            .lock()
            .expect("MockVenue: mutex poisoned")
            .push(request.clone());

        if self.timeout_submits.load(Ordering::Acquire) {
            return Err(EndpointError::Timeout);
        }
        if let Some(reason) = self
            .reject_submits
            .lock()
            .expect("MockVenue: mutex poisoned")
            .clone()
        {
            return Err(EndpointError::Rejected(reason));
        }
        // A short-term window the chain already moved past is rejected the
        // way a real venue would.
        if let GoodTil::Block(good_til_block) = request.good_til() {
            if good_til_block < self.height() {
                return Err(EndpointError::Rejected(RejectionReason::StaleWindow));
            }
        }
        Ok(SubmitAck {
            tx_hash: self.next_tx_hash(),
        })
    }

    async fn cancel_order(
        &self,
        _subaccount: &Subaccount,
        request: &CancelRequest,
    ) -> Result<CancelAck, EndpointError> {
        self.cancellations
            .lock()
            .expect("MockVenue: mutex poisoned")
            .push(request.clone());

        if self.timeout_cancels.load(Ordering::Acquire) {
            return Err(EndpointError::Timeout);
        }
        if let Some(reason) = self
            .reject_cancels
            .lock()
            .expect("MockVenue: mutex poisoned")
            .clone()
        {
            return Err(EndpointError::Rejected(reason));
        }
        Ok(CancelAck {
            tx_hash: self.next_tx_hash(),
        })
    }

    async fn batch_cancel(
        &self,
        _subaccount: &Subaccount,
        groups: &[BatchCancelGroup],
        good_til_block: BlockHeight,
    ) -> Result<BatchCancelOutcome, EndpointError> {
        self.batch_cancellations
            .lock()
            .expect("MockVenue: mutex poisoned")
            .push((groups.to_vec(), good_til_block));

        let groups = groups
            .iter()
            .map(|group| GroupOutcome {
                market_id: group.market_id.clone(),
                client_ids: group.client_ids.clone(),
                rejected: self
                    .reject_groups
                    .get(&group.market_id)
                    .map(|reason| reason.value().clone()),
            })
            .collect();
        Ok(BatchCancelOutcome {
            tx_hash: self.next_tx_hash(),
            groups,
        })
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<TxHash, EndpointError> {
        self.transfers
            .lock()
            .expect("MockVenue: mutex poisoned")
            .push(request.clone());
        Ok(self.next_tx_hash())
    }
}

impl HeightOracle for MockVenue {
    async fn latest_height(&self) -> Result<BlockHeight, EndpointError> {
        Ok(self.height())
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec64;

    use crate::types::{OrderSide, Subaccount};

    use super::*;

    fn request(good_til_block: BlockHeight) -> OrderRequest {
        OrderRequest::short_term(
            1,
            "ETH-USD",
            OrderSide::Buy,
            udec64!(1000),
            udec64!(0.01),
            good_til_block,
            false,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_submissions_are_recorded_and_acked() {
        let venue = MockVenue::new(100);
        let subaccount = Subaccount::new("wallet1", 0);

        let first = tokio_test::block_on(venue.submit_order(&subaccount, &request(110))).unwrap();
        let second = tokio_test::block_on(venue.submit_order(&subaccount, &request(111))).unwrap();

        assert_ne!(first.tx_hash, second.tx_hash);
        assert_eq!(venue.submissions().len(), 2);
    }

    #[test]
    fn test_scripted_rejection() {
        let venue = MockVenue::new(100);
        let subaccount = Subaccount::new("wallet1", 0);
        venue.reject_submissions(Some(RejectionReason::InsufficientMargin));

        let result = tokio_test::block_on(venue.submit_order(&subaccount, &request(110)));
        assert!(matches!(
            result,
            Err(EndpointError::Rejected(RejectionReason::InsufficientMargin))
        ));

        venue.reject_submissions(None);
        assert!(tokio_test::block_on(venue.submit_order(&subaccount, &request(110))).is_ok());
    }

    #[test]
    fn test_elapsed_window_rejected_as_stale() {
        let venue = MockVenue::new(200);
        let subaccount = Subaccount::new("wallet1", 0);

        let result = tokio_test::block_on(venue.submit_order(&subaccount, &request(110)));
        assert!(matches!(
            result,
            Err(EndpointError::Rejected(RejectionReason::StaleWindow))
        ));
    }
}
