//! Order lifecycle orchestration.
//!
//! [`LifecycleManager`] sits between a caller and the venue's execution
//! endpoint. It allocates client ids, computes validity windows from fresh
//! reference heights, records every submission attempt as a tracked
//! [`Order`], and drives each order through its state machine as
//! acknowledgments, rejections, and observed chain heights come in.
//!
//! Single caller per subaccount is the intended usage. The id allocator and
//! the tracked-order maps are safe under concurrent callers, and an
//! allocated id is visible as taken before the submit call goes out, but
//! the manager does not serialize operations on one subaccount against
//! each other.
//!
//! No operation imposes its own timeout. When a caller-side timeout fires,
//! the affected order parks in its in-flight state (`Submitted` or
//! `CancelRequested`); a later acknowledgment is folded in with
//! [`LifecycleManager::apply_ack`], and [`LifecycleManager::resolve_timeout`]
//! settles the order once the caller knows no acknowledgment is coming.
//! This layer never retries: the client id is the caller's idempotency key.

use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use dashmap::DashMap;
use fastnum::{UD64, UD128};
use itertools::Itertools;
use rand::{RngCore, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    Venue,
    alloc::IdAllocator,
    endpoint::{BatchCancelOutcome, CancelAck, EndpointError, ExecutionEndpoint, HeightOracle},
    error::OrderError,
    num::Quantizer,
    state::{Order, OrderStatus, SubaccountState},
    transfer::TransferRequest,
    types::{
        self, BatchCancelGroup, BlockHeight, CancelRequest, ClientId, GoodTil, OrderFlags,
        OrderRequest, OrderSide, Subaccount, TxHash,
    },
    window::WindowTracker,
};

/// Order lifecycle manager for one venue.
///
/// Generic over the execution endpoint, the height oracle, and the
/// allocator's random source.
pub struct LifecycleManager<E, O, R = StdRng> {
    venue: Venue,
    endpoint: E,
    oracle: O,
    allocator: IdAllocator<R>,
    window: WindowTracker,
    quantizer: Quantizer,
    subaccounts: DashMap<Subaccount, Arc<SubaccountState>>,
}

impl<E, O> LifecycleManager<E, O>
where
    E: ExecutionEndpoint,
    O: HeightOracle,
{
    /// Create a manager with an entropy-seeded id allocator.
    pub fn new(venue: Venue, endpoint: E, oracle: O) -> Self {
        Self::with_allocator(venue, endpoint, oracle, IdAllocator::from_entropy())
    }
}

impl<E, O, R> LifecycleManager<E, O, R>
where
    E: ExecutionEndpoint,
    O: HeightOracle,
    R: RngCore,
{
    /// Create a manager with the given id allocator, e.g. a deterministically
    /// seeded one for tests.
    pub fn with_allocator(venue: Venue, endpoint: E, oracle: O, allocator: IdAllocator<R>) -> Self {
        let window = WindowTracker::new(venue.max_height_age());
        let quantizer = Quantizer::new(venue.collateral_decimals());
        Self {
            venue,
            endpoint,
            oracle,
            allocator,
            window,
            quantizer,
            subaccounts: DashMap::new(),
        }
    }

    pub fn venue(&self) -> &Venue {
        &self.venue
    }

    /// Place a short-term order, valid for the venue's configured number of
    /// blocks past a freshly fetched reference height.
    ///
    /// Parameters are validated before the height fetch and before an
    /// identifier is consumed. On endpoint rejection the order is recorded
    /// as `Failed` and the error surfaced as-is; on endpoint timeout the
    /// order stays `Submitted` for later reconciliation.
    #[allow(clippy::too_many_arguments)]
    pub async fn place_short_term(
        &self,
        subaccount: &Subaccount,
        market_id: &str,
        side: OrderSide,
        price: UD64,
        size: UD64,
        post_only: bool,
        reduce_only: bool,
    ) -> Result<Order, OrderError> {
        types::validate_order(market_id, price, size)?;

        // The reference height is fetched immediately before use; a cached
        // height would silently shorten the effective validity window.
        let reference = self.latest_height().await?;
        let good_til_block = self
            .window
            .good_til_block(reference, self.venue.short_term_ttl())?;

        let state = self.state(subaccount);
        let client_id = self.allocator.allocate(subaccount, state.in_flight())?;
        let request = OrderRequest::short_term(
            client_id,
            market_id,
            side,
            price,
            size,
            good_til_block,
            post_only,
            reduce_only,
        )?;

        debug!(
            %subaccount,
            client_id,
            market_id,
            good_til_block,
            "placing short-term order"
        );
        self.submit(subaccount, &state, request).await
    }

    /// Place a long-term order, valid until `ttl` of wall-clock time from
    /// now.
    ///
    /// Long-term orders are a distinct resource class at the venue, with
    /// their own replay protection and expiry semantics, so this path never
    /// shares a constructor with [`Self::place_short_term`] and skips the
    /// height-based expiry entirely.
    #[allow(clippy::too_many_arguments)]
    pub async fn place_long_term(
        &self,
        subaccount: &Subaccount,
        market_id: &str,
        side: OrderSide,
        price: UD64,
        size: UD64,
        ttl: Duration,
        post_only: bool,
        reduce_only: bool,
    ) -> Result<Order, OrderError> {
        types::validate_order(market_id, price, size)?;

        let good_til_block_time = unix_now().saturating_add(ttl.as_secs());
        let state = self.state(subaccount);
        let client_id = self.allocator.allocate(subaccount, state.in_flight())?;
        let request = OrderRequest::long_term(
            client_id,
            market_id,
            side,
            price,
            size,
            good_til_block_time,
            post_only,
            reduce_only,
        )?;

        debug!(
            %subaccount,
            client_id,
            market_id,
            good_til_block_time,
            "placing long-term order"
        );
        self.submit(subaccount, &state, request).await
    }

    /// Cancel a tracked order.
    ///
    /// The supplied validity bound must belong to the same resource class
    /// as the order; a mismatch fails fast with
    /// [`OrderError::InvalidCancelWindow`] before anything reaches the
    /// endpoint, since forwarding a mismatched window risks cancelling the
    /// wrong order class. The order must be `Confirmed`; a placement in
    /// flight cannot be cancelled.
    pub async fn cancel(
        &self,
        subaccount: &Subaccount,
        client_id: ClientId,
        good_til: GoodTil,
    ) -> Result<CancelAck, OrderError> {
        let state = self.state(subaccount);
        let order = state
            .get(client_id)
            .ok_or_else(|| OrderError::UnknownOrder {
                subaccount: subaccount.clone(),
                client_id,
            })?;

        if good_til.flags() != order.flags() {
            return Err(OrderError::InvalidCancelWindow {
                client_id,
                reason: format!(
                    "order is {:?}, supplied bound is {:?}",
                    order.flags(),
                    good_til.flags()
                ),
            });
        }

        state.transition(subaccount, client_id, OrderStatus::CancelRequested)?;
        let request = CancelRequest::new(client_id, order.market_id(), good_til);

        match self.endpoint.cancel_order(subaccount, &request).await {
            Ok(ack) => {
                state.transition(subaccount, client_id, OrderStatus::Cancelled)?;
                info!(%subaccount, client_id, tx_hash = %ack.tx_hash, "order cancelled");
                Ok(ack)
            }
            Err(EndpointError::Timeout) => {
                // No acknowledgment either way; the order stays
                // CancelRequested until reconciled.
                warn!(%subaccount, client_id, "cancel timed out, awaiting reconciliation");
                Err(OrderError::Timeout)
            }
            Err(e) => {
                // Cancel failed; the order is still live on the book.
                state.transition(subaccount, client_id, OrderStatus::Confirmed)?;
                warn!(%subaccount, client_id, error = %e, "cancel rejected");
                Err(to_order_error(e, Some(client_id), Some(order.market_id())))
            }
        }
    }

    /// Cancel several confirmed short-term orders under one freshly
    /// computed validity window.
    ///
    /// Atomicity is endpoint-defined; the outcome reports per-group
    /// results. Local state is not touched before the endpoint
    /// acknowledges, so an order is only marked `Cancelled` if its group
    /// actually went through.
    pub async fn batch_cancel(
        &self,
        subaccount: &Subaccount,
        groups: Vec<BatchCancelGroup>,
    ) -> Result<BatchCancelOutcome, OrderError> {
        let state = self.state(subaccount);
        for group in &groups {
            for &client_id in &group.client_ids {
                let order = state
                    .get(client_id)
                    .ok_or_else(|| OrderError::UnknownOrder {
                        subaccount: subaccount.clone(),
                        client_id,
                    })?;
                if order.flags() != OrderFlags::ShortTerm {
                    return Err(OrderError::InvalidCancelWindow {
                        client_id,
                        reason: "batch cancellation covers short-term orders only".to_string(),
                    });
                }
                if order.status() != OrderStatus::Confirmed {
                    return Err(OrderError::InvalidTransition {
                        client_id,
                        from: order.status(),
                        to: OrderStatus::CancelRequested,
                    });
                }
            }
        }

        let reference = self.latest_height().await?;
        let good_til_block = self
            .window
            .good_til_block(reference, self.venue.short_term_ttl())?;

        let outcome = self
            .endpoint
            .batch_cancel(subaccount, &groups, good_til_block)
            .await
            .map_err(OrderError::from)?;

        for group in &outcome.groups {
            if let Some(reason) = &group.rejected {
                warn!(
                    %subaccount,
                    market_id = %group.market_id,
                    reason = %reason,
                    "batch cancel group rejected, orders remain live"
                );
                continue;
            }
            for &client_id in &group.client_ids {
                state.transition(subaccount, client_id, OrderStatus::CancelRequested)?;
                state.transition(subaccount, client_id, OrderStatus::Cancelled)?;
            }
        }

        info!(
            %subaccount,
            tx_hash = %outcome.tx_hash,
            groups = outcome.groups.len(),
            "batch cancel acknowledged"
        );
        Ok(outcome)
    }

    /// Fold in an acknowledgment that arrived after a caller-side timeout:
    /// a submit-ack confirms the order, a cancel-ack completes the
    /// cancellation.
    pub fn apply_ack(
        &self,
        subaccount: &Subaccount,
        client_id: ClientId,
        tx_hash: TxHash,
    ) -> Result<Order, OrderError> {
        let state = self.state(subaccount);
        let order = state
            .get(client_id)
            .ok_or_else(|| OrderError::UnknownOrder {
                subaccount: subaccount.clone(),
                client_id,
            })?;

        let to = match order.status() {
            OrderStatus::Submitted => OrderStatus::Confirmed,
            OrderStatus::CancelRequested => OrderStatus::Cancelled,
            from => {
                return Err(OrderError::InvalidTransition {
                    client_id,
                    from,
                    to: OrderStatus::Confirmed,
                });
            }
        };
        if to == OrderStatus::Confirmed {
            state.record_tx_hash(client_id, tx_hash);
        }
        let order = state.transition(subaccount, client_id, to)?;
        info!(%subaccount, client_id, status = ?order.status(), "late acknowledgment applied");
        Ok(order)
    }

    /// Settle an order whose caller-side timeout elapsed and for which no
    /// acknowledgment will arrive: a pending submission fails, a pending
    /// cancellation leaves the order live.
    pub fn resolve_timeout(
        &self,
        subaccount: &Subaccount,
        client_id: ClientId,
    ) -> Result<Order, OrderError> {
        let state = self.state(subaccount);
        let order = state
            .get(client_id)
            .ok_or_else(|| OrderError::UnknownOrder {
                subaccount: subaccount.clone(),
                client_id,
            })?;

        let to = match order.status() {
            OrderStatus::Submitted => OrderStatus::Failed,
            OrderStatus::CancelRequested => OrderStatus::Confirmed,
            from => {
                return Err(OrderError::InvalidTransition {
                    client_id,
                    from,
                    to: OrderStatus::Failed,
                });
            }
        };
        let order = state.transition(subaccount, client_id, to)?;
        info!(%subaccount, client_id, status = ?order.status(), "timeout resolved");
        Ok(order)
    }

    /// Expire confirmed short-term orders the chain has moved past and feed
    /// the freshness watermark. Returns the newly expired orders.
    pub fn reconcile_height(&self, observed: BlockHeight) -> Vec<Order> {
        self.window.observe(observed);

        let mut expired = Vec::new();
        for entry in self.subaccounts.iter() {
            let (subaccount, state) = (entry.key(), entry.value());
            for order in state.orders() {
                if order.status() != OrderStatus::Confirmed {
                    continue;
                }
                let GoodTil::Block(good_til_block) = order.good_til() else {
                    continue;
                };
                if observed <= good_til_block {
                    continue;
                }
                match state.transition(subaccount, order.client_id(), OrderStatus::Expired) {
                    Ok(order) => {
                        debug!(
                            %subaccount,
                            client_id = order.client_id(),
                            good_til_block,
                            observed,
                            "order expired"
                        );
                        expired.push(order);
                    }
                    // A concurrent caller moved the order first; skip it.
                    Err(e) => warn!(%subaccount, error = %e, "expiry sweep skipped order"),
                }
            }
        }
        expired
    }

    /// Drop terminal orders of the subaccount, returning how many were
    /// removed. When to call this is the caller's retention policy.
    pub fn prune_terminal(&self, subaccount: &Subaccount) -> usize {
        self.state(subaccount).prune_terminal()
    }

    /// Tracked order by client id.
    pub fn order(&self, subaccount: &Subaccount, client_id: ClientId) -> Option<Order> {
        self.state(subaccount).get(client_id)
    }

    /// All tracked orders of the subaccount, terminal ones included.
    pub fn orders(&self, subaccount: &Subaccount) -> Vec<Order> {
        self.state(subaccount).orders()
    }

    /// Client ids currently claimed by non-terminal orders.
    pub fn in_flight_ids(&self, subaccount: &Subaccount) -> Vec<ClientId> {
        self.state(subaccount)
            .in_flight()
            .iter()
            .map(|id| *id)
            .collect()
    }

    /// Confirmed short-term orders grouped per market, ready to feed into
    /// [`Self::batch_cancel`].
    pub fn short_term_groups(&self, subaccount: &Subaccount) -> Vec<BatchCancelGroup> {
        self.state(subaccount)
            .orders()
            .into_iter()
            .filter(|o| o.status() == OrderStatus::Confirmed && o.flags() == OrderFlags::ShortTerm)
            .map(|o| (o.market_id().to_string(), o.client_id()))
            .into_group_map()
            .into_iter()
            .map(|(market_id, mut client_ids)| {
                client_ids.sort_unstable();
                BatchCancelGroup {
                    market_id,
                    client_ids,
                }
            })
            .sorted_by(|a, b| a.market_id.cmp(&b.market_id))
            .collect()
    }

    /// Deposit collateral from the wallet into the subaccount.
    pub async fn deposit(
        &self,
        subaccount: &Subaccount,
        amount: UD128,
    ) -> Result<TxHash, OrderError> {
        let request = TransferRequest::deposit(
            self.quantizer,
            self.venue.collateral_asset(),
            subaccount,
            amount,
        )?;
        self.submit_transfer(request).await
    }

    /// Withdraw collateral from the subaccount back to its wallet.
    pub async fn withdraw(
        &self,
        subaccount: &Subaccount,
        amount: UD128,
    ) -> Result<TxHash, OrderError> {
        let request = TransferRequest::withdrawal(
            self.quantizer,
            self.venue.collateral_asset(),
            subaccount,
            amount,
        )?;
        self.submit_transfer(request).await
    }

    /// Transfer collateral between two subaccounts.
    pub async fn transfer(
        &self,
        from: &Subaccount,
        to: &Subaccount,
        amount: UD128,
    ) -> Result<TxHash, OrderError> {
        let request = TransferRequest::between_subaccounts(
            self.quantizer,
            self.venue.collateral_asset(),
            from,
            to,
            amount,
        )?;
        self.submit_transfer(request).await
    }

    /// Fetch the venue chain's latest height and feed the freshness
    /// watermark.
    pub async fn latest_height(&self) -> Result<BlockHeight, OrderError> {
        let height = self
            .oracle
            .latest_height()
            .await
            .map_err(OrderError::from)?;
        self.window.observe(height);
        Ok(height)
    }

    async fn submit(
        &self,
        subaccount: &Subaccount,
        state: &SubaccountState,
        request: OrderRequest,
    ) -> Result<Order, OrderError> {
        let client_id = request.client_id();
        state.insert(Order::pending(subaccount.clone(), &request));
        state.transition(subaccount, client_id, OrderStatus::Submitted)?;

        match self.endpoint.submit_order(subaccount, &request).await {
            Ok(ack) => {
                state.record_tx_hash(client_id, ack.tx_hash.clone());
                let order = state.transition(subaccount, client_id, OrderStatus::Confirmed)?;
                info!(
                    %subaccount,
                    client_id,
                    market_id = request.market_id(),
                    tx_hash = %ack.tx_hash,
                    "order confirmed"
                );
                Ok(order)
            }
            Err(EndpointError::Timeout) => {
                // No acknowledgment yet; the order stays Submitted until the
                // caller reconciles it.
                warn!(%subaccount, client_id, "submission timed out, awaiting reconciliation");
                Err(OrderError::Timeout)
            }
            Err(e) => {
                state.transition(subaccount, client_id, OrderStatus::Failed)?;
                warn!(%subaccount, client_id, error = %e, "submission failed");
                Err(to_order_error(e, Some(client_id), Some(request.market_id())))
            }
        }
    }

    async fn submit_transfer(&self, request: TransferRequest) -> Result<TxHash, OrderError> {
        let tx_hash = self
            .endpoint
            .transfer(&request)
            .await
            .map_err(OrderError::from)?;
        info!(
            asset_id = request.asset_id(),
            amount_quantums = request.amount_quantums(),
            %tx_hash,
            "transfer submitted"
        );
        Ok(tx_hash)
    }

    fn state(&self, subaccount: &Subaccount) -> Arc<SubaccountState> {
        self.subaccounts
            .entry(subaccount.clone())
            .or_default()
            .clone()
    }
}

fn to_order_error(
    error: EndpointError,
    client_id: Option<ClientId>,
    market_id: Option<&str>,
) -> OrderError {
    match error {
        EndpointError::Rejected(reason) => OrderError::EndpointRejected {
            client_id,
            market_id: market_id.map(str::to_string),
            reason,
        },
        EndpointError::Timeout => OrderError::Timeout,
        EndpointError::Transport(message) => OrderError::Transport(message),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
