use dashmap::{DashMap, DashSet};

use crate::{
    error::OrderError,
    types::{ClientId, Subaccount},
};

use super::{Order, OrderStatus};

/// Per-subaccount bookkeeping: the in-flight client id set and every
/// tracked order keyed by client id.
///
/// An id enters `in_flight` when the allocator claims it and leaves only
/// when the order referencing it reaches a terminal state, which is what
/// keeps client ids unique for the whole life of an order. Terminal orders
/// stay in `orders` until pruned.
#[derive(Debug, Default)]
pub(crate) struct SubaccountState {
    in_flight: DashSet<ClientId>,
    orders: DashMap<ClientId, Order>,
}

impl SubaccountState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_flight(&self) -> &DashSet<ClientId> {
        &self.in_flight
    }

    pub(crate) fn insert(&self, order: Order) {
        self.orders.insert(order.client_id(), order);
    }

    pub(crate) fn get(&self, client_id: ClientId) -> Option<Order> {
        self.orders.get(&client_id).map(|o| o.value().clone())
    }

    pub(crate) fn orders(&self) -> Vec<Order> {
        self.orders.iter().map(|o| o.value().clone()).collect()
    }

    /// Apply a state transition and release the client id if the new state
    /// is terminal. Returns a snapshot of the updated order.
    pub(crate) fn transition(
        &self,
        subaccount: &Subaccount,
        client_id: ClientId,
        to: OrderStatus,
    ) -> Result<Order, OrderError> {
        let snapshot = {
            let mut entry =
                self.orders
                    .get_mut(&client_id)
                    .ok_or_else(|| OrderError::UnknownOrder {
                        subaccount: subaccount.clone(),
                        client_id,
                    })?;
            entry.transition(to)?;
            entry.value().clone()
        };
        if to.is_terminal() {
            self.in_flight.remove(&client_id);
        }
        Ok(snapshot)
    }

    pub(crate) fn record_tx_hash(&self, client_id: ClientId, tx_hash: String) {
        if let Some(mut entry) = self.orders.get_mut(&client_id) {
            entry.record_tx_hash(tx_hash);
        }
    }

    /// Drop terminal orders, returning how many were removed. Their ids
    /// were already released at the terminal transition.
    pub(crate) fn prune_terminal(&self) -> usize {
        let before = self.orders.len();
        self.orders.retain(|_, order| !order.is_terminal());
        before - self.orders.len()
    }
}
