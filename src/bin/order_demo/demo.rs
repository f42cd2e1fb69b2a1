//! The demo walkthrough: every lifecycle operation, end to end.
//!
//! Runs against the crate's in-process [`MockVenue`] so the whole flow
//! (deposit, concurrent short-term placements, a long-term resting order,
//! single and batch cancellation, expiry reconciliation, pruning,
//! withdrawal) can be observed without touching a live venue.

use std::{pin::pin, time::Duration};

use futures::StreamExt;
use order_sdk::{
    Venue,
    alloc::IdAllocator,
    lifecycle::LifecycleManager,
    stream,
    testing::MockVenue,
    types::Subaccount,
};
use tracing::info;

use crate::{config::DemoConfig, error::Result};

const INITIAL_HEIGHT: u64 = 1000;
const HEIGHT_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub async fn run(subaccount: Subaccount, config: DemoConfig) -> Result<()> {
    let venue = MockVenue::new(INITIAL_HEIGHT);
    let allocator = match config.seed {
        Some(seed) => IdAllocator::seeded(seed),
        None => IdAllocator::from_entropy(),
    };
    let manager = LifecycleManager::with_allocator(Venue::testnet(), &venue, &venue, allocator);

    // Fund the subaccount.
    let tx_hash = manager.deposit(&subaccount, config.deposit).await?;
    info!(%tx_hash, amount = %config.deposit, "deposited collateral");

    // A handful of short-term orders, placed concurrently.
    let placements = futures::future::try_join_all((0..config.count).map(|_| {
        manager.place_short_term(
            &subaccount,
            &config.market,
            config.side,
            config.price,
            config.size,
            config.post_only,
            false,
        )
    }))
    .await?;
    for order in &placements {
        info!(
            client_id = order.client_id(),
            good_til = ?order.good_til(),
            "short-term order confirmed"
        );
    }

    // Cancel the first one under its own validity window.
    let first = &placements[0];
    let ack = manager
        .cancel(&subaccount, first.client_id(), first.good_til())
        .await?;
    info!(client_id = first.client_id(), tx_hash = %ack.tx_hash, "order cancelled");

    // Batch-cancel everything still resting short-term.
    let groups = manager.short_term_groups(&subaccount);
    if !groups.is_empty() {
        let outcome = manager.batch_cancel(&subaccount, groups).await?;
        info!(
            tx_hash = %outcome.tx_hash,
            groups = outcome.groups.len(),
            "batch cancel acknowledged"
        );
    }

    // A long-term order rests until its wall-clock deadline; leave it on
    // the book.
    let resting = manager
        .place_long_term(
            &subaccount,
            &config.market,
            config.side,
            config.price,
            config.size,
            config.time_in_force,
            config.post_only,
            false,
        )
        .await?;
    info!(
        client_id = resting.client_id(),
        good_til = ?resting.good_til(),
        "long-term order resting"
    );

    // One more short-term order, left to expire: advance the chain past its
    // window and fold the observed height back into the tracked state.
    let expiring = manager
        .place_short_term(
            &subaccount,
            &config.market,
            config.side,
            config.price,
            config.size,
            config.post_only,
            false,
        )
        .await?;
    venue.advance_height(manager.venue().short_term_ttl() + 1);

    let mut heights = pin!(stream::heights(
        &venue,
        INITIAL_HEIGHT,
        HEIGHT_POLL_INTERVAL,
        tokio::time::sleep,
    ));
    if let Some(height) = heights.next().await {
        let height = height?;
        let expired = manager.reconcile_height(height);
        info!(height, expired = expired.len(), "reconciled observed height");
        for order in &expired {
            info!(
                client_id = order.client_id(),
                good_til = ?order.good_til(),
                "order expired"
            );
        }
    }
    debug_assert!(
        manager
            .order(&subaccount, expiring.client_id())
            .is_some_and(|o| o.is_terminal())
    );

    let pruned = manager.prune_terminal(&subaccount);
    info!(pruned, "pruned terminal orders");

    // Draw the collateral back out.
    let tx_hash = manager.withdraw(&subaccount, config.deposit).await?;
    info!(%tx_hash, "withdrew collateral");

    Ok(())
}
