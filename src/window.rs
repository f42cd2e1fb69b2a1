use std::sync::atomic::{AtomicU64, Ordering};

use crate::{error::OrderError, types::BlockHeight};

/// Computes validity windows for short-term orders and guards against stale
/// reference heights.
///
/// A stale reference silently shortens the effective validity window and
/// gets orders rejected at the endpoint as already expired, so the tracker
/// keeps a watermark of the freshest height it has seen and refuses
/// references lagging more than `max_age` blocks behind it. Reference
/// heights must be fetched from the oracle immediately before use, never
/// cached across calls.
#[derive(Debug)]
pub struct WindowTracker {
    max_age: u64,
    highest_seen: AtomicU64,
}

impl WindowTracker {
    pub fn new(max_age: u64) -> Self {
        Self {
            max_age,
            highest_seen: AtomicU64::new(0),
        }
    }

    /// Fold an observed chain height into the freshness watermark.
    pub fn observe(&self, height: BlockHeight) {
        self.highest_seen.fetch_max(height, Ordering::AcqRel);
    }

    /// Freshest height observed so far.
    pub fn highest_observed(&self) -> BlockHeight {
        self.highest_seen.load(Ordering::Acquire)
    }

    /// Compute `reference + ttl`, the block past which a short-term order
    /// expires.
    ///
    /// `ttl = 0` yields a window equal to the reference height, an
    /// immediately expirable order; allowed, not an error. Fails with
    /// [`OrderError::StaleReference`] if the reference lags the watermark
    /// by more than the configured maximum age.
    pub fn good_til_block(
        &self,
        reference: BlockHeight,
        ttl: u64,
    ) -> Result<BlockHeight, OrderError> {
        let observed = self.highest_seen.fetch_max(reference, Ordering::AcqRel);
        if reference.saturating_add(self.max_age) < observed {
            return Err(OrderError::StaleReference {
                supplied: reference,
                observed,
            });
        }
        Ok(reference.saturating_add(ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_til_block_is_reference_plus_ttl() {
        let tracker = WindowTracker::new(20);
        assert_eq!(tracker.good_til_block(100, 10).unwrap(), 110);
        assert_eq!(tracker.good_til_block(100, 1).unwrap(), 101);
    }

    #[test]
    fn test_zero_ttl_allowed() {
        let tracker = WindowTracker::new(20);
        assert_eq!(tracker.good_til_block(100, 0).unwrap(), 100);
    }

    #[test]
    fn test_stale_reference_rejected() {
        let tracker = WindowTracker::new(20);
        tracker.observe(100);

        // Within the allowed age.
        assert!(tracker.good_til_block(80, 10).is_ok());

        // One block too old.
        assert!(matches!(
            tracker.good_til_block(79, 10),
            Err(OrderError::StaleReference {
                supplied: 79,
                observed: 100,
            })
        ));
    }

    #[test]
    fn test_watermark_only_moves_forward() {
        let tracker = WindowTracker::new(5);
        tracker.observe(50);
        tracker.observe(30);
        assert_eq!(tracker.highest_observed(), 50);

        // A fresh reference raises the watermark as a side effect.
        tracker.good_til_block(60, 10).unwrap();
        assert_eq!(tracker.highest_observed(), 60);
    }
}
