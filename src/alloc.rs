use std::sync::Mutex;

use dashmap::DashSet;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::{
    error::OrderError,
    types::{ClientId, Subaccount},
};

/// Default number of samples drawn before a collision streak is reported as
/// exhaustion instead of looping forever.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Allocates client-assigned order ids from the full `u32` range.
///
/// An id is claimed by inserting it into the subaccount's in-flight set, so
/// allocation and the claim are a single atomic step: no concurrent reader
/// of the set can observe an allocated id as still available. Uniqueness is
/// scoped per subaccount, not globally.
///
/// The random source is injected; [`IdAllocator::seeded`] gives
/// deterministic sequences for tests.
#[derive(Debug)]
pub struct IdAllocator<R = StdRng> {
    rng: Mutex<R>,
    max_attempts: u32,
}

impl IdAllocator<StdRng> {
    /// Allocator over an entropy-seeded random source.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Allocator over a deterministically seeded random source.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> IdAllocator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Draw an id not currently held by any in-flight order of the
    /// subaccount and claim it.
    ///
    /// Resamples on collision up to the configured number of attempts, then
    /// fails with [`OrderError::AllocatorExhausted`]. Does not block beyond
    /// the internal lock on the random source.
    pub fn allocate(
        &self,
        subaccount: &Subaccount,
        in_flight: &DashSet<ClientId>,
    ) -> Result<ClientId, OrderError> {
        let mut rng = self.rng.lock().expect("IdAllocator: rng mutex poisoned");
        for _ in 0..self.max_attempts {
            let candidate = rng.next_u32();
            if in_flight.insert(candidate) {
                return Ok(candidate);
            }
        }
        Err(OrderError::AllocatorExhausted {
            subaccount: subaccount.clone(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;

    fn subaccount() -> Subaccount {
        Subaccount::new("wallet1", 0)
    }

    #[test]
    fn test_allocated_ids_are_distinct_until_release() {
        let allocator = IdAllocator::seeded(42);
        let in_flight = DashSet::new();

        let ids: Vec<ClientId> = (0..256)
            .map(|_| allocator.allocate(&subaccount(), &in_flight).unwrap())
            .collect();

        // Claimed set holds every id exactly once.
        assert_eq!(in_flight.len(), ids.len());
        for id in &ids {
            assert!(in_flight.contains(id));
        }
    }

    #[test]
    fn test_collision_streak_reports_exhaustion() {
        // Constant source: every draw collides with the first.
        let allocator = IdAllocator::new(StepRng::new(7, 0)).with_max_attempts(4);
        let in_flight = DashSet::new();

        allocator.allocate(&subaccount(), &in_flight).unwrap();
        assert!(matches!(
            allocator.allocate(&subaccount(), &in_flight),
            Err(OrderError::AllocatorExhausted { attempts: 4, .. })
        ));
    }

    #[test]
    fn test_released_id_is_reusable() {
        let allocator = IdAllocator::new(StepRng::new(7, 0));
        let in_flight = DashSet::new();

        let id = allocator.allocate(&subaccount(), &in_flight).unwrap();
        in_flight.remove(&id);

        assert_eq!(allocator.allocate(&subaccount(), &in_flight).unwrap(), id);
    }

    #[test]
    fn test_deterministic_seed_reproduces_sequence() {
        let first: Vec<ClientId> = {
            let allocator = IdAllocator::seeded(7);
            let in_flight = DashSet::new();
            (0..8)
                .map(|_| allocator.allocate(&subaccount(), &in_flight).unwrap())
                .collect()
        };
        let second: Vec<ClientId> = {
            let allocator = IdAllocator::seeded(7);
            let in_flight = DashSet::new();
            (0..8)
                .map(|_| allocator.allocate(&subaccount(), &in_flight).unwrap())
                .collect()
        };
        assert_eq!(first, second);
    }
}
