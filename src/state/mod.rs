//! Tracked order state.
//!
//! Every placement attempt is recorded as an [`Order`] owned by the
//! lifecycle manager and driven through the [`OrderStatus`] state machine
//! by endpoint acknowledgments, cancellations, and observed expiry. Orders
//! are never deleted on transition, only marked terminal; the caller prunes
//! terminal records at its own cadence.

mod order;
mod subaccount;

pub use order::*;
pub(crate) use subaccount::SubaccountState;
