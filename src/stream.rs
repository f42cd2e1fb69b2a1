use std::time::Duration;

use futures::{Stream, stream};

use crate::{endpoint::HeightOracle, error::OrderError, types::BlockHeight};

/// Returns a stream of strictly increasing chain heights observed via the
/// given [`HeightOracle`], starting past `from`.
///
/// Polls the oracle with the given interval and yields a height whenever it
/// moves past the last one seen. Feed the yielded heights into
/// [`crate::lifecycle::LifecycleManager::reconcile_height`] to expire
/// short-term orders the chain has moved past.
///
/// Oracle errors are yielded inline and polling continues from the same
/// height, so a flaky oracle does not terminate the stream.
pub fn heights<O, S, SFut>(
    oracle: &O,
    from: BlockHeight,
    poll_interval: Duration,
    sleep: S,
) -> impl Stream<Item = Result<BlockHeight, OrderError>>
where
    O: HeightOracle,
    S: Fn(Duration) -> SFut + Copy,
    SFut: Future<Output = ()>,
{
    stream::unfold(from, move |last| async move {
        loop {
            match oracle.latest_height().await {
                Ok(height) if height > last => return Some((Ok(height), height)),
                Ok(_) => sleep(poll_interval).await,
                Err(e) => return Some((Err(OrderError::from(e)), last)),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use futures::StreamExt;

    use crate::testing::MockVenue;

    use super::*;

    #[tokio::test]
    async fn test_heights_yields_only_advances() {
        let venue = MockVenue::new(100);
        let mut stream = pin!(heights(
            &venue,
            100,
            Duration::from_millis(1),
            tokio::time::sleep,
        ));

        venue.set_height(101);
        assert_eq!(stream.next().await.unwrap().unwrap(), 101);

        // Jumps are delivered as-is, not block by block.
        venue.set_height(110);
        assert_eq!(stream.next().await.unwrap().unwrap(), 110);
    }
}
