//! Fixed-interval polling loop for hosts that just want batches handed to them.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    cursor::UpdateCursor,
    ports::{OffsetStore, UpdateHandler},
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct PollingOptions {
    /// Pause between the end of one poll and the start of the next.
    pub interval: Duration,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// One poll → handle → confirm → save cycle. Returns the number of updates handled.
///
/// If the handler fails, nothing is confirmed and the same updates come back
/// on the next poll. An empty batch still retries a save that failed earlier.
pub async fn poll_once(
    cursor: &mut UpdateCursor,
    store: &dyn OffsetStore,
    handler: &dyn UpdateHandler,
) -> Result<usize> {
    let batch = cursor.poll().await?;
    if batch.is_empty() {
        cursor.persist(store).await?;
        return Ok(0);
    }
    handler.handle(&batch).await?;
    cursor.confirm_and_save(store).await?;
    Ok(batch.len())
}

/// Poll until `cancel` fires. Returns the total number of updates handled.
///
/// Failed ticks are logged and the loop carries on at the next interval; a
/// poll already in flight finishes before the loop observes cancellation.
pub async fn run_polling(
    cursor: &mut UpdateCursor,
    store: &dyn OffsetStore,
    handler: &dyn UpdateHandler,
    opts: PollingOptions,
    cancel: CancellationToken,
) -> u64 {
    let mut handled = 0u64;
    info!(
        offset = %cursor.confirmed_offset(),
        interval_ms = opts.interval.as_millis() as u64,
        "polling started"
    );

    while !cancel.is_cancelled() {
        match poll_once(cursor, store, handler).await {
            Ok(n) => handled += n as u64,
            Err(e) => warn!(error = %e, "poll tick failed"),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(opts.interval) => {}
        }
    }

    info!(handled, offset = %cursor.confirmed_offset(), "polling stopped");
    handled
}
