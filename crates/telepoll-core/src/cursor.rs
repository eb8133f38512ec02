//! Poll/confirm protocol over the server-side update queue.
//!
//! The server returns only updates whose id is strictly greater than the
//! `offset` sent with the request, and treats every update at or below that
//! offset as delivered. A request without an offset returns the whole
//! unacknowledged backlog. The cursor therefore tracks two ids:
//!
//! - `last_seen_id`: highest id observed by `poll`, not yet acknowledged
//! - `confirmed_offset`: highest id the caller has acknowledged via `confirm`
//!
//! and only ever sends `confirmed_offset + 1`, so nothing newer than the last
//! acknowledgement is skipped and nothing acknowledged comes back.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    domain::UpdateId,
    errors::Error,
    ports::{OffsetStore, Transport},
    transport::{self, Endpoint, Params},
    types::{Update, UpdateBatch},
    Result,
};

/// Server-side cap on `limit` for `getUpdates`.
pub const MAX_BATCH_LIMIT: u32 = 100;

/// Position of a cursor in the update queue.
///
/// `confirmed_offset <= last_seen_id` holds at all times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorState {
    confirmed_offset: UpdateId,
    last_seen_id: UpdateId,
}

impl CursorState {
    pub fn confirmed_offset(&self) -> UpdateId {
        self.confirmed_offset
    }

    pub fn last_seen_id(&self) -> UpdateId {
        self.last_seen_id
    }
}

/// Caller-owned cursor.
///
/// All mutation goes through `&mut self`. To share one cursor between tasks,
/// wrap it in a mutex; there is no internal locking.
pub struct UpdateCursor {
    transport: Arc<dyn Transport>,
    state: CursorState,
    /// Last offset an `OffsetStore` accepted; lags `confirmed_offset` after a failed save.
    persisted_offset: UpdateId,
    limit: Option<u32>,
}

impl UpdateCursor {
    /// Fresh cursor: the first poll returns the full backlog.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: CursorState::default(),
            persisted_offset: UpdateId::ZERO,
            limit: None,
        }
    }

    /// Cursor positioned after a previously confirmed offset.
    pub fn resume_from(transport: Arc<dyn Transport>, confirmed_offset: UpdateId) -> Self {
        Self {
            transport,
            state: CursorState {
                confirmed_offset,
                last_seen_id: confirmed_offset,
            },
            persisted_offset: confirmed_offset,
            limit: None,
        }
    }

    /// Cursor positioned from whatever `store` has recorded (fresh if nothing).
    pub async fn restore(transport: Arc<dyn Transport>, store: &dyn OffsetStore) -> Result<Self> {
        match store.load().await? {
            Some(offset) => {
                info!(offset = %offset, "resuming update cursor");
                Ok(Self::resume_from(transport, offset))
            }
            None => Ok(Self::new(transport)),
        }
    }

    /// Cap batch size; clamped to `1..=MAX_BATCH_LIMIT`.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.clamp(1, MAX_BATCH_LIMIT));
        self
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn confirmed_offset(&self) -> UpdateId {
        self.state.confirmed_offset
    }

    pub fn last_seen_id(&self) -> UpdateId {
        self.state.last_seen_id
    }

    fn poll_params(&self) -> Params {
        let mut params = Params::new();
        if !self.state.confirmed_offset.is_zero() {
            params.insert("offset", self.state.confirmed_offset.next().to_string());
        }
        if let Some(limit) = self.limit {
            params.insert("limit", limit.to_string());
        }
        params
    }

    /// Fetch the next batch.
    ///
    /// Records the batch's highest id as `last_seen_id` but does not
    /// acknowledge anything. On error the state is left as it was.
    pub async fn poll(&mut self) -> Result<UpdateBatch> {
        let params = self.poll_params();
        let batch: UpdateBatch =
            transport::call(self.transport.as_ref(), Endpoint::GetUpdates, &params).await?;

        if let Some(max_id) = batch.max_id() {
            self.state.last_seen_id = self.state.last_seen_id.max(max_id);
        }

        debug!(
            offset = params.get("offset").map(String::as_str).unwrap_or("none"),
            count = batch.len(),
            last_seen = %self.state.last_seen_id,
            "polled updates"
        );
        Ok(batch)
    }

    /// Acknowledge everything seen so far. Returns whether the offset moved.
    pub fn confirm(&mut self) -> bool {
        if self.state.confirmed_offset == self.state.last_seen_id {
            return false;
        }
        self.state.confirmed_offset = self.state.last_seen_id;
        debug!(offset = %self.state.confirmed_offset, "confirmed updates");
        true
    }

    /// [`confirm`](Self::confirm), then [`persist`](Self::persist).
    pub async fn confirm_and_save(&mut self, store: &dyn OffsetStore) -> Result<()> {
        self.confirm();
        self.persist(store).await
    }

    /// Save `confirmed_offset` if `store` has not accepted it yet.
    ///
    /// A failed save is attempted again on the next call, even when nothing
    /// new was confirmed in between.
    pub async fn persist(&mut self, store: &dyn OffsetStore) -> Result<()> {
        let offset = self.state.confirmed_offset;
        if offset == self.persisted_offset {
            return Ok(());
        }
        store.save(offset).await?;
        self.persisted_offset = offset;
        Ok(())
    }

    /// Poll and return the newest update of the batch.
    pub async fn most_recent_update(&mut self) -> Result<Update> {
        self.poll().await?.into_latest().ok_or(Error::EmptyBatch)
    }

    /// Poll and look for `id` in the returned batch only.
    ///
    /// Confirmed updates are gone from the server, so this is not a history lookup.
    pub async fn find_update(&mut self, id: UpdateId) -> Result<Update> {
        self.poll()
            .await?
            .into_found(id)
            .ok_or(Error::NotFound(id))
    }
}
