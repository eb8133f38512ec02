use async_trait::async_trait;

use crate::{
    domain::UpdateId,
    transport::{Endpoint, Params},
    types::UpdateBatch,
    Result,
};

/// Hexagonal port for talking to the bot API.
///
/// Implementations perform one GET per call and hand back the raw body. They
/// must percent-encode every parameter value and map network failures and
/// non-2xx statuses into `Error::Transport`. Decoding is shared and lives in
/// [`crate::transport::fetch`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, endpoint: Endpoint, params: &Params) -> Result<String>;
}

/// Load/save hook for the cursor's confirmed offset.
///
/// Whether and where to persist is a deployment choice; the cursor only calls
/// through this trait when asked to.
#[async_trait]
pub trait OffsetStore: Send + Sync {
    async fn load(&self) -> Result<Option<UpdateId>>;
    async fn save(&self, offset: UpdateId) -> Result<()>;
}

/// Consumer of polled batches, driven by [`crate::polling::run_polling`].
///
/// Returning an error leaves the batch unconfirmed so it is delivered again.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, batch: &UpdateBatch) -> Result<()>;
}
