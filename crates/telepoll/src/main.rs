use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use telepoll_core::{
    config::Config,
    offset_store::{FileOffsetStore, MemoryOffsetStore},
    polling::{run_polling, PollingOptions},
    ports::{OffsetStore, Transport, UpdateHandler},
    types::UpdateBatch,
    BotApi, SendMessage, UpdateCursor,
};
use telepoll_http::HttpTransport;

/// Logs every incoming message and optionally echoes text back to its chat.
struct ConsoleHandler {
    api: BotApi,
    echo: bool,
}

#[async_trait]
impl UpdateHandler for ConsoleHandler {
    async fn handle(&self, batch: &UpdateBatch) -> telepoll_core::Result<()> {
        for update in batch {
            let Some(msg) = &update.message else {
                info!(update_id = %update.update_id, "skipping non-message update");
                continue;
            };

            let sender = msg
                .from
                .as_ref()
                .map(|u| u.username.clone().unwrap_or_else(|| u.first_name.clone()))
                .unwrap_or_else(|| "unknown".to_string());
            let sent_at = msg
                .sent_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            info!(
                update_id = %update.update_id,
                chat_id = msg.chat.id.0,
                from = %sender,
                sent_at = %sent_at,
                text = msg.text.as_deref().unwrap_or(""),
                "message"
            );

            // A rejected reply must not hold back the rest of the batch.
            if let (true, Some(text)) = (self.echo, msg.text.as_deref()) {
                if let Err(e) = self
                    .api
                    .send(SendMessage::new(msg.chat.id, text).reply_to(msg.message_id))
                    .await
                {
                    warn!(
                        update_id = %update.update_id,
                        chat_id = msg.chat.id.0,
                        error = %e,
                        "echo failed"
                    );
                }
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telepoll_core::logging::init("telepoll")?;

    let cfg = Config::load()?;
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&cfg));
    let api = BotApi::new(transport.clone());

    let me = api.get_me().await.context("bot identity check failed")?;
    info!(username = %me.username, id = me.id.0, api = %cfg.api_url, "telepoll started");

    let store: Box<dyn OffsetStore> = match &cfg.offset_file {
        Some(path) => Box::new(FileOffsetStore::new(path)),
        None => {
            warn!("TELEPOLL_OFFSET_FILE not set; offset is kept in memory only");
            Box::new(MemoryOffsetStore::default())
        }
    };

    let mut cursor = UpdateCursor::restore(transport, store.as_ref())
        .await
        .context("failed to load saved offset")?;
    if let Some(limit) = cfg.batch_limit {
        cursor = cursor.with_limit(limit);
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                cancel.cancel();
            }
        });
    }

    let handler = ConsoleHandler {
        api,
        echo: cfg.echo,
    };
    run_polling(
        &mut cursor,
        store.as_ref(),
        &handler,
        PollingOptions {
            interval: cfg.poll_interval,
        },
        cancel,
    )
    .await;

    Ok(())
}
