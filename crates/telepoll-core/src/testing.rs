//! Shared fakes for unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::UpdateId,
    errors::Error,
    ports::{OffsetStore, Transport},
    transport::{Endpoint, Params},
    Result,
};

pub(crate) const EMPTY_UPDATES: &str = r#"{"ok":true,"result":[]}"#;

/// Transport that replays queued bodies and records every request.
///
/// Once the queue is drained it answers with an empty update list.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<(Endpoint, Params)>>,
}

impl FakeTransport {
    pub(crate) fn push_body(&self, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
    }

    pub(crate) fn push_updates(&self, ids: &[i64]) {
        self.push_body(updates_body(ids));
    }

    pub(crate) fn push_failure(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::transport(
                Endpoint::GetUpdates.as_str(),
                "connection reset by peer",
            )));
    }

    pub(crate) fn requests(&self) -> Vec<(Endpoint, Params)> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> (Endpoint, Params) {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, endpoint: Endpoint, params: &Params) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint, params.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(EMPTY_UPDATES.to_string()))
    }
}

/// `getUpdates` body with one text message per id.
pub(crate) fn updates_body(ids: &[i64]) -> String {
    let result: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "update_id": id,
                "message": {
                    "message_id": id,
                    "from": {"id": 123456, "first_name": "foo", "last_name": "bar", "username": "foo_bar"},
                    "chat": {"id": 123456, "first_name": "foo", "last_name": "bar", "username": "foo_bar"},
                    "date": 1435771984,
                    "text": format!("message {id}")
                }
            })
        })
        .collect();
    serde_json::json!({"ok": true, "result": result}).to_string()
}

#[derive(Default)]
pub(crate) struct RecordingStore {
    pub(crate) initial: Option<UpdateId>,
    pub(crate) saved: Mutex<Vec<UpdateId>>,
    pub(crate) failing_saves: AtomicUsize,
}

impl RecordingStore {
    /// Make the next `n` saves fail with an i/o error.
    pub(crate) fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }

    pub(crate) fn saved(&self) -> Vec<UpdateId> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl OffsetStore for RecordingStore {
    async fn load(&self) -> Result<Option<UpdateId>> {
        Ok(self.initial)
    }

    async fn save(&self, offset: UpdateId) -> Result<()> {
        if self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.saved.lock().unwrap().push(offset);
        Ok(())
    }
}
