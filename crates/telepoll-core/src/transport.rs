//! Request vocabulary and response decoding shared by every [`Transport`].

use std::{collections::BTreeMap, fmt};

use serde::{de::DeserializeOwned, Deserialize};

use crate::{errors::Error, ports::Transport, Result};

/// Query parameters for a single call. Values are raw; the transport encodes them.
pub type Params = BTreeMap<&'static str, String>;

/// Bot API methods this client issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GetUpdates,
    GetMe,
    SendMessage,
    GetUserProfilePhotos,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::GetUpdates => "getUpdates",
            Endpoint::GetMe => "getMe",
            Endpoint::SendMessage => "sendMessage",
            Endpoint::GetUserProfilePhotos => "getUserProfilePhotos",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level response shape shared by all methods.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode a response body. Malformed JSON or a mismatched shape is an
    /// `Error::Decode`, never a zero-valued envelope.
    pub fn decode(endpoint: Endpoint, body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|source| Error::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

impl<T> Envelope<T> {
    pub fn into_result(self, endpoint: Endpoint) -> Result<T> {
        if !self.ok {
            return Err(Error::Api {
                endpoint: endpoint.to_string(),
                error_code: self.error_code,
                description: self
                    .description
                    .unwrap_or_else(|| "request was not successful".to_string()),
            });
        }
        self.result.ok_or_else(|| Error::MissingResult {
            endpoint: endpoint.to_string(),
        })
    }
}

/// Issue one request and decode its envelope.
pub async fn fetch<T, X>(transport: &X, endpoint: Endpoint, params: &Params) -> Result<Envelope<T>>
where
    T: DeserializeOwned,
    X: Transport + ?Sized,
{
    let body = transport.get(endpoint, params).await?;
    Envelope::decode(endpoint, &body)
}

/// [`fetch`] followed by [`Envelope::into_result`].
pub async fn call<T, X>(transport: &X, endpoint: Endpoint, params: &Params) -> Result<T>
where
    T: DeserializeOwned,
    X: Transport + ?Sized,
{
    fetch(transport, endpoint, params)
        .await?
        .into_result(endpoint)
}
