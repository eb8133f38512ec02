//! HTTP transport (reqwest).
//!
//! Implements the `telepoll-core` Transport port over plain GET requests to the
//! bot API. No retries; timeouts are the reqwest client defaults.

use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use telepoll_core::{
    config::{Config, DEFAULT_API_URL},
    errors::Error,
    ports::Transport,
    transport::{Endpoint, Params},
    Result,
};

/// Non-2xx response, carried as the cause of `Error::Transport`.
#[derive(Debug, thiserror::Error)]
#[error("http status {status}: {body}")]
pub struct StatusError {
    pub status: u16,
    pub body: String,
}

#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut t = Self {
            base_url: String::new(),
            token: token.into(),
            http: reqwest::Client::new(),
        };
        t.set_base_url(base_url);
        t
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::with_base_url(cfg.bot_token.clone(), cfg.api_url.clone())
    }

    /// Point subsequent requests at another host (e.g. a local test server).
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn method_url(&self, endpoint: Endpoint) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, endpoint)
    }

    fn map_err(endpoint: Endpoint, e: reqwest::Error) -> Error {
        // The URL embeds the token; keep it out of error messages.
        Error::transport(endpoint.as_str(), e.without_url())
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, endpoint: Endpoint, params: &Params) -> Result<String> {
        debug!(%endpoint, params = ?params.keys().collect::<Vec<_>>(), "bot api request");

        let resp = self
            .http
            .get(self.method_url(endpoint))
            .query(params)
            .send()
            .await
            .map_err(|e| Self::map_err(endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::transport(
                endpoint.as_str(),
                StatusError {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                },
            ));
        }

        resp.text().await.map_err(|e| Self::map_err(endpoint, e))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use telepoll_core::{
        domain::{ChatId, MessageId, UpdateId, UserId},
        types::{Chat, Message, Update, User},
        BotApi, UpdateCursor,
    };
    use wiremock::{
        matchers::{method, path, query_param, query_param_is_missing},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    const TOKEN: &str = "123:test-token";

    const TWO_UPDATES: &str = r#"{
        "ok":true,
        "result":[
            {
                "update_id":805750848,
                "message": {
                    "message_id":2,"from":{
                        "id":123456,
                        "first_name":"foo",
                        "last_name":"bar",
                        "username":"foo_bar"
                    },
                    "chat":{
                        "id":123456,
                        "first_name":"foo",
                        "last_name":"bar",
                        "username":"foo_bar"
                    },
                    "date":1435771984,
                    "text":"testing the messages"
                }
            }, {
                "update_id":805750849,
                "message":{
                    "message_id":3,
                    "from":{
                        "id":123456,
                        "first_name":"foo",
                        "last_name":"bar",
                        "username":"foo_bar"
                    },
                    "chat":{
                        "id":123456,
                        "first_name":"foo",
                        "last_name":"bar",
                        "username":"foo_bar"
                    },
                    "date":1435771995,
                    "text":"\/start"
                }
            }
        ]
    }"#;

    fn transport(server: &MockServer) -> Arc<HttpTransport> {
        Arc::new(HttpTransport::with_base_url(TOKEN, server.uri()))
    }

    fn route(name: &str) -> String {
        format!("/bot{TOKEN}/{name}")
    }

    fn foo_user() -> User {
        User {
            id: UserId(123456),
            first_name: "foo".into(),
            last_name: Some("bar".into()),
            username: Some("foo_bar".into()),
        }
    }

    fn foo_chat() -> Chat {
        Chat {
            id: ChatId(123456),
            first_name: Some("foo".into()),
            last_name: Some("bar".into()),
            username: Some("foo_bar".into()),
            title: None,
        }
    }

    fn text_update(id: i64, message_id: i64, date: i64, text: &str) -> Update {
        Update {
            update_id: UpdateId(id),
            message: Some(Message {
                message_id: MessageId(message_id),
                from: Some(foo_user()),
                date,
                chat: foo_chat(),
                text: Some(text.into()),
                photo: Vec::new(),
                audio: None,
                document: None,
                sticker: None,
                video: None,
                contact: None,
                location: None,
                caption: None,
            }),
        }
    }

    #[tokio::test]
    async fn poll_confirm_poll_against_http_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route("getUpdates")))
            .and(query_param_is_missing("offset"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_UPDATES))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(route("getUpdates")))
            .and(query_param("offset", "805750850"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true,"result":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let mut cursor = UpdateCursor::new(transport(&server));

        let batch = cursor.poll().await.unwrap();
        assert_eq!(
            batch.into_vec(),
            vec![
                text_update(805750848, 2, 1435771984, "testing the messages"),
                text_update(805750849, 3, 1435771995, "/start"),
            ]
        );
        assert_eq!(cursor.last_seen_id(), UpdateId(805750849));

        cursor.confirm();
        assert_eq!(cursor.confirmed_offset(), UpdateId(805750849));

        let next = cursor.poll().await.unwrap();
        assert!(next.is_empty());
        assert_eq!(cursor.last_seen_id(), UpdateId(805750849));
    }

    #[tokio::test]
    async fn send_message_percent_encodes_text() {
        let server = MockServer::start().await;
        let text = "fish & chips #1 ü?=";
        Mock::given(method("GET"))
            .and(path(route("sendMessage")))
            .and(query_param("chat_id", "123456"))
            .and(query_param("text", text))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ok":true,"result":{"message_id":231,"from":{"id":987654321,"first_name":"Foo","username":"FooBot"},"chat":{"id":123456,"first_name":"foo","last_name":"bar","username":"foo_bar"},"date":1435836484,"text":"test"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let api = BotApi::new(transport(&server));
        let msg = api.send_message(ChatId(123456), text).await.unwrap();
        assert_eq!(msg.message_id, MessageId(231));
        assert_eq!(msg.from.unwrap().username.as_deref(), Some("FooBot"));

        let received = server.received_requests().await.unwrap();
        let raw_query = received[0].url.query().unwrap_or_default().to_string();
        assert!(!raw_query.contains(' '));
        assert!(!raw_query.contains('#'));
        assert!(!raw_query.contains("& "));
    }

    #[tokio::test]
    async fn get_me_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route("getMe")))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ok":true,"result":{"id":987654321,"first_name":"Foo","username":"FooBot"}}"#,
            ))
            .mount(&server)
            .await;

        let me = BotApi::new(transport(&server)).get_me().await.unwrap();
        assert_eq!(me.id, UserId(987654321));
        assert_eq!(me.username, "FooBot");
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route("getUpdates")))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let mut cursor = UpdateCursor::new(transport(&server));
        let err = cursor.poll().await.unwrap_err();
        match &err {
            Error::Transport { endpoint, source } => {
                assert_eq!(endpoint, "getUpdates");
                let status = source.downcast_ref::<StatusError>().unwrap();
                assert_eq!(status.status, 502);
                assert_eq!(status.body, "bad gateway");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!err.to_string().contains(TOKEN));
        assert_eq!(cursor.last_seen_id(), UpdateId::ZERO);
    }

    #[tokio::test]
    async fn malformed_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(route("getUpdates")))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\n\t\"ok\":false,\n}"))
            .mount(&server)
            .await;

        let mut cursor = UpdateCursor::new(transport(&server));
        assert!(matches!(cursor.poll().await, Err(Error::Decode { .. })));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error_without_token() {
        // Nothing listens on port 9 (discard) in test environments.
        let t = HttpTransport::with_base_url(TOKEN, "http://127.0.0.1:9");
        let err = t.get(Endpoint::GetMe, &Params::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(!err.to_string().contains(TOKEN));
    }

    #[test]
    fn base_url_override_and_debug_redaction() {
        let mut t = HttpTransport::new(TOKEN);
        assert_eq!(t.base_url(), DEFAULT_API_URL);
        assert_eq!(
            t.method_url(Endpoint::GetUpdates),
            format!("https://api.telegram.org/bot{TOKEN}/getUpdates")
        );

        t.set_base_url("http://localhost:8081/");
        assert_eq!(
            t.method_url(Endpoint::GetMe),
            format!("http://localhost:8081/bot{TOKEN}/getMe")
        );
        assert!(!format!("{t:?}").contains(TOKEN));
    }
}
