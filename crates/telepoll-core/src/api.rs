use std::sync::Arc;

use crate::{
    cursor::UpdateCursor,
    domain::{ChatId, MessageId, UserId},
    ports::Transport,
    transport::{self, Endpoint, Params},
    types::{Me, Message, ReplyMarkup, UserProfilePhotos},
    Result,
};

/// Outgoing `sendMessage` request.
#[derive(Clone, Debug, PartialEq)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub disable_web_page_preview: bool,
    pub reply_to_message_id: Option<MessageId>,
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            disable_web_page_preview: false,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }

    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }

    pub fn disable_web_page_preview(mut self) -> Self {
        self.disable_web_page_preview = true;
        self
    }

    fn params(&self) -> Result<Params> {
        let mut params = Params::new();
        params.insert("chat_id", self.chat_id.0.to_string());
        params.insert("text", self.text.clone());
        if self.disable_web_page_preview {
            params.insert("disable_web_page_preview", "true".to_string());
        }
        if let Some(id) = self.reply_to_message_id {
            params.insert("reply_to_message_id", id.0.to_string());
        }
        if let Some(markup) = &self.reply_markup {
            params.insert("reply_markup", serde_json::to_string(markup)?);
        }
        Ok(params)
    }
}

/// Stateless request/response calls plus a factory for update cursors.
#[derive(Clone)]
pub struct BotApi {
    transport: Arc<dyn Transport>,
}

impl BotApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// New cursor over the same transport. Each cursor tracks its own offset.
    pub fn cursor(&self) -> UpdateCursor {
        UpdateCursor::new(self.transport.clone())
    }

    pub async fn get_me(&self) -> Result<Me> {
        transport::call(self.transport.as_ref(), Endpoint::GetMe, &Params::new()).await
    }

    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<Message> {
        self.send(SendMessage::new(chat_id, text)).await
    }

    pub async fn send(&self, msg: SendMessage) -> Result<Message> {
        let params = msg.params()?;
        transport::call(self.transport.as_ref(), Endpoint::SendMessage, &params).await
    }

    pub async fn get_user_profile_photos(
        &self,
        user_id: UserId,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<UserProfilePhotos> {
        let mut params = Params::new();
        params.insert("user_id", user_id.0.to_string());
        if let Some(offset) = offset {
            params.insert("offset", offset.to_string());
        }
        if let Some(limit) = limit {
            params.insert("limit", limit.clamp(1, 100).to_string());
        }
        transport::call(
            self.transport.as_ref(),
            Endpoint::GetUserProfilePhotos,
            &params,
        )
        .await
    }
}
