//! Thin seam over the Telegram client.
//!
//! The core delivery/cleanup code talks to [`ChatApi`] so tests can swap in a
//! recording double; [`TelegramApi`] is the production implementation backed
//! by a teloxide [`Bot`].
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, InputFile, MessageId};
use teloxide::{ApiError, RequestError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The referenced message no longer exists (already deleted).
    #[error("message not found")]
    NotFound,
    /// The bot cannot message this chat (blocked or deactivated user).
    #[error("bot blocked by chat")]
    Blocked,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_photo(&self, chat: ChatId, file_id: &str, caption: &str)
        -> ChatResult<MessageId>;

    async fn send_video(&self, chat: ChatId, file_id: &str, caption: &str)
        -> ChatResult<MessageId>;

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> ChatResult<MessageId>;

    async fn send_sticker(&self, chat: ChatId, file_id: &str) -> ChatResult<MessageId>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> ChatResult<()>;

    async fn edit_message_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> ChatResult<()>;
}

fn classify(err: RequestError) -> ChatError {
    match &err {
        RequestError::Api(ApiError::MessageToDeleteNotFound)
        | RequestError::Api(ApiError::MessageIdInvalid) => ChatError::NotFound,
        RequestError::Api(ApiError::BotBlocked)
        | RequestError::Api(ApiError::UserDeactivated) => ChatError::Blocked,
        _ => ChatError::Other(err.into()),
    }
}

/// Production [`ChatApi`] backed by teloxide.
#[derive(Clone)]
pub struct TelegramApi {
    bot: Bot,
}

impl TelegramApi {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatApi for TelegramApi {
    async fn send_photo(
        &self,
        chat: ChatId,
        file_id: &str,
        caption: &str,
    ) -> ChatResult<MessageId> {
        let msg = self
            .bot
            .send_photo(chat, InputFile::file_id(file_id))
            .caption(caption.to_string())
            .await
            .map_err(classify)?;
        Ok(msg.id)
    }

    async fn send_video(
        &self,
        chat: ChatId,
        file_id: &str,
        caption: &str,
    ) -> ChatResult<MessageId> {
        let msg = self
            .bot
            .send_video(chat, InputFile::file_id(file_id))
            .caption(caption.to_string())
            .await
            .map_err(classify)?;
        Ok(msg.id)
    }

    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> ChatResult<MessageId> {
        let request = self.bot.send_message(chat, text);
        let msg = match keyboard {
            Some(markup) => request.reply_markup(markup).await,
            None => request.await,
        }
        .map_err(classify)?;
        Ok(msg.id)
    }

    async fn send_sticker(&self, chat: ChatId, file_id: &str) -> ChatResult<MessageId> {
        let msg = self
            .bot
            .send_sticker(chat, InputFile::file_id(file_id))
            .await
            .map_err(classify)?;
        Ok(msg.id)
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> ChatResult<()> {
        self.bot
            .delete_message(chat, message)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> ChatResult<()> {
        self.bot
            .edit_message_text(chat, message, text)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_classify_by_kind() {
        assert!(matches!(
            classify(RequestError::Api(ApiError::MessageToDeleteNotFound)),
            ChatError::NotFound
        ));
        assert!(matches!(
            classify(RequestError::Api(ApiError::BotBlocked)),
            ChatError::Blocked
        ));
        assert!(matches!(
            classify(RequestError::Api(ApiError::MessageNotModified)),
            ChatError::Other(_)
        ));
    }
}
