//! Telegram adapter (teloxide).
//!
//! Implements the `relay-core` `ChatClient` port over the Bot API and feeds
//! updates into the core `Router`, either from a webhook or from long polling.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    ApiError, RequestError,
};
use tracing::warn;

pub mod inbound;
pub mod polling;
pub mod webhook;

use relay_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::ChatClient, types::InboundEvent, types::InlineControl},
    router::Router,
    Result,
};

/// Shared by both update transports.
pub struct AppState {
    pub router: Arc<Router>,
    pub chat: Arc<dyn ChatClient>,
}

impl AppState {
    /// Route one event, then release the client spinner if it was a press.
    pub async fn deliver(&self, event: InboundEvent) {
        let callback_id = event.callback.as_ref().map(|c| c.callback_id.clone());
        self.router.handle(event).await;
        if let Some(id) = callback_id {
            if let Err(e) = self.chat.answer_callback(&id).await {
                warn!(callback_id = %id, error = %e, "failed to answer callback query");
            }
        }
    }
}

#[derive(Clone)]
pub struct TelegramChatClient {
    bot: Bot,
    operator_chat: ChatId,
}

impl TelegramChatClient {
    pub fn new(bot: Bot, operator_chat: ChatId) -> Self {
        Self { bot, operator_chat }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        Error::Chat(format!("telegram error: {e}"))
    }

    fn markup(controls: &[InlineControl]) -> InlineKeyboardMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = controls
            .iter()
            .map(|c| vec![InlineKeyboardButton::callback(c.label.clone(), c.payload.clone())])
            .collect();
        InlineKeyboardMarkup::new(rows)
    }

    async fn send(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html);
        if let Some(id) = reply_to {
            req = req
                .reply_to_message_id(Self::tg_msg_id(id))
                .allow_sending_without_reply(true);
        }
        if let Some(markup) = markup {
            req = req.reply_markup(markup);
        }

        let msg = req.await.map_err(Self::map_err)?;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }
}

#[async_trait]
impl ChatClient for TelegramChatClient {
    async fn send_text(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef> {
        self.send(chat_id, html, reply_to, None).await
    }

    async fn send_with_control(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
        control: InlineControl,
    ) -> Result<MessageRef> {
        self.send(chat_id, html, reply_to, Some(Self::markup(&[control])))
            .await
    }

    async fn copy_message(
        &self,
        source: MessageRef,
        chat_id: ChatId,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
        control: Option<InlineControl>,
    ) -> Result<MessageRef> {
        let mut req = self.bot.copy_message(
            Self::tg_chat(chat_id),
            Self::tg_chat(source.chat_id),
            Self::tg_msg_id(source.message_id),
        );
        if let Some(caption) = caption {
            req = req.caption(caption.to_string()).parse_mode(ParseMode::Html);
        }
        if let Some(id) = reply_to {
            req = req
                .reply_to_message_id(Self::tg_msg_id(id))
                .allow_sending_without_reply(true);
        }
        if let Some(control) = control {
            req = req.reply_markup(Self::markup(&[control]));
        }

        let copied = req.await.map_err(Self::map_err)?;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(copied.0),
        })
    }

    async fn edit_controls(
        &self,
        msg: MessageRef,
        controls: &[InlineControl],
    ) -> Result<MessageRef> {
        let res = self
            .bot
            .edit_message_reply_markup(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
            .reply_markup(Self::markup(controls))
            .await;
        match res {
            Ok(edited) => Ok(MessageRef {
                chat_id: msg.chat_id,
                message_id: MessageId(edited.id.0),
            }),
            // Re-applying the same markup is not a failure.
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(msg),
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn send_to_operator_chat(&self, html: &str) -> Result<MessageRef> {
        self.send(self.operator_chat, html, None, None).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(callback_id.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
