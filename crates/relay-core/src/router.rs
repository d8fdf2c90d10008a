//! Message routing between users and the operator chat.
//!
//! The router owns no state of its own: dialog state lives behind
//! `DialogStore`, delivery behind `ChatClient`. Each inbound event is handled
//! to completion or until the first failing call, which is logged.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    dialog::DialogStore,
    domain::{ChatId, MessageRef},
    formatting::{
        admin_reply, close_failed_notice, forwarded_block, CLOSED_CONTROL_LABEL,
        CLOSE_CONTROL_LABEL, MAX_CAPTION_LEN, MAX_TEXT_LEN, ONBOARDING_TEXT,
        PLEASE_WAIT_TEXT,
    },
    messaging::{
        port::ChatClient,
        types::{InboundEvent, InlineControl, MediaKind},
    },
    payload::{ControlAction, ControlPayload, INERT_PAYLOAD},
    Error, Result,
};

/// Where an inbound event goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    AdminReply,
    Command(String),
    Callback,
    UserMessage,
}

pub struct Router {
    operator_chat: ChatId,
    chat: Arc<dyn ChatClient>,
    dialogs: Arc<dyn DialogStore>,
}

impl Router {
    pub fn new(
        operator_chat: ChatId,
        chat: Arc<dyn ChatClient>,
        dialogs: Arc<dyn DialogStore>,
    ) -> Self {
        Self {
            operator_chat,
            chat,
            dialogs,
        }
    }

    pub fn operator_chat(&self) -> ChatId {
        self.operator_chat
    }

    /// First match wins: operator chat messages, commands, control presses,
    /// then everything else as a user message.
    pub fn classify(&self, event: &InboundEvent) -> Route {
        if event.chat_id == self.operator_chat && event.callback.is_none() {
            return Route::AdminReply;
        }
        if let Some(name) = event.command() {
            return Route::Command(name);
        }
        if event.callback.is_some() {
            return Route::Callback;
        }
        Route::UserMessage
    }

    /// Handle one inbound event. Never fails outward.
    pub async fn handle(&self, event: InboundEvent) {
        let route = self.classify(&event);
        let user_id = event.sender.user_id;
        debug!(%user_id, ?route, "routing inbound event");

        let result = match &route {
            Route::AdminReply => self.handle_admin_reply(&event).await,
            Route::Command(name) => self.handle_command(name, &event).await,
            Route::Callback => self.handle_callback(&event).await,
            Route::UserMessage => self.handle_user_message(&event).await,
        };

        if let Err(e) = result {
            error!(%user_id, ?route, error = %e, "inbound event aborted");
        }
    }

    async fn handle_command(&self, name: &str, event: &InboundEvent) -> Result<()> {
        match name {
            "start" => {
                let user_id = event.sender.user_id;
                self.dialogs.create(user_id).await?;
                self.chat
                    .send_text(event.chat_id, ONBOARDING_TEXT, None)
                    .await?;
                info!(%user_id, "dialog started");
            }
            other => debug!(command = other, "ignoring unknown command"),
        }
        Ok(())
    }

    async fn handle_admin_reply(&self, event: &InboundEvent) -> Result<()> {
        let Some(reply) = &event.reply_to else {
            return Ok(());
        };
        let Some(target) = reply
            .controls
            .iter()
            .find_map(|c| c.payload.parse::<ControlPayload>().ok())
        else {
            return Ok(());
        };
        if event.text.trim().is_empty() {
            debug!(user_id = %target.user_id, "operator reply has no text, not relayed");
            return Ok(());
        }

        let user_id = target.user_id;
        let record = self
            .dialogs
            .get(user_id)
            .await?
            .ok_or(Error::NotFound(user_id))?;

        self.chat
            .send_text(ChatId(record.user_id.0), &admin_reply(&event.text), None)
            .await?;

        // The operator's message is what the next forwarded copy threads under.
        if let Some(anchor) = event.message_id {
            self.dialogs.record_admin_message(user_id, anchor).await?;
        }
        info!(%user_id, operator = %event.sender.user_id, "operator reply relayed");
        Ok(())
    }

    async fn handle_callback(&self, event: &InboundEvent) -> Result<()> {
        let Some(press) = &event.callback else {
            return Ok(());
        };
        let Ok(payload) = press.payload.parse::<ControlPayload>() else {
            return Ok(());
        };

        match payload.action {
            ControlAction::Close => {
                let user_id = payload.user_id;
                let closed = [InlineControl::new(CLOSED_CONTROL_LABEL, INERT_PAYLOAD)];
                let edited = match press.message_id {
                    Some(message_id) => {
                        let msg = MessageRef {
                            chat_id: event.chat_id,
                            message_id,
                        };
                        self.chat.edit_controls(msg, &closed).await.map(|_| ())
                    }
                    None => Err(Error::Chat("pressed message is no longer available".into())),
                };

                if let Err(e) = edited {
                    warn!(%user_id, error = %e, "close control edit failed, dialog left open");
                    self.chat
                        .send_to_operator_chat(&close_failed_notice(
                            &user_id.to_string(),
                            &e.to_string(),
                        ))
                        .await?;
                    return Ok(());
                }

                self.dialogs.close(user_id).await?;
                info!(%user_id, operator = %event.sender.user_id, "dialog closed");
            }
        }
        Ok(())
    }

    async fn handle_user_message(&self, event: &InboundEvent) -> Result<()> {
        let user_id = event.sender.user_id;

        let record = match self.dialogs.get(user_id).await? {
            Some(r) => r,
            None => {
                self.dialogs.create(user_id).await?;
                self.dialogs
                    .get(user_id)
                    .await?
                    .ok_or(Error::NotFound(user_id))?
            }
        };

        if !record.available {
            self.chat
                .send_text(event.chat_id, PLEASE_WAIT_TEXT, None)
                .await?;
            self.dialogs.mark_available(user_id).await?;
        }

        let control = InlineControl::new(
            CLOSE_CONTROL_LABEL,
            ControlPayload::close(user_id).to_string(),
        );
        let anchor = record.last_admin_message_id;
        let source = event.source();
        let forwarded = match source {
            Some(source) if event.media.takes_caption() => {
                let caption = forwarded_block(event, MAX_CAPTION_LEN);
                self.chat
                    .copy_message(
                        source,
                        self.operator_chat,
                        Some(&caption),
                        anchor,
                        Some(control),
                    )
                    .await?
            }
            _ => {
                self.chat
                    .send_with_control(
                        self.operator_chat,
                        &forwarded_block(event, MAX_TEXT_LEN),
                        anchor,
                        control,
                    )
                    .await?
            }
        };
        self.dialogs
            .record_user_message(user_id, forwarded.message_id)
            .await?;
        debug!(%user_id, message_id = forwarded.message_id.0, "user message forwarded");

        // Stickers and video notes cannot carry the block, so they follow it.
        let bare_media = event.media != MediaKind::None && !event.media.takes_caption();
        if let (Some(source), true) = (source, bare_media) {
            let reply_to = Some(forwarded.message_id);
            if let Err(e) = self
                .chat
                .copy_message(source, self.operator_chat, None, reply_to, None)
                .await
            {
                warn!(%user_id, error = %e, "failed to copy media after forwarded block");
            }
        }

        if let Some(previous) = record.last_user_message_id {
            if previous != forwarded.message_id {
                let stale = MessageRef {
                    chat_id: self.operator_chat,
                    message_id: previous,
                };
                if let Err(e) = self.chat.edit_controls(stale, &[]).await {
                    warn!(%user_id, message_id = previous.0, error = %e, "failed to clear stale close control");
                }
            }
        }
        Ok(())
    }
}
