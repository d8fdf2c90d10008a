use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::InlineControl,
    Result,
};

/// Outbound chat port.
///
/// Text is Telegram-style HTML; callers escape user content. Every send
/// returns a reference to the message the platform created.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    async fn send_with_control(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
        control: InlineControl,
    ) -> Result<MessageRef>;

    /// Copy `source` (media included) into `chat_id`. `caption` replaces the
    /// original caption; `None` keeps the copy bare.
    async fn copy_message(
        &self,
        source: MessageRef,
        chat_id: ChatId,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
        control: Option<InlineControl>,
    ) -> Result<MessageRef>;

    /// Replace the inline controls of `msg`. An empty slice removes them.
    async fn edit_controls(&self, msg: MessageRef, controls: &[InlineControl])
        -> Result<MessageRef>;

    async fn send_to_operator_chat(&self, html: &str) -> Result<MessageRef>;

    /// Stop the client-side spinner on a pressed control.
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}
