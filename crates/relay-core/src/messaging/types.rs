use crate::domain::{ChatId, MessageId, MessageRef, UserId};

/// Who sent an inbound event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub user_id: UserId,
    pub username: Option<String>,
    pub display_name: String,
}

/// Non-text content attached to a user message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MediaKind {
    #[default]
    None,
    Photo,
    Video,
    VideoNote,
    Voice,
    Document,
    Audio,
    Sticker,
}

impl MediaKind {
    pub fn label(self) -> Option<&'static str> {
        match self {
            MediaKind::None => None,
            MediaKind::Photo => Some("photo"),
            MediaKind::Video => Some("video"),
            MediaKind::VideoNote => Some("video note"),
            MediaKind::Voice => Some("voice message"),
            MediaKind::Document => Some("document"),
            MediaKind::Audio => Some("audio"),
            MediaKind::Sticker => Some("sticker"),
        }
    }

    /// Whether a copy of this media can carry a caption.
    pub fn takes_caption(self) -> bool {
        matches!(
            self,
            MediaKind::Photo
                | MediaKind::Video
                | MediaKind::Voice
                | MediaKind::Document
                | MediaKind::Audio
        )
    }
}

/// A tappable button attached to a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineControl {
    pub label: String,
    pub payload: String,
}

impl InlineControl {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// The message an inbound message replies to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyContext {
    pub message_id: MessageId,
    pub controls: Vec<InlineControl>,
}

/// An inline control press.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackPress {
    pub callback_id: String,
    pub payload: String,
    /// The message carrying the pressed control, if the platform still has it.
    pub message_id: Option<MessageId>,
}

/// Normalized inbound update.
///
/// Transports (webhook, polling) decode platform updates into this shape; the
/// router classifies it without touching any platform types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: Sender,
    pub chat_id: ChatId,
    pub message_id: Option<MessageId>,
    /// Text, or the caption when `media` is set.
    pub text: String,
    pub media: MediaKind,
    pub reply_to: Option<ReplyContext>,
    pub callback: Option<CallbackPress>,
}

impl InboundEvent {
    /// The platform message this event was decoded from, if any.
    pub fn source(&self) -> Option<MessageRef> {
        self.message_id.map(|message_id| MessageRef {
            chat_id: self.chat_id,
            message_id,
        })
    }

    /// Command name for `/name` or `/name@bot args`, lowercased.
    pub fn command(&self) -> Option<String> {
        if self.callback.is_some() {
            return None;
        }
        let first = self.text.trim_start().split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        Some(name.split('@').next().unwrap_or("").to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_event(text: &str) -> InboundEvent {
        InboundEvent {
            sender: Sender {
                user_id: UserId(1),
                username: None,
                display_name: "A".to_string(),
            },
            chat_id: ChatId(1),
            message_id: Some(MessageId(1)),
            text: text.to_string(),
            media: MediaKind::None,
            reply_to: None,
            callback: None,
        }
    }

    #[test]
    fn parses_command_names() {
        assert_eq!(text_event("/start").command().as_deref(), Some("start"));
        assert_eq!(
            text_event("/Start@relay_bot payload").command().as_deref(),
            Some("start")
        );
        assert_eq!(text_event("/").command().as_deref(), Some(""));
        assert_eq!(text_event("hello /start").command(), None);
        assert_eq!(text_event("").command(), None);
    }

    #[test]
    fn stickers_and_video_notes_take_no_caption() {
        assert!(MediaKind::Photo.takes_caption());
        assert!(MediaKind::Voice.takes_caption());
        assert!(!MediaKind::Sticker.takes_caption());
        assert!(!MediaKind::VideoNote.takes_caption());
        assert!(!MediaKind::None.takes_caption());
    }
}
