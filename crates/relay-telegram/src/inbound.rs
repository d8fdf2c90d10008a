//! Normalization of Telegram updates into `InboundEvent`s.

use teloxide::types::{
    CallbackQuery, InlineKeyboardButtonKind, Message, Update, UpdateKind, User,
};

use relay_core::{
    domain::{ChatId, MessageId, UserId},
    messaging::types::{CallbackPress, InboundEvent, InlineControl, MediaKind, ReplyContext, Sender},
};

/// `None` for update kinds the relay does not handle.
pub fn from_update(update: &Update) -> Option<InboundEvent> {
    match &update.kind {
        UpdateKind::Message(msg) => from_message(msg),
        UpdateKind::CallbackQuery(q) => Some(from_callback(q)),
        _ => None,
    }
}

/// `None` for service messages and content without text or known media.
pub fn from_message(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from()?;
    let (text, media) = content(msg)?;

    Some(InboundEvent {
        sender: sender(user),
        chat_id: ChatId(msg.chat.id.0),
        message_id: Some(MessageId(msg.id.0)),
        text,
        media,
        reply_to: msg.reply_to_message().map(|r| ReplyContext {
            message_id: MessageId(r.id.0),
            controls: controls(r),
        }),
        callback: None,
    })
}

pub fn from_callback(q: &CallbackQuery) -> InboundEvent {
    let chat_id = q
        .message
        .as_ref()
        .map(|m| ChatId(m.chat.id.0))
        .unwrap_or(ChatId(q.from.id.0 as i64));

    InboundEvent {
        sender: sender(&q.from),
        chat_id,
        message_id: None,
        text: String::new(),
        media: MediaKind::None,
        reply_to: None,
        callback: Some(CallbackPress {
            callback_id: q.id.clone(),
            payload: q.data.clone().unwrap_or_default(),
            message_id: q.message.as_ref().map(|m| MessageId(m.id.0)),
        }),
    }
}

fn sender(user: &User) -> Sender {
    Sender {
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        display_name: user.full_name(),
    }
}

fn content(msg: &Message) -> Option<(String, MediaKind)> {
    if let Some(text) = msg.text() {
        return Some((text.to_string(), MediaKind::None));
    }

    let media = if msg.photo().is_some() {
        MediaKind::Photo
    } else if msg.video().is_some() {
        MediaKind::Video
    } else if msg.video_note().is_some() {
        MediaKind::VideoNote
    } else if msg.voice().is_some() {
        MediaKind::Voice
    } else if msg.document().is_some() {
        MediaKind::Document
    } else if msg.audio().is_some() {
        MediaKind::Audio
    } else if msg.sticker().is_some() {
        MediaKind::Sticker
    } else {
        return None;
    };

    Some((msg.caption().unwrap_or_default().to_string(), media))
}

fn controls(msg: &Message) -> Vec<InlineControl> {
    let Some(markup) = msg.reply_markup() else {
        return Vec::new();
    };
    markup
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|b| match &b.kind {
            InlineKeyboardButtonKind::CallbackData(data) => {
                Some(InlineControl::new(b.text.clone(), data.clone()))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(v: serde_json::Value) -> Update {
        serde_json::from_str(&v.to_string()).unwrap()
    }

    fn user_json() -> serde_json::Value {
        json!({"id": 42, "is_bot": false, "first_name": "Ann", "last_name": "Lee", "username": "ann"})
    }

    fn operator_json() -> serde_json::Value {
        json!({"id": 9000, "is_bot": false, "first_name": "Op"})
    }

    fn ops_chat_json() -> serde_json::Value {
        json!({"id": -100, "type": "supergroup", "title": "Operators"})
    }

    fn forwarded_copy_json() -> serde_json::Value {
        json!({
            "message_id": 101,
            "date": 1_700_000_000,
            "chat": ops_chat_json(),
            "from": {"id": 1, "is_bot": true, "first_name": "relay"},
            "text": "From: @ann",
            "reply_markup": {"inline_keyboard": [[{"text": "Close appeal", "callback_data": "close_42"}]]}
        })
    }

    #[test]
    fn private_text_message() {
        let ev = from_update(&update(json!({
            "update_id": 1,
            "message": {
                "message_id": 5,
                "date": 1_700_000_000,
                "chat": {"id": 42, "type": "private", "first_name": "Ann", "username": "ann"},
                "from": user_json(),
                "text": "Hello"
            }
        })))
        .unwrap();

        assert_eq!(ev.sender.user_id, UserId(42));
        assert_eq!(ev.sender.username.as_deref(), Some("ann"));
        assert_eq!(ev.sender.display_name, "Ann Lee");
        assert_eq!(ev.chat_id, ChatId(42));
        assert_eq!(ev.message_id, Some(MessageId(5)));
        assert_eq!(ev.text, "Hello");
        assert_eq!(ev.media, MediaKind::None);
        assert!(ev.reply_to.is_none());
        assert!(ev.callback.is_none());
    }

    #[test]
    fn operator_reply_carries_replied_controls() {
        let ev = from_update(&update(json!({
            "update_id": 2,
            "message": {
                "message_id": 555,
                "date": 1_700_000_100,
                "chat": ops_chat_json(),
                "from": operator_json(),
                "text": "on it",
                "reply_to_message": forwarded_copy_json()
            }
        })))
        .unwrap();

        let reply = ev.reply_to.unwrap();
        assert_eq!(reply.message_id, MessageId(101));
        assert_eq!(
            reply.controls,
            vec![InlineControl::new("Close appeal", "close_42")]
        );
        assert_eq!(ev.chat_id, ChatId(-100));
    }

    #[test]
    fn callback_press() {
        let ev = from_update(&update(json!({
            "update_id": 3,
            "callback_query": {
                "id": "cb-7",
                "from": operator_json(),
                "message": forwarded_copy_json(),
                "chat_instance": "ci-1",
                "data": "close_42"
            }
        })))
        .unwrap();

        assert_eq!(ev.chat_id, ChatId(-100));
        assert_eq!(
            ev.callback,
            Some(CallbackPress {
                callback_id: "cb-7".to_string(),
                payload: "close_42".to_string(),
                message_id: Some(MessageId(101)),
            })
        );
        assert_eq!(ev.command(), None);
    }

    #[test]
    fn photo_caption_becomes_text() {
        let ev = from_update(&update(json!({
            "update_id": 5,
            "message": {
                "message_id": 6,
                "date": 1_700_000_000,
                "chat": {"id": 42, "type": "private", "first_name": "Ann"},
                "from": user_json(),
                "photo": [{"file_id": "f1", "file_unique_id": "u1", "width": 90, "height": 90}],
                "caption": "this error"
            }
        })))
        .unwrap();

        assert_eq!(ev.media, MediaKind::Photo);
        assert_eq!(ev.text, "this error");
        assert_eq!(
            ev.source(),
            Some(relay_core::domain::MessageRef {
                chat_id: ChatId(42),
                message_id: MessageId(6),
            })
        );
    }

    #[test]
    fn edited_messages_are_not_handled() {
        let ev = from_update(&update(json!({
            "update_id": 4,
            "edited_message": {
                "message_id": 5,
                "date": 1_700_000_000,
                "edit_date": 1_700_000_050,
                "chat": {"id": 42, "type": "private", "first_name": "Ann"},
                "from": user_json(),
                "text": "Hello again"
            }
        })));
        assert!(ev.is_none());
    }
}
