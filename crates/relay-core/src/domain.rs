use std::fmt;

use chrono::{DateTime, Utc};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric, unique within a chat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Per-user dialog state.
///
/// Message ids on both fields point into the operator chat: the admin side is
/// the operator's last reply (used as reply anchor), the user side is the
/// newest forwarded copy that still carries a close control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogRecord {
    pub user_id: UserId,
    pub available: bool,
    pub last_admin_message_id: Option<MessageId>,
    pub last_user_message_id: Option<MessageId>,
    pub updated_at: DateTime<Utc>,
}

impl DialogRecord {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            available: false,
            last_admin_message_id: None,
            last_user_message_id: None,
            updated_at: Utc::now(),
        }
    }
}
