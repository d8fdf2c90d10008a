//! Inline control payloads.
//!
//! A control press has to lead back to the user it was attached for, so the
//! payload carries both the action and the user id: `close_<user id>`.

use std::{fmt, str::FromStr};

use crate::domain::UserId;

/// Payload attached to the disabled "closed" label. It never parses as a
/// `ControlPayload`, so pressing the label is a no-op.
pub const INERT_PAYLOAD: &str = "ignore";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    Close,
}

impl ControlAction {
    fn as_str(self) -> &'static str {
        match self {
            ControlAction::Close => "close",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlPayload {
    pub action: ControlAction,
    pub user_id: UserId,
}

impl ControlPayload {
    pub fn close(user_id: UserId) -> Self {
        Self {
            action: ControlAction::Close,
            user_id,
        }
    }
}

impl fmt::Display for ControlPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.action.as_str(), self.user_id.0)
    }
}

/// Marker error: the string is not a control payload we issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownPayload;

impl FromStr for ControlPayload {
    type Err = UnknownPayload;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, id) = s.split_once('_').ok_or(UnknownPayload)?;
        let action = match action {
            "close" => ControlAction::Close,
            _ => return Err(UnknownPayload),
        };
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UnknownPayload);
        }
        let user_id = id.parse::<i64>().map_err(|_| UnknownPayload)?;
        Ok(Self {
            action,
            user_id: UserId(user_id),
        })
    }
}
