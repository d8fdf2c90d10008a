//! Fixed texts and HTML formatting for relayed messages.

use crate::messaging::types::{InboundEvent, MediaKind, Sender};

pub const ONBOARDING_TEXT: &str = "Hello! Write your question here and the administration will \
reply as soon as possible.";
pub const PLEASE_WAIT_TEXT: &str = "Your message has been received. Please wait for an operator \
to reply.";
pub const ADMIN_REPLY_LABEL: &str = "Administration reply:";
pub const CLOSE_CONTROL_LABEL: &str = "Close appeal ❇️";
pub const CLOSED_CONTROL_LABEL: &str = "⭕️ Appeal closed ⭕️";

/// Telegram limits, in UTF-16 code units after entity parsing.
pub const MAX_TEXT_LEN: usize = 4096;
pub const MAX_CAPTION_LEN: usize = 1024;

const ELLIPSIS: char = '…';

/// Escape text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Block posted into the operator chat for a user message.
///
/// The user's text is cut (with an ellipsis) so the rendered block stays within
/// `limit` visible characters: `MAX_TEXT_LEN` for a message, `MAX_CAPTION_LEN`
/// when it becomes the caption of copied media.
pub fn forwarded_block(event: &InboundEvent, limit: usize) -> String {
    let mut out = format!("<b>From:</b> {}\n", sender_line(&event.sender));
    out.push_str(&format!(
        "<b>User ID:</b> <code>{}</code>\n",
        event.sender.user_id
    ));
    if let Some(kind) = event.media.label() {
        out.push_str(&format!("<i>[{kind}]</i>\n"));
    }
    out.push('\n');

    let budget = limit.saturating_sub(visible_len(&out));
    out.push_str(&escape_html(&truncate(&event.text, budget)));
    out
}

/// Length Telegram counts for our HTML: tags are dropped, entities count once.
pub fn visible_len(html: &str) -> usize {
    let mut len = 0;
    let mut in_tag = false;
    let mut in_entity = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '&' => {
                in_entity = true;
                len += 1;
            }
            ';' if in_entity => in_entity = false,
            _ if in_entity => {}
            _ => len += c.len_utf16(),
        }
    }
    len
}

fn truncate(text: &str, budget: usize) -> String {
    let total: usize = text.chars().map(char::len_utf16).sum();
    if total <= budget {
        return text.to_string();
    }
    let keep = budget.saturating_sub(ELLIPSIS.len_utf16());
    let mut used = 0;
    let mut out: String = text
        .chars()
        .take_while(|c| {
            used += c.len_utf16();
            used <= keep
        })
        .collect();
    if budget > 0 {
        out.push(ELLIPSIS);
    }
    out
}

/// Operator reply as delivered to the user.
pub fn admin_reply(text: &str) -> String {
    format!("<b>{ADMIN_REPLY_LABEL}</b>\n\n{}", escape_html(text))
}

pub fn close_failed_notice(user: &str, err: &str) -> String {
    format!(
        "Failed to close the appeal of user <code>{}</code>: {}",
        escape_html(user),
        escape_html(err)
    )
}

fn sender_line(sender: &Sender) -> String {
    let name = escape_html(&sender.display_name);
    match sender.username.as_deref() {
        Some(handle) if !handle.is_empty() => format!("@{} ({name})", escape_html(handle)),
        _ => name,
    }
}
