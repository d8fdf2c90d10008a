//! Messenger-agnostic inbound model and the outbound chat port.

pub mod port;
pub mod types;
