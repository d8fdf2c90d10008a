use crate::domain::UserId;

/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the router can
/// log failures consistently without knowing which backend produced them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("dialog not found for user {0}")]
    NotFound(UserId),

    #[error("store error: {0}")]
    Store(String),

    #[error("chat error: {0}")]
    Chat(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
