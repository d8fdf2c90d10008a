//! Core routing logic for the operator relay bot.
//!
//! This crate is framework-agnostic. Telegram and SQLite live behind ports
//! (`ChatClient`, `DialogStore`) implemented in adapter crates.

pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod payload;
pub mod router;

pub use errors::{Error, Result};
