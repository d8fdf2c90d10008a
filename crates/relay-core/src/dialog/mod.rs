//! Dialog persistence port.
//!
//! Every mutation of a `DialogRecord` goes through one of the named
//! transitions below; handlers never write raw fields.

pub mod memory;

use async_trait::async_trait;

use crate::{
    domain::{DialogRecord, MessageId, UserId},
    Result,
};

pub use memory::MemoryDialogStore;

#[async_trait]
pub trait DialogStore: Send + Sync {
    /// Fetch the record for `user_id`, `None` if the user was never seen.
    async fn get(&self, user_id: UserId) -> Result<Option<DialogRecord>>;

    /// Create the record if missing. Repeated calls are a no-op.
    async fn create(&self, user_id: UserId) -> Result<()>;

    /// Remember the operator's latest reply as the reply anchor.
    async fn record_admin_message(&self, user_id: UserId, message_id: MessageId) -> Result<()>;

    /// Remember the newest forwarded copy in the operator chat.
    async fn record_user_message(&self, user_id: UserId, message_id: MessageId) -> Result<()>;

    /// Flip `available` to true. No-op if already set.
    async fn mark_available(&self, user_id: UserId) -> Result<()>;

    /// Close the dialog: `available` goes back to false and the forwarded copy
    /// reference is dropped, since its control now shows the closed label.
    async fn close(&self, user_id: UserId) -> Result<()>;
}
