use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    dialog::DialogStore,
    domain::{DialogRecord, MessageId, UserId},
    Error, Result,
};

/// In-process `DialogStore`, used by tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryDialogStore {
    records: Mutex<HashMap<UserId, DialogRecord>>,
}

impl MemoryDialogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    async fn update(&self, user_id: UserId, f: impl FnOnce(&mut DialogRecord)) -> Result<()> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(&user_id).ok_or(Error::NotFound(user_id))?;
        f(record);
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl DialogStore for MemoryDialogStore {
    async fn get(&self, user_id: UserId) -> Result<Option<DialogRecord>> {
        Ok(self.records.lock().await.get(&user_id).cloned())
    }

    async fn create(&self, user_id: UserId) -> Result<()> {
        self.records
            .lock()
            .await
            .entry(user_id)
            .or_insert_with(|| DialogRecord::new(user_id));
        Ok(())
    }

    async fn record_admin_message(&self, user_id: UserId, message_id: MessageId) -> Result<()> {
        self.update(user_id, |r| r.last_admin_message_id = Some(message_id))
            .await
    }

    async fn record_user_message(&self, user_id: UserId, message_id: MessageId) -> Result<()> {
        self.update(user_id, |r| r.last_user_message_id = Some(message_id))
            .await
    }

    async fn mark_available(&self, user_id: UserId) -> Result<()> {
        self.update(user_id, |r| r.available = true).await
    }

    async fn close(&self, user_id: UserId) -> Result<()> {
        self.update(user_id, |r| {
            r.available = false;
            r.last_user_message_id = None;
        })
        .await
    }
}
