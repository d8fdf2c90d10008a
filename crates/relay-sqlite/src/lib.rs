//! SQLite-backed `DialogStore`.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use relay_core::{
    dialog::DialogStore,
    domain::{DialogRecord, MessageId, UserId},
    Error, Result,
};

#[derive(Clone)]
pub struct SqliteDialogStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteDialogStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err)?;
        Self::from_connection(conn)
    }

    /// In-memory database, for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users_dialog (
                user_id INTEGER PRIMARY KEY,
                last_admin_message_id INTEGER,
                last_user_message_id INTEGER,
                available INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(store_err)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| Error::Store("connection mutex poisoned".to_string()))
    }

    /// Run an UPDATE for one user; zero affected rows means the user is unknown.
    fn update(&self, user_id: UserId, sql: &str, value: Option<i64>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        let changed = match value {
            Some(v) => conn.execute(sql, params![v, now, user_id.0]),
            None => conn.execute(sql, params![now, user_id.0]),
        }
        .map_err(store_err)?;
        if changed == 0 {
            return Err(Error::NotFound(user_id));
        }
        Ok(())
    }
}

fn store_err(e: rusqlite::Error) -> Error {
    Error::Store(e.to_string())
}

#[async_trait]
impl DialogStore for SqliteDialogStore {
    async fn get(&self, user_id: UserId) -> Result<Option<DialogRecord>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT user_id, last_admin_message_id, last_user_message_id, available, updated_at
                 FROM users_dialog WHERE user_id = ?1",
                params![user_id.0],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<i32>>(1)?,
                        row.get::<_, Option<i32>>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(store_err)?;

        let Some((id, admin, user, available, updated_at)) = row else {
            return Ok(None);
        };
        let updated_at = DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Store(format!("bad updated_at for user {id}: {e}")))?;

        Ok(Some(DialogRecord {
            user_id: UserId(id),
            available,
            last_admin_message_id: admin.map(MessageId),
            last_user_message_id: user.map(MessageId),
            updated_at,
        }))
    }

    async fn create(&self, user_id: UserId) -> Result<()> {
        let conn = self.conn()?;
        let inserted = conn
            .execute(
                "INSERT INTO users_dialog (user_id, available, updated_at)
                 VALUES (?1, 0, ?2)
                 ON CONFLICT (user_id) DO NOTHING",
                params![user_id.0, Utc::now().to_rfc3339()],
            )
            .map_err(store_err)?;
        if inserted > 0 {
            tracing::debug!(%user_id, "dialog record created");
        }
        Ok(())
    }

    async fn record_admin_message(&self, user_id: UserId, message_id: MessageId) -> Result<()> {
        self.update(
            user_id,
            "UPDATE users_dialog SET last_admin_message_id = ?1, updated_at = ?2 WHERE user_id = ?3",
            Some(i64::from(message_id.0)),
        )
    }

    async fn record_user_message(&self, user_id: UserId, message_id: MessageId) -> Result<()> {
        self.update(
            user_id,
            "UPDATE users_dialog SET last_user_message_id = ?1, updated_at = ?2 WHERE user_id = ?3",
            Some(i64::from(message_id.0)),
        )
    }

    async fn mark_available(&self, user_id: UserId) -> Result<()> {
        self.update(
            user_id,
            "UPDATE users_dialog SET available = 1, updated_at = ?1 WHERE user_id = ?2",
            None,
        )
    }

    async fn close(&self, user_id: UserId) -> Result<()> {
        self.update(
            user_id,
            "UPDATE users_dialog SET available = 0, last_user_message_id = NULL, updated_at = ?1
             WHERE user_id = ?2",
            None,
        )
    }
}
