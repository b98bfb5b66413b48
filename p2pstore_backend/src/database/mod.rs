pub mod models;
pub mod repositories;

use crate::config::P2pStorePaths;
use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        first_name TEXT,
        last_name TEXT,
        username TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        status TEXT,
        last_online_date TEXT,
        media_name TEXT,
        thumb_name TEXT,
        media_type TEXT NOT NULL DEFAULT 'photo'
    );

    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY,
        caption TEXT NOT NULL DEFAULT '',
        date TEXT,
        edit_date TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        user_id INTEGER,
        media_synced INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (user_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS media (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        message_id INTEGER NOT NULL,
        type TEXT NOT NULL DEFAULT 'photo',
        name TEXT,
        thumb_name TEXT,
        path TEXT NOT NULL,
        FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS reactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        message_id INTEGER NOT NULL,
        emoji TEXT,
        count INTEGER NOT NULL,
        FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_messages_user ON messages(user_id);
    CREATE INDEX IF NOT EXISTS idx_media_message ON media(message_id);
    CREATE INDEX IF NOT EXISTS idx_reactions_message ON reactions(message_id);
"#;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(paths: &P2pStorePaths) -> Result<Self> {
        let newly_created = !paths.db_path.exists();
        let conn = Connection::open(&paths.db_path)
            .with_context(|| format!("failed to open database {}", paths.db_path.display()))?;
        Ok(Self::from_connection(conn, newly_created))
    }

    pub fn from_connection(conn: Connection, newly_created: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            newly_created,
        }
    }

    /// Creates the schema if absent. Returns whether the database file was
    /// created by this process.
    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    pub fn with_repositories<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let repos = repositories::SqliteRepositories::new(conn);
            f(repos)
        })
    }

    /// Opens the single transaction that spans a whole sync pass. Every
    /// repository call made through this handle until the guard is
    /// committed or dropped belongs to that transaction.
    pub fn begin_pass(&self) -> Result<PassTransaction> {
        self.with_conn(|conn| {
            conn.execute_batch("BEGIN IMMEDIATE")
                .context("failed to open sync pass transaction")
        })?;
        Ok(PassTransaction {
            database: self.clone(),
            finished: false,
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))?;
        f(&guard)
    }
}

/// All-or-nothing durability scope for a sync pass. Dropping the guard
/// without calling [`PassTransaction::commit`] rolls every write back.
#[must_use = "dropping the pass transaction rolls it back"]
pub struct PassTransaction {
    database: Database,
    finished: bool,
}

impl PassTransaction {
    pub fn commit(mut self) -> Result<()> {
        self.database.with_conn(|conn| {
            conn.execute_batch("COMMIT")
                .context("failed to commit sync pass transaction")
        })?;
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.database.with_conn(|conn| {
            conn.execute_batch("ROLLBACK")
                .context("failed to roll back sync pass transaction")
        })
    }
}

impl Drop for PassTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let result = self.database.with_conn(|conn| {
            if !conn.is_autocommit() {
                conn.execute_batch("ROLLBACK")?;
            }
            Ok(())
        });
        match result {
            Ok(()) => tracing::warn!("sync pass transaction rolled back"),
            Err(err) => tracing::error!(error = ?err, "failed to roll back sync pass transaction"),
        }
    }
}
