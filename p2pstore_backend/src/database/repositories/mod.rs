mod media;
mod messages;
mod reactions;
mod users;

use super::models::{MediaRecord, MessageRecord, ReactionRecord, UserRecord};
use anyhow::Result;
use rusqlite::Connection;

pub trait UserRepository {
    fn upsert(&self, record: &UserRecord) -> Result<()>;
    fn get(&self, id: i64) -> Result<Option<UserRecord>>;
}

pub trait MessageRepository {
    fn create(&self, record: &MessageRecord) -> Result<()>;
    fn get(&self, id: i64) -> Result<Option<MessageRecord>>;
    fn list_ids(&self) -> Result<Vec<i64>>;
    fn mark_media_synced(&self, id: i64) -> Result<()>;
}

pub trait MediaRepository {
    /// Deletes the message's media rows and inserts `records` in order.
    fn replace_for_message(&self, message_id: i64, records: &[MediaRecord]) -> Result<()>;
    fn list_for_message(&self, message_id: i64) -> Result<Vec<MediaRecord>>;
}

pub trait ReactionRepository {
    /// Deletes the message's reaction rows and inserts `records`.
    fn replace_for_message(&self, message_id: i64, records: &[ReactionRecord]) -> Result<()>;
    fn list_for_message(&self, message_id: i64) -> Result<Vec<ReactionRecord>>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }

    pub fn messages(&self) -> impl MessageRepository + '_ {
        messages::SqliteMessageRepository { conn: self.conn }
    }

    pub fn media(&self) -> impl MediaRepository + '_ {
        media::SqliteMediaRepository { conn: self.conn }
    }

    pub fn reactions(&self) -> impl ReactionRepository + '_ {
        reactions::SqliteReactionRepository { conn: self.conn }
    }
}
