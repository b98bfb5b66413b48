use crate::database::models::ReactionRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteReactionRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::ReactionRepository for SqliteReactionRepository<'conn> {
    fn replace_for_message(&self, message_id: i64, records: &[ReactionRecord]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM reactions WHERE message_id = ?1",
            params![message_id],
        )?;
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO reactions (message_id, emoji, count)
            VALUES (?1, ?2, ?3)
            "#,
        )?;
        for record in records {
            stmt.execute(params![message_id, record.emoji, record.count])?;
        }
        Ok(())
    }

    fn list_for_message(&self, message_id: i64) -> Result<Vec<ReactionRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, message_id, emoji, count
            FROM reactions
            WHERE message_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![message_id], |row| {
            Ok(ReactionRecord {
                id: row.get(0)?,
                message_id: row.get(1)?,
                emoji: row.get(2)?,
                count: row.get(3)?,
            })
        })?;

        let mut reactions = Vec::new();
        for row in rows {
            reactions.push(row?);
        }
        Ok(reactions)
    }
}
