use crate::database::models::MessageRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteMessageRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::MessageRepository for SqliteMessageRepository<'conn> {
    fn create(&self, record: &MessageRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO messages (id, caption, date, edit_date, is_deleted, user_id, media_synced)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.caption,
                record.date,
                record.edit_date,
                if record.is_deleted { 1 } else { 0 },
                record.user_id,
                if record.media_synced { 1 } else { 0 }
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: i64) -> Result<Option<MessageRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, caption, date, edit_date, is_deleted, user_id, media_synced
                FROM messages
                WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(MessageRecord {
                        id: row.get(0)?,
                        caption: row.get(1)?,
                        date: row.get(2)?,
                        edit_date: row.get(3)?,
                        is_deleted: row.get::<_, i64>(4)? != 0,
                        user_id: row.get(5)?,
                        media_synced: row.get::<_, i64>(6)? != 0,
                    })
                },
            )
            .optional()?)
    }

    fn list_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM messages ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn mark_media_synced(&self, id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE messages SET media_synced = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}
