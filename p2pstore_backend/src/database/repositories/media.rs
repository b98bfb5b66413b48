use crate::database::models::MediaRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteMediaRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::MediaRepository for SqliteMediaRepository<'conn> {
    fn replace_for_message(&self, message_id: i64, records: &[MediaRecord]) -> Result<()> {
        self.conn.execute(
            "DELETE FROM media WHERE message_id = ?1",
            params![message_id],
        )?;
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO media (message_id, type, name, thumb_name, path)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        for record in records {
            stmt.execute(params![
                message_id,
                record.media_type,
                record.name,
                record.thumb_name,
                record.path
            ])?;
        }
        Ok(())
    }

    fn list_for_message(&self, message_id: i64) -> Result<Vec<MediaRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, message_id, type, name, thumb_name, path
            FROM media
            WHERE message_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![message_id], |row| {
            Ok(MediaRecord {
                id: row.get(0)?,
                message_id: row.get(1)?,
                media_type: row.get(2)?,
                name: row.get(3)?,
                thumb_name: row.get(4)?,
                path: row.get(5)?,
            })
        })?;
        let mut media = Vec::new();
        for row in rows {
            media.push(row?);
        }
        Ok(media)
    }
}
