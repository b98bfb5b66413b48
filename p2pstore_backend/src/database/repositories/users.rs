use crate::database::models::UserRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteUserRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::UserRepository for SqliteUserRepository<'conn> {
    fn upsert(&self, record: &UserRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, first_name, last_name, username, is_deleted, status, last_online_date, media_name, thumb_name, media_type)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                username = excluded.username,
                is_deleted = excluded.is_deleted,
                status = excluded.status,
                last_online_date = excluded.last_online_date,
                media_name = excluded.media_name,
                thumb_name = excluded.thumb_name,
                media_type = excluded.media_type
            "#,
            params![
                record.id,
                record.first_name,
                record.last_name,
                record.username,
                if record.is_deleted { 1 } else { 0 },
                record.status,
                record.last_online_date,
                record.media_name,
                record.thumb_name,
                record.media_type
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: i64) -> Result<Option<UserRecord>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, first_name, last_name, username, is_deleted, status, last_online_date, media_name, thumb_name, media_type
                FROM users
                WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(UserRecord {
                        id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        username: row.get(3)?,
                        is_deleted: row.get::<_, i64>(4)? != 0,
                        status: row.get(5)?,
                        last_online_date: row.get(6)?,
                        media_name: row.get(7)?,
                        thumb_name: row.get(8)?,
                        media_type: row.get(9)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}
