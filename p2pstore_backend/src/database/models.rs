use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_deleted: bool,
    pub status: Option<String>,
    pub last_online_date: Option<String>,
    /// Cached avatar file name under the user's download directory.
    pub media_name: Option<String>,
    pub thumb_name: Option<String>,
    pub media_type: String,
}

impl UserRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            username: None,
            is_deleted: false,
            status: None,
            last_online_date: None,
            media_name: None,
            thumb_name: None,
            media_type: "photo".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    /// Caption, or the text of a text-only message.
    pub caption: String,
    pub date: Option<String>,
    pub edit_date: Option<String>,
    pub is_deleted: bool,
    pub user_id: Option<i64>,
    /// Set once media caching ran for the listing, even if every fetch
    /// failed.
    pub media_synced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Assigned by the store on insert.
    pub id: Option<i64>,
    pub message_id: i64,
    pub media_type: String,
    pub name: Option<String>,
    pub thumb_name: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub id: Option<i64>,
    pub message_id: i64,
    pub emoji: Option<String>,
    pub count: i64,
}
