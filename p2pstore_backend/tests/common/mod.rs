#![allow(dead_code)]

use p2pstore_backend::config::{P2pStoreConfig, P2pStorePaths};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

pub const CHAT: &str = "@market";

pub struct Fixture {
    _temp: TempDir,
    pub config: P2pStoreConfig,
}

impl Fixture {
    pub fn new(api_port: u16) -> Self {
        let temp = tempdir().expect("tempdir");
        let paths = P2pStorePaths::from_base_dir(temp.path().join("store")).expect("paths");
        let mut config = P2pStoreConfig::new(api_port, paths);
        config.sync.chat_id = CHAT.to_string();
        Self {
            _temp: temp,
            config,
        }
    }

    pub fn chat_dir(&self) -> PathBuf {
        self.config.paths.export_dir.join("market")
    }

    /// `messages` are oldest first, the way the desktop export lists them.
    pub fn write_export(&self, messages: Vec<Value>) {
        let chat_dir = self.chat_dir();
        std::fs::create_dir_all(chat_dir.join("photos")).expect("export dir");
        let export = json!({
            "name": "market",
            "type": "public_supergroup",
            "id": 1,
            "messages": messages,
        });
        std::fs::write(chat_dir.join("result.json"), export.to_string()).expect("write export");
    }

    pub fn write_photo(&self, id: i64, data: &[u8]) {
        let path = self.chat_dir().join(format!("photos/photo_{id}.jpg"));
        std::fs::create_dir_all(path.parent().expect("parent")).expect("photos dir");
        std::fs::write(path, data).expect("write photo");
    }

    pub fn remove_photo(&self, id: i64) {
        std::fs::remove_file(self.chat_dir().join(format!("photos/photo_{id}.jpg")))
            .expect("remove photo");
    }
}

pub fn photo_message(id: i64, user_id: i64, caption: &str) -> Value {
    json!({
        "id": id,
        "type": "message",
        "date": "2024-03-01T12:00:00",
        "date_unixtime": (1_709_294_400 + id).to_string(),
        "from": format!("User {user_id}"),
        "from_id": format!("user{user_id}"),
        "photo": format!("photos/photo_{id}.jpg"),
        "width": 800,
        "height": 600,
        "text": caption,
    })
}

/// `user_id: None` makes a channel post, which has no user author.
pub fn text_message(id: i64, user_id: Option<i64>, text: &str) -> Value {
    let (from, from_id) = match user_id {
        Some(user_id) => (format!("User {user_id}"), format!("user{user_id}")),
        None => ("Market News".to_string(), "channel4242".to_string()),
    };
    json!({
        "id": id,
        "type": "message",
        "date_unixtime": (1_709_294_400 + id).to_string(),
        "from": from,
        "from_id": from_id,
        "text": text,
    })
}

pub fn with_reactions(mut message: Value, reactions: &[(&str, i64)]) -> Value {
    message["reactions"] = reactions
        .iter()
        .map(|(emoji, count)| json!({ "type": "emoji", "count": count, "emoji": emoji }))
        .collect();
    message
}
