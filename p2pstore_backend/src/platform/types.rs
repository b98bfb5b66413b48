use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque handle the platform hands out for anything downloadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl FileRef {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPhoto {
    pub big: FileRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<FileRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub status: Option<String>,
    pub last_online_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<ChatPhoto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "photo" => Some(MediaKind::Photo),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Fields shared by every attachment kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file: FileRef,
    #[serde(default)]
    pub thumbs: Vec<FileRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawMedia {
    Photo(Attachment),
    Video(Attachment),
}

impl RawMedia {
    pub fn kind(&self) -> MediaKind {
        match self {
            RawMedia::Photo(_) => MediaKind::Photo,
            RawMedia::Video(_) => MediaKind::Video,
        }
    }

    pub fn attachment(&self) -> &Attachment {
        match self {
            RawMedia::Photo(attachment) | RawMedia::Video(attachment) => attachment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReaction {
    pub emoji: String,
    pub count: i64,
}

/// One unit of platform history, before grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: i64,
    pub from_user: Option<RawUser>,
    pub caption: Option<String>,
    pub text: Option<String>,
    pub date: DateTime<Utc>,
    pub edit_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<RawReaction>,
    pub media: Option<RawMedia>,
}

impl RawMessage {
    pub fn author_id(&self) -> Option<i64> {
        self.from_user.as_ref().map(|user| user.id)
    }

    /// Caption if present, otherwise text. Empty strings count as absent.
    pub fn body(&self) -> Option<&str> {
        non_empty(self.caption.as_deref()).or_else(|| non_empty(self.text.as_deref()))
    }

    pub fn has_body(&self) -> bool {
        self.body().is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
