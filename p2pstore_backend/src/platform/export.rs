//! History source backed by a desktop chat export: one directory per chat
//! holding `result.json` and the exported media files next to it.

use super::{
    default_file_name, Attachment, FetchError, FileRef, HistoryStream, PlatformClient, RawMedia,
    RawMessage, RawReaction, RawUser,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

const RESULT_FILE: &str = "result.json";

#[derive(Deserialize)]
struct ExportedChat {
    #[serde(default)]
    messages: Vec<ExportedMessage>,
}

#[derive(Deserialize)]
struct ExportedMessage {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    date: Option<String>,
    date_unixtime: Option<String>,
    edited: Option<String>,
    edited_unixtime: Option<String>,
    from: Option<String>,
    from_id: Option<String>,
    #[serde(default)]
    text: ExportedText,
    photo: Option<String>,
    file: Option<String>,
    thumbnail: Option<String>,
    media_type: Option<String>,
    #[serde(default)]
    reactions: Vec<ExportedReaction>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExportedText {
    Plain(String),
    Rich(Vec<ExportedTextPart>),
}

impl Default for ExportedText {
    fn default() -> Self {
        ExportedText::Plain(String::new())
    }
}

impl ExportedText {
    fn flatten(self) -> String {
        match self {
            ExportedText::Plain(text) => text,
            ExportedText::Rich(parts) => parts
                .into_iter()
                .map(|part| match part {
                    ExportedTextPart::Plain(text) => text,
                    ExportedTextPart::Entity { text } => text,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExportedTextPart {
    Plain(String),
    Entity { text: String },
}

#[derive(Deserialize)]
struct ExportedReaction {
    count: i64,
    emoji: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportArchive {
    root: PathBuf,
}

impl ExportArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn chat_dir(&self, chat_id: &str) -> PathBuf {
        self.root.join(chat_key(chat_id))
    }

    /// Reads the whole export and returns it newest first, which is the
    /// order the platform's history feed delivers.
    pub async fn load(&self, chat_id: &str) -> Result<Vec<RawMessage>> {
        let result_path = self.chat_dir(chat_id).join(RESULT_FILE);
        let raw = fs::read(&result_path)
            .await
            .with_context(|| format!("failed to read export {}", result_path.display()))?;
        let chat: ExportedChat = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to decode export {}", result_path.display()))?;

        let key = chat_key(chat_id);
        let mut messages = Vec::with_capacity(chat.messages.len());
        for exported in chat.messages {
            if exported.kind != "message" {
                continue;
            }
            let id = exported.id;
            match into_raw(exported, key) {
                Some(message) => messages.push(message),
                None => tracing::warn!(message_id = id, "skipping exported message without a date"),
            }
        }
        messages.reverse();
        Ok(messages)
    }
}

#[async_trait]
impl PlatformClient for ExportArchive {
    async fn history(&self, chat_id: &str) -> Result<HistoryStream> {
        let messages = self.load(chat_id).await?;
        tracing::debug!(chat_id, count = messages.len(), "loaded exported history");
        Ok(stream::iter(messages.into_iter().map(Ok)).boxed())
    }

    async fn download_media(
        &self,
        file: &FileRef,
        dest_dir: &Path,
        file_name: Option<&str>,
    ) -> Result<PathBuf, FetchError> {
        let relative = Path::new(&file.file_id);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(FetchError::InvalidPath(file.file_id.clone()));
        }
        let source = self.root.join(relative);
        if !fs::try_exists(&source).await.unwrap_or(false) {
            return Err(FetchError::NotAvailable(file.file_id.clone()));
        }
        fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| FetchError::Io {
                path: dest_dir.to_path_buf(),
                source,
            })?;
        let target = dest_dir.join(
            file_name
                .map(str::to_string)
                .unwrap_or_else(|| default_file_name(file)),
        );
        fs::copy(&source, &target)
            .await
            .map_err(|source| FetchError::Io {
                path: target.clone(),
                source,
            })?;
        Ok(target)
    }
}

fn chat_key(chat_id: &str) -> &str {
    chat_id.trim_start_matches('@')
}

fn into_raw(exported: ExportedMessage, chat_key: &str) -> Option<RawMessage> {
    let date = parse_date(exported.date_unixtime.as_deref(), exported.date.as_deref())?;
    let edit_date = parse_date(
        exported.edited_unixtime.as_deref(),
        exported.edited.as_deref(),
    );
    let file_ref = |relative: &str| FileRef::new(format!("{chat_key}/{relative}"));

    let media = match (exported.photo.as_deref(), exported.file.as_deref()) {
        (Some(photo), _) => Some(RawMedia::Photo(Attachment {
            file: file_ref(photo),
            thumbs: Vec::new(),
        })),
        (None, Some(file)) if exported.media_type.as_deref() == Some("video_file") => {
            Some(RawMedia::Video(Attachment {
                file: file_ref(file),
                thumbs: exported.thumbnail.as_deref().map(file_ref).into_iter().collect(),
            }))
        }
        _ => None,
    };

    let from_user = exported
        .from_id
        .as_deref()
        .and_then(|raw| raw.strip_prefix("user"))
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(|id| RawUser {
            id,
            is_deleted: exported.from.is_none(),
            first_name: exported.from.clone(),
            last_name: None,
            username: None,
            status: None,
            last_online_date: None,
            photo: None,
        });

    // The export folds captions into `text`.
    let body = Some(exported.text.flatten()).filter(|body| !body.is_empty());
    let (caption, text) = if media.is_some() {
        (body, None)
    } else {
        (None, body)
    };

    let reactions = exported
        .reactions
        .into_iter()
        .filter_map(|reaction| {
            reaction.emoji.map(|emoji| RawReaction {
                emoji,
                count: reaction.count,
            })
        })
        .collect();

    Some(RawMessage {
        id: exported.id,
        from_user,
        caption,
        text,
        date,
        edit_date,
        reactions,
        media,
    })
}

fn parse_date(unixtime: Option<&str>, local: Option<&str>) -> Option<DateTime<Utc>> {
    if let Some(ts) = unixtime.and_then(|raw| raw.parse::<i64>().ok()) {
        return DateTime::from_timestamp(ts, 0);
    }
    local
        .and_then(|raw| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok())
        .map(|naive| naive.and_utc())
}
