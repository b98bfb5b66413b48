//! Boundary to the messaging platform: the history feed and the media
//! download capability, plus the typed raw model both of them speak.

pub mod export;
pub mod types;

pub use export::ExportArchive;
pub use types::{
    Attachment, ChatPhoto, FileRef, MediaKind, RawMedia, RawMessage, RawReaction, RawUser,
};

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Raw history in platform delivery order.
pub type HistoryStream = BoxStream<'static, anyhow::Result<RawMessage>>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("file {0} is not available")]
    NotAvailable(String),

    #[error("file id {0} escapes the media root")]
    InvalidPath(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Streams the full history of `chat_id`.
    async fn history(&self, chat_id: &str) -> anyhow::Result<HistoryStream>;

    /// Stores `file` inside `dest_dir` and returns the written path. When
    /// `file_name` is `None` the platform picks the name.
    async fn download_media(
        &self,
        file: &FileRef,
        dest_dir: &Path,
        file_name: Option<&str>,
    ) -> Result<PathBuf, FetchError>;
}

/// Name the platform would give `file` when the caller does not choose one.
pub(crate) fn default_file_name(file: &FileRef) -> String {
    file.file_name.clone().unwrap_or_else(|| {
        Path::new(&file.file_id)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&file.file_id)
            .to_string()
    })
}
