use crate::database::models::MediaRecord;
use crate::platform::{FetchError, FileRef, MediaKind, PlatformClient, RawMessage, RawUser};
use crate::utils::RefreshFlag;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const THUMB_PREFIX: &str = "thumb-";

/// What is cached on disk for one attachment. `name`/`thumb_name` stay
/// unset when the corresponding fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaDescriptor {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub name: Option<String>,
    pub thumb_name: Option<String>,
    pub path: PathBuf,
}

impl MediaDescriptor {
    pub fn to_record(&self, message_id: i64) -> MediaRecord {
        MediaRecord {
            id: None,
            message_id,
            media_type: self.kind.as_str().to_string(),
            name: self.name.clone(),
            thumb_name: self.thumb_name.clone(),
            path: self.path.display().to_string(),
        }
    }

    pub fn from_record(record: &MediaRecord) -> Self {
        Self {
            kind: MediaKind::parse(&record.media_type).unwrap_or(MediaKind::Photo),
            name: record.name.clone(),
            thumb_name: record.thumb_name.clone(),
            path: PathBuf::from(&record.path),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvatarDescriptor {
    pub name: Option<String>,
    pub thumb_name: Option<String>,
}

/// Files found in a cache directory. Names starting with `thumb-` are
/// thumbnails; any other file is the primary asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedFiles {
    pub primary: Option<PathBuf>,
    pub thumb: Option<PathBuf>,
}

/// A directory counts as cached as soon as it holds any entry.
pub async fn is_populated(dir: &Path) -> bool {
    match fs::read_dir(dir).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
        Err(_) => false,
    }
}

pub async fn scan_cached(dir: &Path) -> CachedFiles {
    let mut names = Vec::new();
    if let Ok(mut entries) = fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();

    let mut cached = CachedFiles::default();
    for name in names {
        let slot = if name.starts_with(THUMB_PREFIX) {
            &mut cached.thumb
        } else {
            &mut cached.primary
        };
        if slot.is_none() {
            *slot = Some(dir.join(name));
        }
    }
    cached
}

/// Idempotent fetch-and-store of attachments and avatars. Fetch failures
/// never escape: they leave the matching descriptor field unset.
pub struct MediaCache<'a> {
    platform: &'a dyn PlatformClient,
    refresh: RefreshFlag,
}

impl<'a> MediaCache<'a> {
    pub fn new(platform: &'a dyn PlatformClient, refresh: RefreshFlag) -> Self {
        Self { platform, refresh }
    }

    pub async fn cache_message_media(
        &self,
        message: &RawMessage,
        dest: &Path,
    ) -> Option<MediaDescriptor> {
        let media = message.media.as_ref()?;
        let mut descriptor = MediaDescriptor {
            kind: media.kind(),
            name: None,
            thumb_name: None,
            path: dest.to_path_buf(),
        };

        if !self.refresh.is_set() && is_populated(dest).await {
            let cached = scan_cached(dest).await;
            descriptor.name = cached.primary.as_deref().and_then(file_name_of);
            descriptor.thumb_name = cached.thumb.as_deref().and_then(file_name_of);
            tracing::debug!(message_id = message.id, dir = %dest.display(), "reusing cached media");
            return Some(descriptor);
        }

        let attachment = media.attachment();
        let Some(name) = self
            .fetch(message.id, &attachment.file, dest, None)
            .await
            .as_deref()
            .and_then(file_name_of)
        else {
            return Some(descriptor);
        };

        if let Some(thumb) = attachment.thumbs.first() {
            let thumb_name = format!("{THUMB_PREFIX}{name}");
            descriptor.thumb_name = self
                .fetch(message.id, thumb, dest, Some(&thumb_name))
                .await
                .as_deref()
                .and_then(file_name_of);
        }
        descriptor.name = Some(name);
        Some(descriptor)
    }

    /// Fetches the big avatar and, when offered, the small one. Callers
    /// decide whether a refetch is due.
    pub async fn cache_avatar(&self, user: &RawUser, dest: &Path) -> Option<AvatarDescriptor> {
        let photo = user.photo.as_ref()?;
        let mut descriptor = AvatarDescriptor {
            name: self
                .fetch(user.id, &photo.big, dest, None)
                .await
                .as_deref()
                .and_then(file_name_of),
            thumb_name: None,
        };
        if let Some(small) = &photo.small {
            descriptor.thumb_name = self
                .fetch(user.id, small, dest, None)
                .await
                .as_deref()
                .and_then(file_name_of);
        }
        Some(descriptor)
    }

    async fn fetch(
        &self,
        owner_id: i64,
        file: &FileRef,
        dest: &Path,
        file_name: Option<&str>,
    ) -> Option<PathBuf> {
        match self.platform.download_media(file, dest, file_name).await {
            Ok(path) => Some(path),
            Err(err) => {
                log_fetch_failure(owner_id, file, &err);
                None
            }
        }
    }
}

fn log_fetch_failure(owner_id: i64, file: &FileRef, err: &FetchError) {
    tracing::warn!(
        owner_id,
        file_id = %file.file_id,
        error = %err,
        "media fetch failed; leaving field unset"
    );
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}
