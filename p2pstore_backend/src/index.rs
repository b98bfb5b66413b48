//! Listings served by the read API. Rebuilt from scratch by every sync pass
//! and never restored from the store.

use crate::grouping::ListingGroup;
use crate::media_cache::MediaDescriptor;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Serialize)]
pub struct IndexedGroup {
    #[serde(flatten)]
    pub group: ListingGroup,
    pub media: Vec<MediaDescriptor>,
    /// Cache directory of the primary message.
    #[serde(skip)]
    pub media_dir: PathBuf,
}

impl IndexedGroup {
    pub fn message_id(&self) -> i64 {
        self.group.id()
    }

    /// Directories that may hold files for this listing: the primary's own,
    /// then each stored attachment's, without repeats.
    pub fn candidate_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = vec![self.media_dir.as_path()];
        for descriptor in &self.media {
            if !dirs.contains(&descriptor.path.as_path()) {
                dirs.push(descriptor.path.as_path());
            }
        }
        dirs
    }
}

/// Append-only while a pass runs: readers may observe a partial list.
#[derive(Debug, Clone, Default)]
pub struct ListingIndex {
    groups: Arc<RwLock<Vec<IndexedGroup>>>,
}

impl ListingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn append(&self, group: IndexedGroup) {
        self.write().push(group);
    }

    /// Known message ids, ascending.
    pub fn message_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.read().iter().map(IndexedGroup::message_id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn get(&self, message_id: i64) -> Option<IndexedGroup> {
        self.read()
            .iter()
            .find(|group| group.message_id() == message_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicking writer can only leave a shorter list behind.
    fn read(&self) -> RwLockReadGuard<'_, Vec<IndexedGroup>> {
        self.groups.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<IndexedGroup>> {
        self.groups.write().unwrap_or_else(PoisonError::into_inner)
    }
}
