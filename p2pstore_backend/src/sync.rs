use crate::config::P2pStorePaths;
use crate::database::Database;
use crate::grouping::{FollowOnGrouper, GroupingStep};
use crate::index::{IndexedGroup, ListingIndex};
use crate::platform::PlatformClient;
use crate::upsert::EntityUpserter;
use crate::utils::RefreshFlag;
use futures_util::StreamExt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("history feed failed: {0:#}")]
    History(#[source] anyhow::Error),

    #[error("failed to persist sync pass: {0:#}")]
    Persistence(#[source] anyhow::Error),

    #[error("failed to finalize sync pass: {0:#}")]
    Finalize(#[source] anyhow::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub received: usize,
    pub groups: usize,
    /// Messages without an author.
    pub dropped: usize,
    /// Caption-less messages no captioned message claimed.
    pub unanchored: usize,
    pub media: usize,
}

#[derive(Clone)]
pub struct SyncService {
    database: Database,
    paths: P2pStorePaths,
    platform: Arc<dyn PlatformClient>,
    refresh: RefreshFlag,
    index: ListingIndex,
}

impl SyncService {
    pub fn new(
        database: Database,
        paths: P2pStorePaths,
        platform: Arc<dyn PlatformClient>,
        refresh: RefreshFlag,
        index: ListingIndex,
    ) -> Self {
        Self {
            database,
            paths,
            platform,
            refresh,
            index,
        }
    }

    pub fn index(&self) -> &ListingIndex {
        &self.index
    }

    /// Streams the whole history of `chat_id` through grouping and upsert
    /// inside one transaction. Nothing is durable unless the pass completes;
    /// downloaded files stay on disk either way.
    pub async fn run_pass(&self, chat_id: &str) -> Result<SyncReport, SyncError> {
        tracing::info!(chat_id, refresh = self.refresh.is_set(), "sync pass starting");
        self.index.clear();

        let pass = self.database.begin_pass().map_err(SyncError::Persistence)?;
        let mut history = self
            .platform
            .history(chat_id)
            .await
            .map_err(SyncError::History)?;

        let upserter = EntityUpserter::new(
            &self.database,
            &self.paths,
            self.platform.as_ref(),
            self.refresh.clone(),
        );
        let mut grouper = FollowOnGrouper::new();
        let mut report = SyncReport::default();

        while let Some(next) = history.next().await {
            let message = next.map_err(SyncError::History)?;
            report.received += 1;
            let message_id = message.id;
            let group = match grouper.push(message) {
                GroupingStep::Buffered => continue,
                GroupingStep::Dropped => {
                    tracing::debug!(message_id, "message without author dropped");
                    report.dropped += 1;
                    continue;
                }
                GroupingStep::Flushed(group) => group,
            };

            let media = upserter
                .upsert_group(&group)
                .await
                .map_err(SyncError::Persistence)?
                .map(|outcome| outcome.media)
                .unwrap_or_default();
            tracing::debug!(
                message_id = group.id(),
                follow_ons = group.follow_ons.len(),
                media = media.len(),
                "listing stored"
            );
            report.groups += 1;
            report.media += media.len();
            self.index.append(IndexedGroup {
                media_dir: self.paths.message_dir(group.id()),
                group,
                media,
            });
        }

        let unanchored = grouper.finish();
        if !unanchored.is_empty() {
            let ids: Vec<i64> = unanchored.iter().map(|m| m.id).collect();
            tracing::info!(count = ids.len(), ?ids, "caption-less messages left without a listing");
        }
        report.unanchored = unanchored.len();

        pass.commit().map_err(SyncError::Finalize)?;
        tracing::info!(
            chat_id,
            received = report.received,
            groups = report.groups,
            dropped = report.dropped,
            unanchored = report.unanchored,
            media = report.media,
            "sync pass committed"
        );
        Ok(report)
    }
}
