use crate::config::P2pStorePaths;
use crate::database::models::{MessageRecord, ReactionRecord, UserRecord};
use crate::database::repositories::{
    MediaRepository, MessageRepository, ReactionRepository, UserRepository,
};
use crate::database::Database;
use crate::grouping::ListingGroup;
use crate::media_cache::{MediaCache, MediaDescriptor};
use crate::platform::{PlatformClient, RawMessage, RawUser};
use crate::utils::RefreshFlag;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub user_created: bool,
    pub message_created: bool,
    pub reactions_replaced: bool,
    /// False when existing media rows were kept as they were.
    pub media_refreshed: bool,
    pub media: Vec<MediaDescriptor>,
}

/// Reconciles one listing group against the store, keyed by platform id.
pub struct EntityUpserter<'a> {
    database: &'a Database,
    paths: &'a P2pStorePaths,
    cache: MediaCache<'a>,
    refresh: RefreshFlag,
}

impl<'a> EntityUpserter<'a> {
    pub fn new(
        database: &'a Database,
        paths: &'a P2pStorePaths,
        platform: &'a dyn PlatformClient,
        refresh: RefreshFlag,
    ) -> Self {
        Self {
            database,
            paths,
            cache: MediaCache::new(platform, refresh.clone()),
            refresh,
        }
    }

    /// Returns `None` when the primary message has no author.
    pub async fn upsert_group(&self, group: &ListingGroup) -> Result<Option<UpsertOutcome>> {
        let primary = &group.primary;
        let Some(author) = primary.from_user.as_ref() else {
            tracing::debug!(message_id = primary.id, "group without author skipped");
            return Ok(None);
        };

        let mut outcome = UpsertOutcome {
            user_created: self.upsert_user(author).await?,
            ..UpsertOutcome::default()
        };

        let (message, created) = self.ensure_message(primary, author.id)?;
        outcome.message_created = created;

        if !primary.reactions.is_empty() {
            self.replace_reactions(primary)?;
            outcome.reactions_replaced = true;
        }

        let existing = self
            .database
            .with_repositories(|repos| repos.media().list_for_message(primary.id))?;
        if (message.media_synced || !existing.is_empty()) && !self.refresh.is_set() {
            outcome.media = existing.iter().map(MediaDescriptor::from_record).collect();
            return Ok(Some(outcome));
        }

        let mut media = Vec::new();
        for message in group.messages() {
            let dest = self.paths.message_dir(message.id);
            match self.cache.cache_message_media(message, &dest).await {
                Some(descriptor) if descriptor.name.is_some() => media.push(descriptor),
                Some(_) => {
                    tracing::debug!(message_id = message.id, "attachment unavailable; no media row")
                }
                None => {}
            }
        }
        let records: Vec<_> = media.iter().map(|m| m.to_record(primary.id)).collect();
        self.database
            .with_repositories(|repos| {
                repos.media().replace_for_message(primary.id, &records)?;
                repos.messages().mark_media_synced(primary.id)
            })
            .with_context(|| format!("failed to store media for message {}", primary.id))?;

        outcome.media_refreshed = true;
        outcome.media = media;
        Ok(Some(outcome))
    }

    /// Last-write-wins on every profile field; the avatar is fetched only
    /// when none is cached yet or a refresh is forced.
    async fn upsert_user(&self, author: &RawUser) -> Result<bool> {
        let existing = self
            .database
            .with_repositories(|repos| repos.users().get(author.id))?;
        let created = existing.is_none();
        let mut record = existing.unwrap_or_else(|| UserRecord::new(author.id));

        record.first_name = author.first_name.clone();
        record.last_name = author.last_name.clone();
        record.username = author.username.clone();
        record.is_deleted = author.is_deleted;
        record.status = author.status.clone();
        record.last_online_date = author.last_online_date.map(|d| d.to_rfc3339());

        if record.media_name.is_none() || self.refresh.is_set() {
            let dest = self.paths.user_dir(author.id);
            // A failed refetch keeps whatever was cached before.
            if let Some(avatar) = self.cache.cache_avatar(author, &dest).await {
                record.media_name = avatar.name.or(record.media_name);
                record.thumb_name = avatar.thumb_name.or(record.thumb_name);
            }
        }

        self.database
            .with_repositories(|repos| repos.users().upsert(&record))
            .with_context(|| format!("failed to store user {}", author.id))?;
        Ok(created)
    }

    /// Caption and timestamps are fixed when the row is first created.
    /// Returns the stored row and whether this call created it.
    fn ensure_message(&self, message: &RawMessage, user_id: i64) -> Result<(MessageRecord, bool)> {
        self.database
            .with_repositories(|repos| {
                let messages = repos.messages();
                if let Some(existing) = messages.get(message.id)? {
                    return Ok((existing, false));
                }
                let record = MessageRecord {
                    id: message.id,
                    caption: message.body().unwrap_or_default().to_string(),
                    date: Some(message.date.to_rfc3339()),
                    edit_date: message.edit_date.map(|d| d.to_rfc3339()),
                    is_deleted: false,
                    user_id: Some(user_id),
                    media_synced: false,
                };
                messages.create(&record)?;
                Ok((record, true))
            })
            .with_context(|| format!("failed to store message {}", message.id))
    }

    fn replace_reactions(&self, message: &RawMessage) -> Result<()> {
        let records: Vec<ReactionRecord> = message
            .reactions
            .iter()
            .map(|reaction| ReactionRecord {
                id: None,
                message_id: message.id,
                emoji: Some(reaction.emoji.clone()),
                count: reaction.count,
            })
            .collect();
        self.database
            .with_repositories(|repos| repos.reactions().replace_for_message(message.id, &records))
            .with_context(|| format!("failed to store reactions for message {}", message.id))
    }
}
