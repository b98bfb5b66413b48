use crate::api;
use crate::bootstrap::{self, BootstrapResources};
use crate::config::P2pStoreConfig;
use crate::database::Database;
use crate::index::ListingIndex;
use crate::platform::{ExportArchive, PlatformClient};
use crate::sync::{SyncError, SyncReport, SyncService};
use crate::utils::RefreshFlag;
use anyhow::Result;
use std::sync::Arc;

/// Bootstraps the backend once and owns the handles shared by the sync
/// pass and the read API.
pub struct P2pStoreNode {
    config: P2pStoreConfig,
    bootstrap: BootstrapResources,
    refresh: RefreshFlag,
    sync: SyncService,
}

impl P2pStoreNode {
    /// Uses the chat export under `paths.export_dir` as the history source.
    pub async fn start(config: P2pStoreConfig) -> Result<Self> {
        let platform = Arc::new(ExportArchive::new(&config.paths.export_dir));
        Self::start_with_platform(config, platform).await
    }

    pub async fn start_with_platform(
        config: P2pStoreConfig,
        platform: Arc<dyn PlatformClient>,
    ) -> Result<Self> {
        let bootstrap = bootstrap::initialize(&config).await?;
        let refresh = RefreshFlag::new(config.sync.redownload);
        let sync = SyncService::new(
            bootstrap.database.clone(),
            config.paths.clone(),
            platform,
            refresh.clone(),
            ListingIndex::new(),
        );

        tracing::info!(
            directories_created = ?bootstrap.directories_created,
            database_initialized = bootstrap.database_initialized,
            chat_id = %config.sync.chat_id,
            "p2pstore node initialized"
        );

        Ok(Self {
            config,
            bootstrap,
            refresh,
            sync,
        })
    }

    /// Runs one full pass over the configured chat.
    pub async fn run_sync(&self) -> Result<SyncReport, SyncError> {
        self.sync.run_pass(&self.config.sync.chat_id).await
    }

    /// Syncs once, then serves the read API until shutdown. A failed pass
    /// is logged and the listings it indexed stay readable.
    pub async fn run_http_server(&self) -> Result<()> {
        if let Err(err) = self.run_sync().await {
            tracing::error!(error = %err, "initial sync pass failed");
        }
        api::serve_http(self.config.clone(), self.index()).await
    }

    pub fn config(&self) -> &P2pStoreConfig {
        &self.config
    }

    pub fn database(&self) -> Database {
        self.bootstrap.database.clone()
    }

    pub fn index(&self) -> ListingIndex {
        self.sync.index().clone()
    }

    pub fn refresh_flag(&self) -> RefreshFlag {
        self.refresh.clone()
    }
}
