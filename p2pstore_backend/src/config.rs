use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHAT_ID: &str = "@bitcoinp2pmarketplace";
pub const DEFAULT_DB_NAME: &str = "database.db";
pub const PLACEHOLDER_IMAGE: &str = "shopping-bag.png";
/// Served for listings without cached files.
pub const PLACEHOLDER_PNG: &[u8] = include_bytes!("../assets/shopping-bag.png");

#[derive(Debug, Clone)]
pub struct P2pStoreConfig {
    pub api_port: u16,
    pub paths: P2pStorePaths,
    pub sync: SyncConfig,
    pub cors_origins: Vec<String>,
}

impl P2pStoreConfig {
    pub fn from_env() -> Result<Self> {
        let base = env::var("P2PSTORE_PATH").unwrap_or_else(|_| ".".into());
        let db_name = env::var("P2PSTORE_DB_NAME").unwrap_or_else(|_| DEFAULT_DB_NAME.into());
        let mut paths = P2pStorePaths::with_db_name(base, &db_name)?;
        if let Some(export_dir) = env::var("P2PSTORE_EXPORT_DIR")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
        {
            paths.export_dir = PathBuf::from(export_dir);
        }
        let api_port = env::var("P2PSTORE_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8001);
        let cors_origins = env::var("P2PSTORE_CORS_ORIGINS")
            .ok()
            .map(|raw| split_list(&raw))
            .unwrap_or_else(default_cors_origins);
        Ok(Self {
            api_port,
            paths,
            sync: SyncConfig::from_env(),
            cors_origins,
        })
    }

    pub fn new(api_port: u16, paths: P2pStorePaths) -> Self {
        Self {
            api_port,
            paths,
            sync: SyncConfig::default(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub chat_id: String,
    /// Initial value of the process-wide force-refresh flag.
    pub redownload: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chat_id: DEFAULT_CHAT_ID.to_string(),
            redownload: false,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let chat_id = env::var("P2PSTORE_CHAT_ID")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_ID.to_string());
        let redownload = env::var("P2PSTORE_REDOWNLOAD")
            .ok()
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);
        Self {
            chat_id,
            redownload,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct P2pStorePaths {
    pub base: PathBuf,
    pub db_path: PathBuf,
    pub downloads_dir: PathBuf,
    pub messages_dir: PathBuf,
    pub users_dir: PathBuf,
    pub placeholder_image: PathBuf,
    pub export_dir: PathBuf,
}

impl P2pStorePaths {
    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        Self::with_db_name(base, DEFAULT_DB_NAME)
    }

    pub fn with_db_name<P: AsRef<Path>>(base: P, db_name: &str) -> Result<Self> {
        if db_name.trim().is_empty() {
            return Err(anyhow!("database name may not be empty"));
        }
        let base = base.as_ref().to_path_buf();
        let db_path = base.join(db_name);
        let downloads_dir = base.join("downloads");
        let messages_dir = downloads_dir.join("messages");
        let users_dir = downloads_dir.join("users");
        let placeholder_image = downloads_dir.join(PLACEHOLDER_IMAGE);
        let export_dir = base.join("export");

        Ok(Self {
            base,
            db_path,
            downloads_dir,
            messages_dir,
            users_dir,
            placeholder_image,
            export_dir,
        })
    }

    /// Cache directory for the attachment of one message.
    pub fn message_dir(&self, message_id: i64) -> PathBuf {
        self.messages_dir.join(message_id.to_string())
    }

    /// Cache directory for one user's avatar and its small thumbnail.
    pub fn user_dir(&self, user_id: i64) -> PathBuf {
        self.users_dir.join(user_id.to_string())
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
    ]
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}
