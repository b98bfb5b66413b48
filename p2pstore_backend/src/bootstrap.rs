use crate::config::{P2pStoreConfig, PLACEHOLDER_PNG};
use crate::database::Database;
use anyhow::{Context, Result};
use std::fs;

pub struct BootstrapResources {
    pub directories_created: Vec<String>,
    pub database_initialized: bool,
    pub database: Database,
}

pub async fn initialize(config: &P2pStoreConfig) -> Result<BootstrapResources> {
    let mut directories_created = Vec::new();
    create_dir_if_missing(&config.paths.base, &mut directories_created)?;
    create_dir_if_missing(&config.paths.downloads_dir, &mut directories_created)?;
    create_dir_if_missing(&config.paths.messages_dir, &mut directories_created)?;
    create_dir_if_missing(&config.paths.users_dir, &mut directories_created)?;

    let database = Database::connect(&config.paths)?;
    let database_initialized = database.ensure_migrations()?;

    if !config.paths.placeholder_image.exists() {
        fs::write(&config.paths.placeholder_image, PLACEHOLDER_PNG).with_context(|| {
            format!(
                "failed to write placeholder image {}",
                config.paths.placeholder_image.display()
            )
        })?;
        tracing::info!(
            path = %config.paths.placeholder_image.display(),
            "placeholder image written"
        );
    }

    Ok(BootstrapResources {
        directories_created,
        database_initialized,
        database,
    })
}

fn create_dir_if_missing(path: &std::path::Path, created: &mut Vec<String>) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory {}", path.display()))?;
        created.push(path.display().to_string());
    }
    Ok(())
}
