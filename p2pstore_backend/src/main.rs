use anyhow::Result;
use clap::{Parser, Subcommand};
use p2pstore_backend::config::P2pStoreConfig;
use p2pstore_backend::node::P2pStoreNode;
use p2pstore_backend::telemetry;
use p2pstore_backend::utils;

#[derive(Parser)]
#[command(author, version, about = "P2P store listing sync and read API")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Chat to synchronize (overrides P2PSTORE_CHAT_ID)
    #[arg(long, global = true)]
    chat: Option<String>,

    /// Refetch every attachment and avatar even when already cached
    #[arg(long, global = true)]
    redownload: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run one sync pass, then serve the read API
    Serve,
    /// Run one sync pass and exit
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::print_banner();
    telemetry::init_tracing();

    let args = Args::parse();

    let mut config = P2pStoreConfig::from_env()?;
    if let Some(chat) = args.chat {
        config.sync.chat_id = chat;
    }
    config.sync.redownload |= args.redownload;

    let node = P2pStoreNode::start(config).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => node.run_http_server().await,
        Command::Sync => {
            let report = node.run_sync().await?;
            tracing::info!(
                groups = report.groups,
                media = report.media,
                "sync finished"
            );
            Ok(())
        }
    }
}
