use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use media_store::config::MediaConfig;
use media_store::models::MediaCategory;
use media_store::services::media_store::{MediaError, MediaStore};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Maintenance commands for the media store
#[derive(Parser)]
#[command(name = "media_admin", version)]
struct Cli {
    /// Overrides MEDIA_ROOT
    #[arg(long)]
    media_root: Option<PathBuf>,

    /// Overrides MEDIA_INDEX_FILE
    #[arg(long)]
    index_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the category directories and an empty index
    Init,
    /// Print indexed media as JSON
    List {
        #[arg(long)]
        category: Option<MediaCategory>,
    },
    /// Remove a blob and its index entry
    Delete { id: String },
    /// Report blobs without index entries and entries without blobs
    Orphans,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_admin=info,media_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = MediaConfig::from_env();
    if let Some(root) = cli.media_root {
        config.media_root = root;
    }
    if let Some(index) = cli.index_file {
        config.index_file = index;
    }

    let store = MediaStore::local(&config.media_root, &config.index_file);

    match cli.command {
        Command::Init => {
            store.init().await?;
            info!("✅ Initialized media storage at {}", config.media_root.display());
        }
        Command::List { category } => {
            let items = match category {
                Some(c) => store.get_media_by_category(c).await,
                None => store.get_media_db().await,
            };
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Command::Delete { id } => match store.delete_media(&id).await {
            Ok(item) => info!("🗑️  Deleted {} ({})", item.id, item.url),
            Err(MediaError::NotFound(id)) => {
                error!("❌ No media with id {}", id);
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },
        Command::Orphans => {
            let report = store.find_orphans().await?;
            if report.is_clean() {
                info!("✅ Index and blobs agree");
            }
            for key in &report.unindexed_blobs {
                warn!("Blob without index entry: {}", key);
            }
            for item in &report.missing_blobs {
                warn!("Index entry {} has no blob at {}", item.id, item.url);
            }
        }
    }

    Ok(())
}
