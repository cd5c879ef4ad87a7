use crate::config::MediaConfig;
use crate::services::media_store::MediaStore;
use std::sync::Arc;
use tracing::{error, info};

/// Opens the media store and prepares its directory layout.
///
/// A failed initialization is logged and the store is returned anyway; the
/// first ingest into a missing directory reports the underlying error.
pub async fn setup_media_store(config: &MediaConfig) -> Arc<MediaStore> {
    info!(
        "🗂️  Media Storage: {} (Index: {})",
        config.media_root.display(),
        config.index_file.display()
    );

    let store = MediaStore::local(&config.media_root, &config.index_file);

    match store.init().await {
        Ok(()) => info!("✅ Media storage is ready"),
        Err(e) => error!("❌ Failed to initialize media storage: {}", e),
    }

    Arc::new(store)
}
