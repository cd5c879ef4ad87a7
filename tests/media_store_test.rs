use async_trait::async_trait;
use media_store::models::{MediaCategory, MediaType};
use media_store::services::media_store::{MediaError, MediaStore};
use media_store::services::storage::{BlobStore, LocalBlobStore};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Layout {
    _dir: TempDir,
    media_root: PathBuf,
    index_file: PathBuf,
}

fn layout() -> Layout {
    let dir = tempfile::tempdir().unwrap();
    let media_root = dir.path().join("public").join("media");
    let index_file = dir.path().join("data").join("media.json");
    Layout {
        _dir: dir,
        media_root,
        index_file,
    }
}

async fn setup() -> (Layout, MediaStore) {
    let layout = layout();
    let store = MediaStore::local(&layout.media_root, &layout.index_file);
    store.init().await.unwrap();
    (layout, store)
}

fn blob_path(layout: &Layout, category: MediaCategory, filename: &str) -> PathBuf {
    layout.media_root.join(category.as_str()).join(filename)
}

#[tokio::test]
async fn test_init_creates_layout() {
    let (layout, _store) = setup().await;

    for category in MediaCategory::ALL {
        assert!(layout.media_root.join(category.as_str()).is_dir());
    }
    assert_eq!(std::fs::read_to_string(&layout.index_file).unwrap(), "[]");
}

#[tokio::test]
async fn test_reinit_preserves_existing_index() {
    let (layout, store) = setup().await;
    store
        .save_media(b"one", "a.png", MediaCategory::Events, MediaType::Image)
        .await
        .unwrap();
    store
        .save_media(b"two", "b.mp4", MediaCategory::Blogs, MediaType::Video)
        .await
        .unwrap();
    let before = std::fs::read_to_string(&layout.index_file).unwrap();

    // Same process and a fresh "restart"
    store.init().await.unwrap();
    let restarted = MediaStore::local(&layout.media_root, &layout.index_file);
    restarted.init().await.unwrap();

    assert_eq!(std::fs::read_to_string(&layout.index_file).unwrap(), before);
    assert_eq!(restarted.get_media_db().await, store.get_media_db().await);
    assert_eq!(restarted.get_media_db().await.len(), 2);
}

#[tokio::test]
async fn test_save_round_trip() {
    let (layout, store) = setup().await;
    let data = [1u8, 2, 3];

    let item = store
        .save_media(&data, "photo.PNG", MediaCategory::Events, MediaType::Image)
        .await
        .unwrap();

    let all = store.get_media_db().await;
    assert_eq!(all, vec![item.clone()]);
    assert_eq!(item.size, 3);
    assert_eq!(item.category, MediaCategory::Events);
    assert_eq!(item.media_type, MediaType::Image);
    assert_eq!(item.original_name, "photo.PNG");
    assert_eq!(item.mime_type, "image/png");
    assert_eq!(item.filename, format!("{}_photo.PNG", item.id));
    assert_eq!(item.url, format!("/media/events/{}", item.filename));

    let on_disk = std::fs::read(blob_path(&layout, MediaCategory::Events, &item.filename)).unwrap();
    assert_eq!(on_disk, data);
}

#[tokio::test]
async fn test_index_is_pretty_printed_camel_case() {
    let (layout, store) = setup().await;
    store
        .save_media(b"x", "a.gif", MediaCategory::Members, MediaType::Image)
        .await
        .unwrap();

    let raw = std::fs::read_to_string(&layout.index_file).unwrap();
    assert!(raw.starts_with("[\n  {\n    \"id\": "));
    assert!(raw.contains("\"originalName\": \"a.gif\""));
    assert!(raw.contains("\"mimeType\": \"image/gif\""));
    assert!(raw.contains("\"type\": \"image\""));
    assert!(raw.contains("\"uploadedAt\": "));
}

#[tokio::test]
async fn test_filename_sanitization() {
    let (layout, store) = setup().await;

    let item = store
        .save_media(b"jpg", "my photo #1.jpg", MediaCategory::Projects, MediaType::Image)
        .await
        .unwrap();
    assert_eq!(item.filename, format!("{}_my_photo__1.jpg", item.id));

    let traversal = store
        .save_media(b"evil", "../../escape.png", MediaCategory::Projects, MediaType::Image)
        .await
        .unwrap();
    assert_eq!(traversal.filename, format!("{}_.._.._escape.png", traversal.id));
    assert!(blob_path(&layout, MediaCategory::Projects, &traversal.filename).is_file());

    let suffix = &traversal.filename[traversal.id.len() + 1..];
    assert!(
        suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    );
}

#[tokio::test]
async fn test_identical_names_get_distinct_ids_and_filenames() {
    let (_layout, store) = setup().await;

    let mut items = Vec::new();
    for _ in 0..5 {
        items.push(
            store
                .save_media(b"same", "same.png", MediaCategory::Events, MediaType::Image)
                .await
                .unwrap(),
        );
    }

    for pair in items.windows(2) {
        let a: i64 = pair[0].id.parse().unwrap();
        let b: i64 = pair[1].id.parse().unwrap();
        assert!(b > a, "ids must increase: {} then {}", a, b);
        assert_ne!(pair[0].filename, pair[1].filename);
    }
    assert_eq!(store.get_media_db().await.len(), 5);
}

#[tokio::test]
async fn test_category_filter_preserves_order() {
    let (_layout, store) = setup().await;
    let plan = [
        MediaCategory::Events,
        MediaCategory::Blogs,
        MediaCategory::Events,
        MediaCategory::Members,
        MediaCategory::Events,
        MediaCategory::Blogs,
    ];
    for (i, category) in plan.iter().enumerate() {
        store
            .save_media(&[i as u8], &format!("f{}.png", i), *category, MediaType::Image)
            .await
            .unwrap();
    }

    let all = store.get_media_db().await;
    for category in MediaCategory::ALL {
        let expected: Vec<_> = all
            .iter()
            .filter(|item| item.category == category)
            .cloned()
            .collect();
        assert_eq!(store.get_media_by_category(category).await, expected);
    }

    let events = store.get_media_by_category(MediaCategory::Events).await;
    let names: Vec<_> = events.iter().map(|i| i.original_name.as_str()).collect();
    assert_eq!(names, ["f0.png", "f2.png", "f4.png"]);
}

#[tokio::test]
async fn test_other_category_is_empty() {
    let (_layout, store) = setup().await;
    store
        .save_media(b"1", "a.png", MediaCategory::Projects, MediaType::Image)
        .await
        .unwrap();
    store
        .save_media(b"2", "b.png", MediaCategory::Projects, MediaType::Image)
        .await
        .unwrap();

    assert!(store.get_media_by_category(MediaCategory::Members).await.is_empty());
    assert_eq!(store.get_media_by_category(MediaCategory::Projects).await.len(), 2);
}

#[tokio::test]
async fn test_mime_derivation() {
    let (_layout, store) = setup().await;
    let cases = [
        ("a.jpg", "image/jpeg"),
        ("a.jpeg", "image/jpeg"),
        ("a.png", "image/png"),
        ("a.gif", "image/gif"),
        ("a.webp", "image/webp"),
        ("a.mp4", "video/mp4"),
        ("a.webm", "video/webm"),
        ("a.mov", "video/quicktime"),
        ("a.xyz", "application/octet-stream"),
        ("no_extension", "application/octet-stream"),
    ];

    for (name, mime) in cases {
        let item = store
            .save_media(b"data", name, MediaCategory::Blogs, MediaType::Reel)
            .await
            .unwrap();
        assert_eq!(item.mime_type, mime, "mime for {}", name);
    }
}

#[tokio::test]
async fn test_delete_removes_blob_and_entry_once() {
    let (layout, store) = setup().await;
    let keep = store
        .save_media(b"keep", "keep.png", MediaCategory::Events, MediaType::Image)
        .await
        .unwrap();
    let gone = store
        .save_media(b"gone", "gone.png", MediaCategory::Events, MediaType::Image)
        .await
        .unwrap();

    let removed = store.delete_media(&gone.id).await.unwrap();
    assert_eq!(removed, gone);
    assert!(!blob_path(&layout, MediaCategory::Events, &gone.filename).exists());
    assert_eq!(store.get_media_db().await, vec![keep.clone()]);

    let index_after_first = std::fs::read_to_string(&layout.index_file).unwrap();
    let second = store.delete_media(&gone.id).await;
    assert!(matches!(second, Err(MediaError::NotFound(id)) if id == gone.id));
    assert_eq!(
        std::fs::read_to_string(&layout.index_file).unwrap(),
        index_after_first
    );
    assert!(blob_path(&layout, MediaCategory::Events, &keep.filename).exists());
}

#[tokio::test]
async fn test_delete_unknown_id_on_empty_store() {
    let (layout, store) = setup().await;

    let result = store.delete_media("999999").await;
    assert!(matches!(result, Err(MediaError::NotFound(_))));
    assert_eq!(std::fs::read_to_string(&layout.index_file).unwrap(), "[]");
}

#[tokio::test]
async fn test_delete_when_blob_already_missing_keeps_entry() {
    let (layout, store) = setup().await;
    let item = store
        .save_media(b"x", "x.png", MediaCategory::Members, MediaType::Image)
        .await
        .unwrap();
    std::fs::remove_file(blob_path(&layout, MediaCategory::Members, &item.filename)).unwrap();
    let index_before = std::fs::read_to_string(&layout.index_file).unwrap();

    let result = store.delete_media(&item.id).await;
    assert!(
        matches!(&result, Err(MediaError::Io(e)) if e.kind() == io::ErrorKind::NotFound),
        "unexpected result: {:?}",
        result
    );
    assert_eq!(store.get_media_db().await, vec![item.clone()]);
    assert_eq!(
        std::fs::read_to_string(&layout.index_file).unwrap(),
        index_before
    );

    let report = store.find_orphans().await.unwrap();
    assert_eq!(report.missing_blobs, vec![item]);
}

/// Local storage whose removals always fail with a permission error.
struct UndeletableBlobs(LocalBlobStore);

#[async_trait]
impl BlobStore for UndeletableBlobs {
    async fn create_dir(&self, dir: &str) -> io::Result<()> {
        self.0.create_dir(dir).await
    }

    async fn write(&self, key: &str, data: &[u8]) -> io::Result<()> {
        self.0.write(key, data).await
    }

    async fn remove(&self, _key: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    async fn exists(&self, key: &str) -> io::Result<bool> {
        self.0.exists(key).await
    }

    async fn list(&self, dir: &str) -> io::Result<Vec<String>> {
        self.0.list(dir).await
    }
}

#[tokio::test]
async fn test_failed_blob_removal_leaves_index_unchanged() {
    let layout = layout();
    let store = MediaStore::new(
        Arc::new(UndeletableBlobs(LocalBlobStore::new(&layout.media_root))),
        &layout.index_file,
    );
    store.init().await.unwrap();

    let item = store
        .save_media(b"stuck", "stuck.webm", MediaCategory::Blogs, MediaType::Video)
        .await
        .unwrap();

    let result = store.delete_media(&item.id).await;
    assert!(matches!(result, Err(MediaError::Io(_))));
    assert_eq!(store.get_media_db().await, vec![item]);
}

#[tokio::test]
async fn test_missing_or_corrupt_index_lists_empty() {
    let layout = layout();
    let store = MediaStore::local(&layout.media_root, &layout.index_file);

    // Never initialized: no index file at all
    assert!(store.get_media_db().await.is_empty());
    assert!(store.get_media("1").await.is_none());

    store.init().await.unwrap();
    std::fs::write(&layout.index_file, "{ not json").unwrap();
    assert!(store.get_media_db().await.is_empty());
    assert!(
        store
            .get_media_by_category(MediaCategory::Events)
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_corrupt_index_is_not_overwritten_by_ingest() {
    let (layout, store) = setup().await;
    std::fs::write(&layout.index_file, "{ not json").unwrap();

    let result = store
        .save_media(b"x", "x.png", MediaCategory::Events, MediaType::Image)
        .await;
    assert!(matches!(result, Err(MediaError::CorruptIndex(_))));
    assert_eq!(
        std::fs::read_to_string(&layout.index_file).unwrap(),
        "{ not json"
    );
}

#[tokio::test]
async fn test_ingest_creates_missing_category_directory() {
    let layout = layout();
    let store = MediaStore::local(&layout.media_root, &layout.index_file);

    let item = store
        .save_media(b"lazy", "lazy.png", MediaCategory::Projects, MediaType::Image)
        .await
        .unwrap();

    assert!(blob_path(&layout, MediaCategory::Projects, &item.filename).is_file());
    assert_eq!(store.get_media_db().await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_saves_are_all_indexed() {
    let (layout, store) = setup().await;
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for i in 0..20u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .save_media(&[i], &format!("c{}.png", i), MediaCategory::Events, MediaType::Image)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let all = store.get_media_db().await;
    assert_eq!(all.len(), 20);

    let mut ids: Vec<_> = all.iter().map(|i| i.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);

    let blobs = std::fs::read_dir(layout.media_root.join("events")).unwrap().count();
    assert_eq!(blobs, 20);
}

#[tokio::test]
async fn test_get_media_by_id() {
    let (_layout, store) = setup().await;
    let item = store
        .save_media(b"x", "x.mov", MediaCategory::Events, MediaType::Reel)
        .await
        .unwrap();

    assert_eq!(store.get_media(&item.id).await, Some(item));
    assert_eq!(store.get_media("nope").await, None);
}

#[tokio::test]
async fn test_find_orphans() {
    let (layout, store) = setup().await;
    let intact = store
        .save_media(b"ok", "ok.png", MediaCategory::Events, MediaType::Image)
        .await
        .unwrap();
    let lost = store
        .save_media(b"lost", "lost.png", MediaCategory::Blogs, MediaType::Image)
        .await
        .unwrap();

    assert!(store.find_orphans().await.unwrap().is_clean());

    std::fs::remove_file(blob_path(&layout, MediaCategory::Blogs, &lost.filename)).unwrap();
    std::fs::write(layout.media_root.join("members").join("stray.png"), b"?").unwrap();

    let report = store.find_orphans().await.unwrap();
    assert_eq!(report.unindexed_blobs, vec!["members/stray.png".to_string()]);
    assert_eq!(report.missing_blobs, vec![lost]);
    assert!(Path::new(&blob_path(&layout, MediaCategory::Events, &intact.filename)).exists());
}
