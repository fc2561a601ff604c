use super::*;
use crate::document::MemoryEntry;

fn temp_store() -> (tempfile::TempDir, DocumentStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::new(dir.path().join("data/website-data.json"));
    (dir, store)
}

// =============================================================================
// apply_update
// =============================================================================

#[test]
fn apply_update_routes_flat_keys() {
    let mut doc = Document::default();
    assert!(apply_update(&mut doc, "hero-title", "Hi".into()));
    assert!(apply_update(&mut doc, "hero-subtitle", "Sub".into()));
    assert!(apply_update(&mut doc, "birthday-message-title", "T".into()));
    assert!(apply_update(&mut doc, "birthday-message-text", "Body".into()));
    assert_eq!(doc.hero_title, "Hi");
    assert_eq!(doc.hero_subtitle, "Sub");
    assert_eq!(doc.birthday_message_title, "T");
    assert_eq!(doc.birthday_message_text, "Body");
}

#[test]
fn apply_update_creates_memory_entry() {
    let mut doc = Document::default();
    assert!(apply_update(&mut doc, "memory-text-3", "Beach".into()));
    assert_eq!(doc.memories[&3], MemoryEntry { title: None, text: Some("Beach".into()) });
}

#[test]
fn apply_update_ignores_malformed_memory_keys() {
    let mut doc = Document::defaults();
    let before = doc.memories.clone();
    for key in ["memory-title", "memory-title-x", "memory-title-1-2", "memory-caption-1", "memory-title-0"] {
        assert!(!apply_update(&mut doc, key, "bad".into()), "{key}");
    }
    assert_eq!(doc.memories, before);
}

#[test]
fn apply_update_ignores_unknown_and_photo_keys() {
    let mut doc = Document::defaults();
    let before = doc.clone();
    assert!(!apply_update(&mut doc, "hero-banner", "x".into()));
    assert!(!apply_update(&mut doc, "footer", "x".into()));
    assert!(!apply_update(&mut doc, "photo1.jpg", "data:".into()));
    assert_eq!(doc, before);
}

// =============================================================================
// load / save
// =============================================================================

#[tokio::test]
async fn load_missing_file_seeds_defaults() {
    let (_dir, store) = temp_store();
    let doc = store.load().await;
    assert!(doc.same_content(&Document::defaults()));
    assert!(doc.last_updated.is_some());
    assert!(store.path().exists());
}

#[tokio::test]
async fn load_corrupt_file_serves_defaults_without_overwriting() {
    let (_dir, store) = temp_store();
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), "{broken").unwrap();

    let doc = store.load().await;
    assert!(doc.same_content(&Document::defaults()));
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{broken");
}

#[tokio::test]
async fn save_writes_pretty_json_with_timestamp() {
    let (_dir, store) = temp_store();
    let mut doc = Document::default();
    store.save(&mut doc).await.unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\n  \"heroTitle\""), "{raw}");
    let parsed: Document = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.last_updated, doc.last_updated);
}

#[tokio::test]
async fn save_into_blocked_directory_errors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data"), "").unwrap();
    let store = DocumentStore::new(dir.path().join("data/website-data.json"));

    let err = store.save(&mut Document::default()).await.unwrap_err();
    assert!(matches!(err, StoreError::Io { .. }), "{err}");
}

// =============================================================================
// update_field / replace
// =============================================================================

#[tokio::test]
async fn update_field_on_fresh_store_keeps_defaults() {
    let (_dir, store) = temp_store();
    let doc = store.update_field("hero-title", "Hi".into()).await.unwrap();
    assert_eq!(doc.hero_title, "Hi");
    assert_eq!(doc.hero_subtitle, Document::defaults().hero_subtitle);
    assert_eq!(doc.memories.len(), 10);

    let reloaded = store.load().await;
    assert_eq!(reloaded, doc);
}

#[tokio::test]
async fn repeated_update_field_is_idempotent() {
    let (_dir, store) = temp_store();
    let once = store.update_field("memory-text-3", "Beach".into()).await.unwrap();
    let twice = store.update_field("memory-text-3", "Beach".into()).await.unwrap();
    assert!(once.same_content(&twice));
    assert_eq!(twice.memories[&3].text.as_deref(), Some("Beach"));
    assert!(store.load().await.same_content(&once));
}

#[tokio::test]
async fn update_field_with_ignored_key_still_refreshes_timestamp() {
    let (_dir, store) = temp_store();
    let first = store.load().await;
    let doc = store.update_field("memory-title-x", "bad".into()).await.unwrap();
    assert!(doc.same_content(&first));
    assert!(doc.last_updated.is_some());
}

#[tokio::test]
async fn replace_overwrites_whole_document() {
    let (_dir, store) = temp_store();
    store.load().await;

    let mut incoming = Document::default();
    incoming.hero_title = "Only".into();
    let saved = store.replace(incoming).await.unwrap();
    assert!(saved.memories.is_empty());

    let reloaded = store.load().await;
    assert_eq!(reloaded.hero_title, "Only");
    assert!(reloaded.memories.is_empty());
}
