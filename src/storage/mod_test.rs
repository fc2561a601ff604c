use super::*;
use crate::test_helpers::FailingMedium;

fn temp_config(preference: StoragePreference, dir: &std::path::Path) -> StorageConfig {
    let mut config = StorageConfig::new(preference, dir.join("data"));
    config.session_dir = dir.to_path_buf();
    config
}

// =============================================================================
// selection
// =============================================================================

#[test]
fn auto_prefers_durable() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StorageBackend::open(&temp_config(StoragePreference::Auto, dir.path()));
    assert_eq!(backend.kind(), MediumKind::Durable);
}

#[test]
fn session_preference_skips_durable() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StorageBackend::open(&temp_config(StoragePreference::Session, dir.path()));
    assert_eq!(backend.kind(), MediumKind::Session);
}

#[test]
fn memory_preference_uses_memory() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StorageBackend::open(&temp_config(StoragePreference::Memory, dir.path()));
    assert_eq!(backend.kind(), MediumKind::Memory);
}

#[test]
fn unwritable_durable_falls_back_to_session() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let mut config = temp_config(StoragePreference::Auto, dir.path());
    config.data_dir = blocker;

    let backend = StorageBackend::open(&config);
    assert_eq!(backend.kind(), MediumKind::Session);
    assert!(backend.set("hero-title", "Hi"));
    assert_eq!(backend.get("hero-title").as_deref(), Some("Hi"));
}

#[test]
fn failing_candidates_fall_back_to_memory() {
    let backend = StorageBackend::select(vec![
        Box::new(FailingMedium(MediumKind::Durable)),
        Box::new(FailingMedium(MediumKind::Session)),
    ]);
    assert_eq!(backend.kind(), MediumKind::Memory);
    assert!(backend.set("hero-title", "Hi"));
    assert_eq!(backend.get("hero-title").as_deref(), Some("Hi"));
}

#[test]
fn probe_key_is_not_left_behind() {
    let backend = StorageBackend::select(vec![Box::new(MemoryMedium::new())]);
    assert!(backend.entries().is_empty());
    assert_eq!(backend.get(PROBE_KEY), None);
}

// =============================================================================
// reads and writes
// =============================================================================

#[test]
fn absent_markers_read_as_none() {
    let backend = StorageBackend::in_memory();
    for marker in ["", "null", "undefined"] {
        assert!(backend.set("hero-title", marker));
        assert_eq!(backend.get("hero-title"), None, "{marker:?}");
        assert_eq!(backend.get_or("hero-title", "fallback"), "fallback");
    }
}

#[test]
fn remove_missing_key_succeeds() {
    let backend = StorageBackend::in_memory();
    assert!(backend.remove("hero-title"));
}

#[test]
fn preview_truncates_long_values() {
    let long = "é".repeat(60);
    let shown = preview(&long);
    assert_eq!(shown.chars().count(), 53);
    assert!(shown.ends_with("..."));
    assert_eq!(preview("short"), "short");
}
