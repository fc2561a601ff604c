use super::*;

// =============================================================================
// defaults
// =============================================================================

#[test]
fn defaults_have_ten_memories() {
    let doc = Document::defaults();
    assert_eq!(doc.hero_title, "Happy Birthday!");
    assert_eq!(doc.memories.len(), 10);
    assert_eq!(doc.memories[&1].title.as_deref(), Some("Childhood Memories"));
    assert_eq!(doc.memories[&10].title.as_deref(), Some("Dreams & Aspirations"));
    assert!(doc.last_updated.is_none());
}

// =============================================================================
// serde
// =============================================================================

#[test]
fn document_serializes_camel_case_with_string_ids() {
    let mut doc = Document::default();
    doc.hero_title = "Hi".into();
    doc.memories.insert(3, MemoryEntry { title: None, text: Some("Remember".into()) });
    doc.last_updated = Some("2026-01-01T00:00:00Z".into());

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["heroTitle"], "Hi");
    assert_eq!(value["memories"]["3"]["text"], "Remember");
    assert!(value["memories"]["3"].get("title").is_none());
    assert_eq!(value["lastUpdated"], "2026-01-01T00:00:00Z");
}

#[test]
fn document_parses_partial_body() {
    let doc: Document = serde_json::from_str(r#"{"heroTitle":"Hey","memories":{"2":{"title":"T"}}}"#).unwrap();
    assert_eq!(doc.hero_title, "Hey");
    assert_eq!(doc.hero_subtitle, "");
    assert_eq!(doc.memories[&2].title.as_deref(), Some("T"));
    assert!(doc.memories[&2].text.is_none());
}

#[test]
fn document_accepts_null_memory_fields() {
    let doc: Document = serde_json::from_str(r#"{"memories":{"1":{"title":null,"text":"x"}}}"#).unwrap();
    assert!(doc.memories[&1].title.is_none());
    assert_eq!(doc.memories[&1].text.as_deref(), Some("x"));
}

// =============================================================================
// apply / to_entries
// =============================================================================

#[test]
fn apply_sets_flat_and_memory_fields() {
    let mut doc = Document::default();
    assert!(doc.apply(&FieldKey::Flat(FlatField::MessageText), "Love you".into()));
    assert!(doc.apply(&FieldKey::memory(MemoryField::Title, 4), "Trip".into()));
    assert!(!doc.apply(&FieldKey::Photo(4), "data:image/jpeg;base64,AA".into()));

    assert_eq!(doc.birthday_message_text, "Love you");
    assert_eq!(doc.memories[&4], MemoryEntry { title: Some("Trip".into()), text: None });
}

#[test]
fn to_entries_skips_empty_values() {
    let mut doc = Document::default();
    doc.hero_title = "Hi".into();
    doc.memories.insert(2, MemoryEntry { title: Some(String::new()), text: Some("Beach".into()) });

    let entries = doc.to_entries();
    assert_eq!(
        entries,
        vec![
            (FieldKey::Flat(FlatField::HeroTitle), "Hi".to_owned()),
            (FieldKey::memory(MemoryField::Text, 2), "Beach".to_owned()),
        ]
    );
}

#[test]
fn same_content_ignores_last_updated() {
    let mut a = Document::defaults();
    let mut b = Document::defaults();
    a.last_updated = Some("one".into());
    b.last_updated = Some("two".into());
    assert!(a.same_content(&b));
    b.hero_title = "changed".into();
    assert!(!a.same_content(&b));
}

// =============================================================================
// snapshot
// =============================================================================

#[test]
fn snapshot_into_document_fills_missing_with_empty() {
    let mut snapshot = Snapshot::default();
    snapshot.set_field(FlatField::HeroSubtitle, Some("Sub".into()));
    snapshot.memories.insert(1, MemoryEntry { title: Some("A".into()), text: None });

    let doc = snapshot.into_document();
    assert_eq!(doc.hero_title, "");
    assert_eq!(doc.hero_subtitle, "Sub");
    assert_eq!(doc.memories[&1].title.as_deref(), Some("A"));
}

#[test]
fn snapshot_memories_match_document_memories() {
    let doc = Document::defaults();
    let snapshot = Snapshot { memories: doc.memories.clone(), ..Snapshot::default() };
    let json_snapshot = serde_json::to_value(&snapshot.memories).unwrap();
    let json_document = serde_json::to_value(&doc.memories).unwrap();
    assert_eq!(json_snapshot, json_document);
}

#[test]
fn empty_snapshot_reports_empty() {
    assert!(Snapshot::default().is_empty());
    let mut snapshot = Snapshot::default();
    snapshot.set_field(FlatField::HeroTitle, Some("x".into()));
    assert!(!snapshot.is_empty());
}

// =============================================================================
// wire types
// =============================================================================

#[test]
fn envelope_ok_and_failed_shapes() {
    let ok = serde_json::to_value(Envelope::ok(Document::default())).unwrap();
    assert_eq!(ok["success"], true);
    assert!(ok.get("error").is_none());

    let failed = serde_json::to_value(Envelope::failed("Failed to save data")).unwrap();
    assert_eq!(failed["success"], false);
    assert_eq!(failed["error"], "Failed to save data");
    assert!(failed.get("data").is_none());
}

#[test]
fn field_update_value_defaults_to_empty() {
    let update: FieldUpdate = serde_json::from_str(r#"{"key":"hero-title"}"#).unwrap();
    assert_eq!(update.value, "");
}

#[test]
fn timestamp_now_is_rfc3339_utc() {
    let ts = timestamp_now();
    assert!(ts.ends_with('Z'), "{ts}");
    assert!(ts.contains('T'));
}
