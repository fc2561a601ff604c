//! Document model: the remote document, the local snapshot and the wire
//! types shared by the store routes and the sync client.
//!
//! DESIGN
//! ======
//! `Document` is the server-persisted shape; `Snapshot` is the sparse view
//! assembled from local storage. Both use [`MemoryEntry`] for per-memory
//! fields so one converts into the other without renaming anything.
//! Empty strings in a document mean "cleared" and are skipped when the
//! document is flattened back into storage entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::field_key::{FieldKey, FlatField, MemoryField};

/// Current UTC time as an RFC 3339 string (used for `lastUpdated` and sync times).
#[must_use]
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

// =============================================================================
// MEMORY ENTRY
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MemoryEntry {
    #[must_use]
    pub fn new(title: &str, text: &str) -> Self {
        Self { title: Some(title.to_owned()), text: Some(text.to_owned()) }
    }

    #[must_use]
    pub fn get(&self, field: MemoryField) -> Option<&str> {
        match field {
            MemoryField::Title => self.title.as_deref(),
            MemoryField::Text => self.text.as_deref(),
        }
    }

    pub fn set(&mut self, field: MemoryField, value: String) {
        match field {
            MemoryField::Title => self.title = Some(value),
            MemoryField::Text => self.text = Some(value),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none()
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// The single remote document. Memory ids serialize as string keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub hero_title: String,
    #[serde(default)]
    pub hero_subtitle: String,
    #[serde(default)]
    pub birthday_message_title: String,
    #[serde(default)]
    pub birthday_message_text: String,
    #[serde(default)]
    pub memories: BTreeMap<u32, MemoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

const DEFAULT_MEMORIES: [(&str, &str); 10] = [
    (
        "Childhood Memories",
        "Remember when we were kids and every birthday felt like the most magical day of the year?",
    ),
    (
        "Adventures Together",
        "From spontaneous road trips to quiet coffee conversations, we've shared countless adventures.",
    ),
    ("Special Moments", "Life is made up of small moments that become big memories."),
    (
        "Achievements & Milestones",
        "Your journey has been marked by incredible achievements and important milestones.",
    ),
    (
        "Looking Forward",
        "As we celebrate another year of your amazing life, we also look forward to all the wonderful things.",
    ),
    ("Family & Friends", "The people who surround you with love and support make your life truly rich."),
    ("Creative Pursuits", "Your creative spirit has always been one of your most admirable qualities."),
    (
        "Challenges Overcome",
        "Life has presented its share of challenges, and you've faced each one with courage.",
    ),
    ("Simple Joys", "Sometimes the most precious memories come from life's simplest moments."),
    (
        "Dreams & Aspirations",
        "Your dreams and aspirations continue to evolve and inspire not only yourself.",
    ),
];

impl Document {
    /// The hard-coded document a fresh store starts from.
    #[must_use]
    pub fn defaults() -> Self {
        let memories = (1_u32..)
            .zip(DEFAULT_MEMORIES)
            .map(|(id, (title, text))| (id, MemoryEntry::new(title, text)))
            .collect();
        Self {
            hero_title: "Happy Birthday!".to_owned(),
            hero_subtitle: "Celebrating another amazing year of your life".to_owned(),
            birthday_message_title: "A Special Message Just for You".to_owned(),
            birthday_message_text:
                "Wishing you a day filled with happiness and a year filled with joy. Happy birthday!".to_owned(),
            memories,
            last_updated: None,
        }
    }

    #[must_use]
    pub fn field(&self, field: FlatField) -> &str {
        match field {
            FlatField::HeroTitle => &self.hero_title,
            FlatField::HeroSubtitle => &self.hero_subtitle,
            FlatField::MessageTitle => &self.birthday_message_title,
            FlatField::MessageText => &self.birthday_message_text,
        }
    }

    fn field_mut(&mut self, field: FlatField) -> &mut String {
        match field {
            FlatField::HeroTitle => &mut self.hero_title,
            FlatField::HeroSubtitle => &mut self.hero_subtitle,
            FlatField::MessageTitle => &mut self.birthday_message_title,
            FlatField::MessageText => &mut self.birthday_message_text,
        }
    }

    /// Apply one field update. Returns `false` for keys the document has no
    /// slot for (photos).
    pub fn apply(&mut self, key: &FieldKey, value: String) -> bool {
        match *key {
            FieldKey::Flat(flat) => {
                *self.field_mut(flat) = value;
                true
            }
            FieldKey::Memory { field, id } => {
                self.memories.entry(id).or_default().set(field, value);
                true
            }
            FieldKey::Photo(_) => false,
        }
    }

    /// Flatten into storage entries, skipping empty (cleared) values.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(FieldKey, String)> {
        let flat = FlatField::ALL
            .into_iter()
            .map(|field| (FieldKey::Flat(field), self.field(field)));
        let memories = self.memories.iter().flat_map(|(&id, entry)| {
            MemoryField::ALL
                .into_iter()
                .filter_map(move |field| entry.get(field).map(|value| (FieldKey::memory(field, id), value)))
        });
        flat.chain(memories)
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key, value.to_owned()))
            .collect()
    }

    /// Equality ignoring `lastUpdated`.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.hero_title == other.hero_title
            && self.hero_subtitle == other.hero_subtitle
            && self.birthday_message_title == other.birthday_message_title
            && self.birthday_message_text == other.birthday_message_text
            && self.memories == other.memories
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Aggregated view of everything saved locally. A memory id appears only if
/// at least one of its fields is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub birthday_message_title: Option<String>,
    pub birthday_message_text: Option<String>,
    pub memories: BTreeMap<u32, MemoryEntry>,
}

impl Snapshot {
    #[must_use]
    pub fn field(&self, field: FlatField) -> Option<&str> {
        match field {
            FlatField::HeroTitle => self.hero_title.as_deref(),
            FlatField::HeroSubtitle => self.hero_subtitle.as_deref(),
            FlatField::MessageTitle => self.birthday_message_title.as_deref(),
            FlatField::MessageText => self.birthday_message_text.as_deref(),
        }
    }

    pub fn set_field(&mut self, field: FlatField, value: Option<String>) {
        match field {
            FlatField::HeroTitle => self.hero_title = value,
            FlatField::HeroSubtitle => self.hero_subtitle = value,
            FlatField::MessageTitle => self.birthday_message_title = value,
            FlatField::MessageText => self.birthday_message_text = value,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        FlatField::ALL.into_iter().all(|field| self.field(field).is_none()) && self.memories.is_empty()
    }

    /// Convert to the remote shape. Absent flat fields become empty strings.
    #[must_use]
    pub fn into_document(self) -> Document {
        Document {
            hero_title: self.hero_title.unwrap_or_default(),
            hero_subtitle: self.hero_subtitle.unwrap_or_default(),
            birthday_message_title: self.birthday_message_title.unwrap_or_default(),
            birthday_message_text: self.birthday_message_text.unwrap_or_default(),
            memories: self.memories,
            last_updated: None,
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// `POST /data` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Response envelope for `POST` and `PUT /data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    #[must_use]
    pub fn ok(document: Document) -> Self {
        Self { success: true, data: Some(document), error: None }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()) }
    }
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
