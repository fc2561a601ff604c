//! Field keys, the tagged identifier for one editable value.
//!
//! GRAMMAR
//! =======
//! ```text
//! flat    := "hero-title" | "hero-subtitle"
//!          | "birthday-message-title" | "birthday-message-text"
//! memory  := "memory-" field "-" id      ; exactly three '-' separated segments
//! field   := "title" | "text"
//! id      := positive decimal integer, no sign, no leading zero
//! photo   := "photo" id ".jpg"
//! ```
//!
//! Keys are parsed once where they enter the system. A parsed key renders
//! back to exactly the string it came from, so `FieldKey` can be used as the
//! storage key without a second representation.

use std::fmt;
use std::str::FromStr;

/// Reserved prefix of composite memory keys. Never a flat key.
pub const MEMORY_PREFIX: &str = "memory-";

const PHOTO_PREFIX: &str = "photo";
const PHOTO_SUFFIX: &str = ".jpg";

// =============================================================================
// ERROR
// =============================================================================

/// Rejection reasons for a raw key string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("empty field key")]
    Empty,

    #[error("unknown field key: {0}")]
    Unknown(String),

    /// A `memory-` key that does not split into exactly three segments.
    #[error("memory key must have exactly three '-' separated segments: {0}")]
    MemorySegments(String),

    #[error("unknown memory field `{field}` in {key}")]
    MemoryField { key: String, field: String },

    #[error("invalid memory id `{id}` in {key}")]
    MemoryId { key: String, id: String },

    #[error("invalid photo id in {0}")]
    PhotoId(String),
}

// =============================================================================
// FIELDS
// =============================================================================

/// The four page-level fields stored under fixed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlatField {
    HeroTitle,
    HeroSubtitle,
    MessageTitle,
    MessageText,
}

impl FlatField {
    pub const ALL: [FlatField; 4] = [Self::HeroTitle, Self::HeroSubtitle, Self::MessageTitle, Self::MessageText];

    #[must_use]
    pub fn as_key(self) -> &'static str {
        match self {
            Self::HeroTitle => "hero-title",
            Self::HeroSubtitle => "hero-subtitle",
            Self::MessageTitle => "birthday-message-title",
            Self::MessageText => "birthday-message-text",
        }
    }

    fn from_key(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_key() == raw)
    }
}

/// Per-memory text fields. Photos are keyed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemoryField {
    Title,
    Text,
}

impl MemoryField {
    pub const ALL: [MemoryField; 2] = [Self::Title, Self::Text];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Text => "text",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "title" => Some(Self::Title),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

// =============================================================================
// FIELD KEY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Flat(FlatField),
    Memory { field: MemoryField, id: u32 },
    Photo(u32),
}

impl FieldKey {
    /// Parse a raw storage key.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] for anything outside the grammar in the module docs.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::Empty);
        }
        if raw.starts_with(MEMORY_PREFIX) {
            return parse_memory(raw);
        }
        if let Some(flat) = FlatField::from_key(raw) {
            return Ok(Self::Flat(flat));
        }
        if let Some(id) = raw
            .strip_prefix(PHOTO_PREFIX)
            .and_then(|rest| rest.strip_suffix(PHOTO_SUFFIX))
        {
            return parse_id(id)
                .map(Self::Photo)
                .ok_or_else(|| KeyError::PhotoId(raw.to_owned()));
        }
        Err(KeyError::Unknown(raw.to_owned()))
    }

    #[must_use]
    pub fn memory(field: MemoryField, id: u32) -> Self {
        Self::Memory { field, id }
    }

    /// Whether the remote document has a slot for this key. Photos stay local.
    #[must_use]
    pub fn is_document_field(&self) -> bool {
        !matches!(self, Self::Photo(_))
    }
}

fn parse_memory(raw: &str) -> Result<FieldKey, KeyError> {
    let parts: Vec<&str> = raw.split('-').collect();
    let &[_, field, id] = parts.as_slice() else {
        return Err(KeyError::MemorySegments(raw.to_owned()));
    };
    let field = MemoryField::parse(field)
        .ok_or_else(|| KeyError::MemoryField { key: raw.to_owned(), field: field.to_owned() })?;
    let id = parse_id(id).ok_or_else(|| KeyError::MemoryId { key: raw.to_owned(), id: id.to_owned() })?;
    Ok(FieldKey::Memory { field, id })
}

/// Positive decimal id in canonical form, so rendering is lossless.
fn parse_id(raw: &str) -> Option<u32> {
    if raw.is_empty() || raw.starts_with('0') || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat(flat) => f.write_str(flat.as_key()),
            Self::Memory { field, id } => write!(f, "{MEMORY_PREFIX}{}-{id}", field.as_str()),
            Self::Photo(id) => write!(f, "{PHOTO_PREFIX}{id}{PHOTO_SUFFIX}"),
        }
    }
}

impl FromStr for FieldKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The fixed key set for `memory_slots` memories: four flat keys, then
/// title/text for ids `1..=memory_slots`.
#[must_use]
pub fn known_keys(memory_slots: u32) -> Vec<FieldKey> {
    let flat = FlatField::ALL.into_iter().map(FieldKey::Flat);
    let memories = (1..=memory_slots)
        .flat_map(|id| MemoryField::ALL.into_iter().map(move |field| FieldKey::memory(field, id)));
    flat.chain(memories).collect()
}

#[cfg(test)]
#[path = "field_key_test.rs"]
mod tests;
