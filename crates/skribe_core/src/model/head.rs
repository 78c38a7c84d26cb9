//! Note metadata header.
//!
//! # Responsibility
//! - Keep the key/value metadata of a note in first-insertion order.
//! - Give codecs a stable iteration order so encoding stays deterministic.
//!
//! # Invariants
//! - Setting an existing key overwrites in place; position never changes.
//! - Keys are never removed in normal flow.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Head property key that the revised schema decodes as an integer.
pub const HEAD_CREATED_KEY: &str = "created";
/// Head property key that the revised schema decodes as an integer.
pub const HEAD_MODIFIED_KEY: &str = "modified";

/// One metadata value.
///
/// Values are text at rest in both on-disk schemas; the revised schema
/// materializes the well-known `created`/`modified` keys as integers on
/// decode. Encoding always writes the textual form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Integer value, produced only by decoding the well-known keys.
    Int(i64),
    /// Plain text value.
    Text(String),
}

impl PropertyValue {
    /// Text view of the value regardless of variant.
    pub fn to_text(&self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Insertion-ordered metadata mapping (`title`, `description`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteHead {
    entries: Vec<(String, PropertyValue)>,
}

impl NoteHead {
    /// Empty head.
    pub fn new() -> Self {
        Self::default()
    }

    /// Head pre-seeded with a `title` property, the shape every freshly
    /// created note starts from.
    pub fn with_title(title: impl Into<String>) -> Self {
        let mut head = Self::new();
        head.set("title", title.into());
        head
    }

    /// Upserts a property. New keys append; existing keys are overwritten in
    /// place without moving.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks a property up by key.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Convenience accessor for the `title` property as text.
    pub fn title(&self) -> Option<String> {
        self.get("title").map(PropertyValue::to_text)
    }

    /// Properties in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
