//! Time entries: the atomic events a session is built from.

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kind of event a [`TimeEntry`] records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Start,
    End,
    Interruption,
    Return,
}

/// Reason for an interruption.
///
/// The four built-in tags are always reported by the statistics code; custom
/// labels come from configuration or from stored data. Ordering is the
/// built-in order followed by custom labels sorted lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InterruptionTag {
    Call,
    Meeting,
    Spouse,
    Other,
    Custom(String),
}

impl InterruptionTag {
    /// The built-in tags, in display order.
    pub fn builtin() -> [InterruptionTag; 4] {
        [
            InterruptionTag::Call,
            InterruptionTag::Meeting,
            InterruptionTag::Spouse,
            InterruptionTag::Other,
        ]
    }

    /// Built-in tags followed by the given custom labels.
    ///
    /// Labels that collide with a built-in name (case-insensitively) or are
    /// blank are not duplicated.
    pub fn known(custom_labels: &[String]) -> Vec<InterruptionTag> {
        let mut tags: Vec<InterruptionTag> = Self::builtin().to_vec();
        for label in custom_labels {
            let tag = InterruptionTag::from(label.as_str());
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    pub fn as_str(&self) -> &str {
        match self {
            InterruptionTag::Call => "call",
            InterruptionTag::Meeting => "meeting",
            InterruptionTag::Spouse => "spouse",
            InterruptionTag::Other => "other",
            InterruptionTag::Custom(label) => label,
        }
    }
}

impl From<&str> for InterruptionTag {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "call" => InterruptionTag::Call,
            "meeting" => InterruptionTag::Meeting,
            "spouse" => InterruptionTag::Spouse,
            // Unset tags are attributed to "other".
            "other" | "" => InterruptionTag::Other,
            _ => InterruptionTag::Custom(trimmed.to_string()),
        }
    }
}

impl From<String> for InterruptionTag {
    fn from(value: String) -> Self {
        InterruptionTag::from(value.as_str())
    }
}

impl From<InterruptionTag> for String {
    fn from(tag: InterruptionTag) -> Self {
        match tag {
            InterruptionTag::Custom(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for InterruptionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timestamped event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeEntry {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(rename = "start_time")]
    pub timestamp: DateTime<Local>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_string_as_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_tag_as_none"
    )]
    pub tag: Option<InterruptionTag>,
}

impl TimeEntry {
    pub fn new(kind: EntryType, timestamp: DateTime<Local>, description: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            timestamp,
            description: description.filter(|d| !d.trim().is_empty()),
            tag: None,
        }
    }

    /// An interruption entry carrying its tag.
    pub fn interruption(
        timestamp: DateTime<Local>,
        tag: InterruptionTag,
        description: Option<String>,
    ) -> Self {
        let mut entry = Self::new(EntryType::Interruption, timestamp, description);
        entry.tag = Some(tag);
        entry
    }

    /// Tag used for statistics: unset tags count as [`InterruptionTag::Other`].
    pub fn effective_tag(&self) -> InterruptionTag {
        self.tag.clone().unwrap_or(InterruptionTag::Other)
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn empty_tag_as_none<'de, D>(deserializer: D) -> Result<Option<InterruptionTag>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .filter(|s| !s.trim().is_empty())
        .map(InterruptionTag::from))
}
