//! Character model.

use serde::{Deserialize, Serialize};

/// A character in the narrative.
///
/// `associated_events` is the back-reference side of event participation,
/// kept consistent by the synchronizer; its order is the stacking order of
/// the character inside event blocks (newest on top). `associated_places`
/// is derived from those events and recomputed, never edited directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    /// Unique id: a bare counter value for characters created here, a UUID
    /// for entities migrated on load.
    pub id: String,
    /// Display name, unique among characters.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    /// Age in years, when known; always positive.
    #[serde(default)]
    pub age: Option<u32>,
    /// Alternative names used for lookups.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Display color, unique per character until the palette runs out.
    #[serde(default)]
    pub color: String,
    /// Ids of events this character participates in, stacking order first.
    #[serde(default)]
    pub associated_events: Vec<String>,
    /// Ids of places reached through those events; a persisted cache only.
    #[serde(default)]
    pub associated_places: Vec<String>,
}

impl Character {
    /// Create a character with a fresh id and assigned color.
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            notes: String::new(),
            age: None,
            aliases: Vec::new(),
            color: color.into(),
            associated_events: Vec::new(),
            associated_places: Vec::new(),
        }
    }

    /// Check if a name matches this character (case-insensitive, aliases included).
    pub fn matches_name(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if self.name.trim().to_lowercase() == query {
            return true;
        }
        self.aliases.iter().any(|a| a.trim().to_lowercase() == query)
    }

    /// Whether this character is linked to the given event.
    pub fn has_event(&self, event_id: &str) -> bool {
        self.associated_events.iter().any(|id| id == event_id)
    }
}

impl std::fmt::Display for Character {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.age {
            Some(age) => write!(f, "Character: {}, age: {}", self.name, age),
            None => write!(f, "Character: {}", self.name),
        }
    }
}
