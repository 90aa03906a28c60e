//! Place model.

use serde::{Deserialize, Serialize};

/// A location events can be anchored to. Each place becomes one lane in the
/// timeline layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Unique id, `PLA###` for places created here, UUID for migrated ones.
    pub id: String,
    /// Display name, unique among places; doubles as the lane label.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    /// Lane color, assigned lazily on first layout and persisted so lanes
    /// keep their color across sessions.
    #[serde(default)]
    pub color: String,
    /// Back-references to events held at this place; order not significant.
    #[serde(default)]
    pub associated_events: Vec<String>,
}

impl Place {
    /// Create a place with a fresh id and no events.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            notes: String::new(),
            color: String::new(),
            associated_events: Vec::new(),
        }
    }

    /// Whether the event is linked to this place.
    pub fn has_event(&self, event_id: &str) -> bool {
        self.associated_events.iter().any(|id| id == event_id)
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Place: {}", self.name)
    }
}
