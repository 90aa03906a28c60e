//! Project aggregate: the full entity graph plus timeline settings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::character::Character;
use crate::event::{DisplayMode, Event, TimelineMode};
use crate::place::Place;

/// The kinds of entities a project holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Character,
    Event,
    Place,
}

impl EntityKind {
    /// Lowercase noun for error messages.
    pub fn noun(&self) -> &'static str {
        match self {
            EntityKind::Character => "character",
            EntityKind::Event => "event",
            EntityKind::Place => "place",
        }
    }
}

/// Timeline settings and free-form metadata carried by a project file.
///
/// The mode fields stay `None` until something fixes them, so a freshly
/// opened legacy file can be told apart from one that never chose a mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_mode: Option<TimelineMode>,
    #[serde(default)]
    pub timeline_mode_locked: bool,
    #[serde(
        default,
        rename = "timeline_display_mode",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_mode: Option<DisplayMode>,
    #[serde(default, rename = "timeline_display_mode_locked")]
    pub display_mode_locked: bool,
    /// Anything else the file carries (theme flags and the like) survives a
    /// round-trip untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectMetadata {
    /// Effective timeline mode; calendar until an event fixes it.
    pub fn timeline_mode(&self) -> TimelineMode {
        self.timeline_mode.unwrap_or_default()
    }

    /// Effective display mode; span until an event fixes it.
    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode.unwrap_or_default()
    }
}

/// The project: ordered collections of the three entity kinds.
///
/// Collection order is meaningful: places are laid out in reverse
/// collection order, and events iterate in collection order when the
/// day-sequence normalizer hands out fallback indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub metadata: ProjectMetadata,
}

fn default_project_name() -> String {
    "My Project".to_string()
}

impl Default for Project {
    fn default() -> Self {
        Self::new(default_project_name())
    }
}

impl Project {
    /// Create an empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            characters: Vec::new(),
            events: Vec::new(),
            places: Vec::new(),
            metadata: ProjectMetadata::default(),
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn character_mut(&mut self, id: &str) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn event_mut(&mut self, id: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id == id)
    }

    pub fn place(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }

    pub fn place_mut(&mut self, id: &str) -> Option<&mut Place> {
        self.places.iter_mut().find(|p| p.id == id)
    }

    /// Resolve event ids to names, skipping ids that no longer exist.
    pub fn event_names(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.event(id).map(|e| e.name.clone()))
            .collect()
    }

    /// Resolve character ids to names, skipping ids that no longer exist.
    pub fn character_names(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.character(id).map(|c| c.name.clone()))
            .collect()
    }

    /// Resolve place ids to names, skipping ids that no longer exist.
    pub fn place_names(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.place(id).map(|p| p.name.clone()))
            .collect()
    }

    /// Case-insensitive, whitespace-trimmed name collision check within one
    /// entity kind. `exclude_id` skips the entity being edited.
    pub fn is_name_taken(&self, kind: EntityKind, name: &str, exclude_id: Option<&str>) -> bool {
        let wanted = normalize_name(name);
        let collides = |id: &str, name: &str| {
            exclude_id.map_or(true, |ex| ex != id) && normalize_name(name) == wanted
        };
        match kind {
            EntityKind::Character => self.characters.iter().any(|c| collides(&c.id, &c.name)),
            EntityKind::Event => self.events.iter().any(|e| collides(&e.id, &e.name)),
            EntityKind::Place => self.places.iter().any(|p| collides(&p.id, &p.name)),
        }
    }
}

/// Canonical form for name comparisons.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} chars, {} events, {} places",
            self.name,
            self.characters.len(),
            self.events.len(),
            self.places.len()
        )
    }
}
