//! Event model and its two time representations.

use serde::{Deserialize, Serialize};

use crate::timeline::normalize::extract_day_index;

/// How an event positions itself on the time axis.
///
/// Each event carries its own mode; the project metadata may lock every
/// event to one mode once the first event exists, but the engine never
/// assumes a single global mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineMode {
    /// Absolute calendar dates (`start_date` / `end_date` strings).
    #[default]
    Calendar,
    /// Ordinal "Day N" indices (`day_index` / `day_index_end`).
    DaySequence,
}

impl TimelineMode {
    /// Display name for UI labels.
    pub fn name(&self) -> &'static str {
        match self {
            TimelineMode::Calendar => "Calendar dates",
            TimelineMode::DaySequence => "Day sequence",
        }
    }
}

/// How an event is rendered along the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// A block spanning start..=end.
    #[default]
    Span,
    /// A single moment; end collapses onto start visually.
    Point,
}

/// A narrative event.
///
/// `participants` and `associated_places` are the authoritative side of the
/// entity relations; the back-references on [`crate::Character`] and
/// [`crate::Place`] are maintained by the synchronizer. An event keeps at
/// most one associated place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique id, `EVE###` for events created here, UUID for migrated ones.
    pub id: String,
    /// Display name, unique among events.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub timeline_mode: TimelineMode,
    #[serde(default)]
    pub display_mode: DisplayMode,
    /// Calendar start, or a "Day N" echo in day-sequence mode.
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    /// First day index (>= 1) in day-sequence mode.
    #[serde(default)]
    pub day_index: Option<u32>,
    #[serde(default)]
    pub day_index_end: Option<u32>,
    /// Character ids in stacking order, duplicates removed.
    #[serde(default)]
    pub participants: Vec<String>,
    /// At most one place id after synchronization.
    #[serde(default)]
    pub associated_places: Vec<String>,

    // Field names written by older project files; folded into the fields
    // above when a project is opened, never written back out.
    #[serde(default, skip_serializing)]
    day_number: Option<u32>,
    #[serde(default, skip_serializing)]
    day_number_end: Option<u32>,
    #[serde(default, skip_serializing)]
    places: Vec<String>,
}

impl Event {
    /// Create an event with a fresh id and empty relations.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            notes: String::new(),
            timeline_mode: TimelineMode::default(),
            display_mode: DisplayMode::default(),
            start_date: String::new(),
            end_date: String::new(),
            day_index: None,
            day_index_end: None,
            participants: Vec::new(),
            associated_places: Vec::new(),
            day_number: None,
            day_number_end: None,
            places: Vec::new(),
        }
    }

    /// The single associated place, if any.
    pub fn place_id(&self) -> Option<&str> {
        self.associated_places.first().map(String::as_str)
    }

    /// Whether the character participates in this event.
    pub fn has_participant(&self, character_id: &str) -> bool {
        self.participants.iter().any(|id| id == character_id)
    }

    /// Fold legacy field spellings into the current ones and recover day
    /// indices from "Day N" text. Runs once when a project file is opened.
    pub(crate) fn merge_legacy_fields(&mut self) {
        if self.day_index.is_none() {
            self.day_index = self.day_number.take();
        }
        if self.day_index_end.is_none() {
            self.day_index_end = self.day_number_end.take();
        }
        self.day_number = None;
        self.day_number_end = None;

        if self.associated_places.is_empty() && !self.places.is_empty() {
            self.associated_places = std::mem::take(&mut self.places);
        }
        self.places.clear();

        if self.timeline_mode == TimelineMode::DaySequence {
            if self.day_index.is_none() {
                self.day_index = extract_day_index(&self.start_date);
            }
            if self.day_index_end.is_none() {
                self.day_index_end = extract_day_index(&self.end_date);
            }
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event: {} ({}", self.name, self.start_date)?;
        if !self.end_date.is_empty() {
            write!(f, " to {}", self.end_date)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde_spelling() {
        let json = serde_json::to_string(&TimelineMode::DaySequence).unwrap();
        assert_eq!(json, "\"day_sequence\"");
        let mode: TimelineMode = serde_json::from_str("\"calendar\"").unwrap();
        assert_eq!(mode, TimelineMode::Calendar);
        let display: DisplayMode = serde_json::from_str("\"point\"").unwrap();
        assert_eq!(display, DisplayMode::Point);
    }

    #[test]
    fn test_legacy_fields_fold_into_current() {
        let json = r#"{
            "id": "EVE001",
            "name": "Ambush",
            "timeline_mode": "day_sequence",
            "day_number": 3,
            "day_number_end": 5,
            "places": ["PLA001", "PLA002"]
        }"#;
        let mut event: Event = serde_json::from_str(json).unwrap();
        event.merge_legacy_fields();

        assert_eq!(event.day_index, Some(3));
        assert_eq!(event.day_index_end, Some(5));
        assert_eq!(event.associated_places, vec!["PLA001", "PLA002"]);

        // The legacy spellings never come back out.
        let out = serde_json::to_string(&event).unwrap();
        assert!(!out.contains("day_number"));
        assert!(!out.contains("\"places\""));
    }

    #[test]
    fn test_current_fields_win_over_legacy() {
        let json = r#"{
            "id": "EVE002",
            "name": "Parley",
            "day_index": 7,
            "day_number": 2,
            "associated_places": ["PLA003"],
            "places": ["PLA009"]
        }"#;
        let mut event: Event = serde_json::from_str(json).unwrap();
        event.merge_legacy_fields();

        assert_eq!(event.day_index, Some(7));
        assert_eq!(event.associated_places, vec!["PLA003"]);
    }

    #[test]
    fn test_day_index_recovered_from_text() {
        let mut event = Event::new("EVE003", "March");
        event.timeline_mode = TimelineMode::DaySequence;
        event.start_date = "Day 4".to_string();
        event.end_date = "Day 6".to_string();
        event.merge_legacy_fields();

        assert_eq!(event.day_index, Some(4));
        assert_eq!(event.day_index_end, Some(6));
    }
}
