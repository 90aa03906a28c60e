//! Id allocation for project entities.
//!
//! Events and places get `EVE###`/`PLA###` ids, characters a bare counter
//! value. The allocator is owned by the store (never global) and reseeded
//! from the highest id already present whenever a project is opened, so
//! imported data can never collide with newly created entities.

use crate::project::Project;

const EVENT_PREFIX: &str = "EVE";
const PLACE_PREFIX: &str = "PLA";

/// Hands out unique entity ids for one open project.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_character: u32,
    next_event: u32,
    next_place: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// Start counting from 1 for all three entity kinds.
    pub fn new() -> Self {
        Self {
            next_character: 1,
            next_event: 1,
            next_place: 1,
        }
    }

    /// Allocator seeded past every id the project already uses.
    pub fn seeded_from(project: &Project) -> Self {
        let mut ids = Self::new();
        ids.reseed(project);
        ids
    }

    /// Next character id.
    pub fn next_character_id(&mut self) -> String {
        let id = self.next_character.to_string();
        self.next_character += 1;
        id
    }

    /// Next event id (`EVE001`, `EVE002`, ...).
    pub fn next_event_id(&mut self) -> String {
        let id = format!("{EVENT_PREFIX}{:03}", self.next_event);
        self.next_event += 1;
        id
    }

    /// Next place id (`PLA001`, `PLA002`, ...).
    pub fn next_place_id(&mut self) -> String {
        let id = format!("{PLACE_PREFIX}{:03}", self.next_place);
        self.next_place += 1;
        id
    }

    /// Move every counter past the highest numeric id in the project.
    /// Ids that don't follow the numeric patterns (UUID migrations) are
    /// ignored; they can never collide with counter output.
    pub fn reseed(&mut self, project: &Project) {
        for event in &project.events {
            if let Some(n) = numeric_suffix(&event.id, EVENT_PREFIX) {
                self.next_event = self.next_event.max(n + 1);
            }
        }
        for place in &project.places {
            if let Some(n) = numeric_suffix(&place.id, PLACE_PREFIX) {
                self.next_place = self.next_place.max(n + 1);
            }
        }
        for character in &project.characters {
            if let Ok(n) = character.id.parse::<u32>() {
                self.next_character = self.next_character.max(n + 1);
            }
        }
    }
}

fn numeric_suffix(id: &str, prefix: &str) -> Option<u32> {
    let rest = id.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}
