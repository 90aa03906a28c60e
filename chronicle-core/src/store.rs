//! TimelineStore - the primary public API of the engine.
//!
//! Owns the project plus its id and color allocators, and funnels every
//! mutation through the same pipeline: basic form checks, semantic
//! validation (temporal conflicts), commit, then the relationship
//! synchronizer. A failed validation leaves the project untouched.

use chrono::Local;
use log::info;
use thiserror::Error;
use uuid::Uuid;

use crate::character::Character;
use crate::event::{DisplayMode, Event, TimelineMode};
use crate::ids::IdAllocator;
use crate::place::Place;
use crate::project::{EntityKind, Project};
use crate::sync;
use crate::timeline::color::ColorAllocator;
use crate::timeline::layout::{self, TimelineLayout};
use crate::timeline::normalize::{extract_day_index, normalize_events, parse_date};
use crate::timeline::overlap::{
    validate_event_participants, validate_move, validate_participant_set, ConflictError,
    EventWindow, TimeRange,
};

/// Errors from store mutations. Conflicts carry the names of both events
/// (and the character, where one is involved) so callers can show them
/// directly.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),

    #[error("a {kind} named \"{name}\" already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("no {kind} with id {id}")]
    UnknownId { kind: &'static str, id: String },

    #[error("\"{character}\" is already a participant of \"{event}\"")]
    AlreadyParticipant { character: String, event: String },

    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

/// Form data collected for a character add/edit.
#[derive(Debug, Clone, Default)]
pub struct CharacterForm {
    pub name: String,
    pub description: String,
    pub notes: String,
    /// Age in years; zero and `None` both mean "unknown".
    pub age: Option<u32>,
    pub aliases: Vec<String>,
    /// Events the character participates in, stacking order first.
    pub associated_events: Vec<String>,
}

/// Form data collected for an event add/edit.
#[derive(Debug, Clone, Default)]
pub struct EventForm {
    pub name: String,
    pub description: String,
    pub notes: String,
    /// Desired mode; ignored once the project is mode-locked.
    pub timeline_mode: Option<TimelineMode>,
    pub display_mode: Option<DisplayMode>,
    pub start_date: String,
    pub end_date: String,
    pub day_index: Option<u32>,
    pub day_index_end: Option<u32>,
    /// Selected places; collapsed to the first on commit.
    pub places: Vec<String>,
    pub participants: Vec<String>,
}

/// Form data collected for a place add/edit.
#[derive(Debug, Clone, Default)]
pub struct PlaceForm {
    pub name: String,
    pub description: String,
    pub notes: String,
}

/// The engine facade: entity graph plus allocators, one edit at a time.
#[derive(Debug, Clone)]
pub struct TimelineStore {
    project: Project,
    ids: IdAllocator,
    colors: ColorAllocator,
}

impl TimelineStore {
    /// Fresh store with an empty project. Allocators start from scratch,
    /// so nothing leaks from a previously open project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: Project::new(name),
            ids: IdAllocator::new(),
            colors: ColorAllocator::new(),
        }
    }

    /// Open a loaded entity graph, repairing whatever the file got wrong:
    /// blank ids become UUIDs, place lists collapse to one entry, every
    /// back-reference is rebuilt from the authoritative side, and the id
    /// counters move past everything already in use.
    ///
    /// Temporal overlaps already present in the data are left alone; the
    /// validators only gate new edits.
    pub fn open(mut project: Project) -> Self {
        let migrated = migrate_missing_ids(&mut project);
        if migrated > 0 {
            info!("assigned {migrated} missing entity ids");
        }

        sync::rebuild_backrefs(&mut project);

        let mut colors = ColorAllocator::new();
        for character in &project.characters {
            colors.mark_character_color_used(&character.color);
        }
        for character in &mut project.characters {
            if character.color.is_empty() {
                character.color = colors.character_color();
            }
        }

        // Older files carry no explicit mode; the first event decides.
        if project.metadata.timeline_mode.is_none() {
            if let Some(first) = project.events.first() {
                project.metadata.timeline_mode = Some(first.timeline_mode);
                project.metadata.timeline_mode_locked = true;
            }
        }

        let ids = IdAllocator::seeded_from(&project);
        Self {
            project,
            ids,
            colors,
        }
    }

    /// Read access to the entity graph.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Surrender the entity graph, e.g. for saving.
    pub fn into_project(self) -> Project {
        self.project
    }

    /// Case-insensitive name collision check, exposed for form validation.
    pub fn is_name_taken(&self, kind: EntityKind, name: &str, exclude_id: Option<&str>) -> bool {
        self.project.is_name_taken(kind, name, exclude_id)
    }

    // =========================================================================
    // Characters
    // =========================================================================

    /// Create a character. Fails if any pair of the selected events
    /// overlaps in time; nothing is committed on failure.
    pub fn add_character(&mut self, form: CharacterForm) -> Result<String, EditError> {
        let name = self.checked_name(EntityKind::Character, &form.name, None)?;
        let event_ids = sync::dedup_ids(&form.associated_events);
        validate_participant_set(&self.project.events, &event_ids)?;

        let id = self.ids.next_character_id();
        let color = self.colors.character_color();
        let mut character = Character::new(id.clone(), name, color);
        apply_character_form(&mut character, form, event_ids);
        self.project.characters.push(character);

        sync::after_character_saved(&mut self.project, &id);
        Ok(id)
    }

    /// Edit a character. Same gate as [`Self::add_character`].
    pub fn edit_character(&mut self, id: &str, form: CharacterForm) -> Result<(), EditError> {
        if self.project.character(id).is_none() {
            return Err(unknown(EntityKind::Character, id));
        }
        let name = self.checked_name(EntityKind::Character, &form.name, Some(id))?;
        let event_ids = sync::dedup_ids(&form.associated_events);
        validate_participant_set(&self.project.events, &event_ids)?;

        let Some(character) = self.project.character_mut(id) else {
            return Err(unknown(EntityKind::Character, id));
        };
        character.name = name;
        apply_character_form(character, form, event_ids);

        sync::after_character_saved(&mut self.project, id);
        Ok(())
    }

    /// Remove a character and every reference to it.
    pub fn remove_character(&mut self, id: &str) -> Result<(), EditError> {
        let Some(index) = self.project.characters.iter().position(|c| c.id == id) else {
            return Err(unknown(EntityKind::Character, id));
        };
        sync::strip_references(&mut self.project, id);
        self.project.characters.remove(index);
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Create an event. Fails if any selected participant already has an
    /// event overlapping the new one; nothing is committed on failure.
    pub fn add_event(&mut self, form: EventForm) -> Result<String, EditError> {
        let name = self.checked_name(EntityKind::Event, &form.name, None)?;
        let (mode, display) = self.resolve_modes(&form);
        let times = canonical_times(&form, mode, display);
        let participants = sync::dedup_ids(&form.participants);

        let window = EventWindow {
            id: None,
            name: name.clone(),
            range: times.range(mode),
        };
        validate_event_participants(
            &self.project.events,
            &self.project.characters,
            &window,
            &participants,
        )?;

        let id = self.ids.next_event_id();
        let mut event = Event::new(id.clone(), name);
        apply_event_form(&mut event, form, mode, display, &times, participants);
        self.project.events.push(event);

        sync::after_event_saved(&mut self.project, &id);
        self.lock_timeline_modes(mode, display, true);
        Ok(id)
    }

    /// Edit an event. Same gate as [`Self::add_event`], excluding the
    /// event's own previous time window.
    pub fn edit_event(&mut self, id: &str, form: EventForm) -> Result<(), EditError> {
        if self.project.event(id).is_none() {
            return Err(unknown(EntityKind::Event, id));
        }
        let name = self.checked_name(EntityKind::Event, &form.name, Some(id))?;
        let (mode, display) = self.resolve_modes(&form);
        let times = canonical_times(&form, mode, display);
        let participants = sync::dedup_ids(&form.participants);

        let window = EventWindow {
            id: Some(id.to_string()),
            name: name.clone(),
            range: times.range(mode),
        };
        validate_event_participants(
            &self.project.events,
            &self.project.characters,
            &window,
            &participants,
        )?;

        let Some(event) = self.project.event_mut(id) else {
            return Err(unknown(EntityKind::Event, id));
        };
        event.name = name;
        apply_event_form(event, form, mode, display, &times, participants);

        sync::after_event_saved(&mut self.project, id);
        self.lock_timeline_modes(mode, display, false);
        Ok(())
    }

    /// Remove an event and every reference to it. Removing the last event
    /// unlocks the project-wide timeline and display modes.
    pub fn remove_event(&mut self, id: &str) -> Result<(), EditError> {
        let Some(index) = self.project.events.iter().position(|e| e.id == id) else {
            return Err(unknown(EntityKind::Event, id));
        };
        sync::strip_references(&mut self.project, id);
        self.project.events.remove(index);

        let character_ids: Vec<String> =
            self.project.characters.iter().map(|c| c.id.clone()).collect();
        for character_id in &character_ids {
            sync::refresh_character_places(&mut self.project, character_id);
        }

        if self.project.events.is_empty() {
            self.project.metadata.timeline_mode_locked = false;
            self.project.metadata.display_mode_locked = false;
        }
        Ok(())
    }

    // =========================================================================
    // Places
    // =========================================================================

    /// Create a place.
    pub fn add_place(&mut self, form: PlaceForm) -> Result<String, EditError> {
        let name = self.checked_name(EntityKind::Place, &form.name, None)?;
        let id = self.ids.next_place_id();
        let mut place = Place::new(id.clone(), name);
        place.description = form.description;
        place.notes = form.notes;
        self.project.places.push(place);
        Ok(id)
    }

    /// Edit a place.
    pub fn edit_place(&mut self, id: &str, form: PlaceForm) -> Result<(), EditError> {
        if self.project.place(id).is_none() {
            return Err(unknown(EntityKind::Place, id));
        }
        let name = self.checked_name(EntityKind::Place, &form.name, Some(id))?;
        let Some(place) = self.project.place_mut(id) else {
            return Err(unknown(EntityKind::Place, id));
        };
        place.name = name;
        place.description = form.description;
        place.notes = form.notes;
        Ok(())
    }

    /// Remove a place and every reference to it. Events held there lose
    /// their place and fall back to the synthetic lane.
    pub fn remove_place(&mut self, id: &str) -> Result<(), EditError> {
        let Some(index) = self.project.places.iter().position(|p| p.id == id) else {
            return Err(unknown(EntityKind::Place, id));
        };
        sync::strip_references(&mut self.project, id);
        self.project.places.remove(index);

        let character_ids: Vec<String> =
            self.project.characters.iter().map(|c| c.id.clone()).collect();
        for character_id in &character_ids {
            sync::refresh_character_places(&mut self.project, character_id);
        }
        Ok(())
    }

    // =========================================================================
    // Participant moves
    // =========================================================================

    /// Move a character from one event onto another (a drag between event
    /// blocks). The character lands at `insert_index` in the target's
    /// stacking order, or at the end when `None`.
    pub fn move_character(
        &mut self,
        character_id: &str,
        source_event_id: Option<&str>,
        target_event_id: &str,
        insert_index: Option<usize>,
    ) -> Result<(), EditError> {
        let Some(character) = self.project.character(character_id) else {
            return Err(unknown(EntityKind::Character, character_id));
        };
        let Some(target) = self.project.event(target_event_id) else {
            return Err(unknown(EntityKind::Event, target_event_id));
        };
        let source = match source_event_id {
            Some(id) => Some(
                self.project
                    .event(id)
                    .ok_or_else(|| unknown(EntityKind::Event, id))?,
            ),
            None => None,
        };

        if target.has_participant(character_id) {
            return Err(EditError::AlreadyParticipant {
                character: character.name.clone(),
                event: target.name.clone(),
            });
        }
        validate_move(&self.project.events, character, target, source)?;

        if let Some(source_id) = source_event_id {
            if let Some(source) = self.project.event_mut(source_id) {
                source.participants.retain(|id| id != character_id);
            }
        }
        if let Some(target) = self.project.event_mut(target_event_id) {
            let index = insert_index
                .unwrap_or(target.participants.len())
                .min(target.participants.len());
            target.participants.insert(index, character_id.to_string());
        }

        if let Some(character) = self.project.character_mut(character_id) {
            sync::push_unique_front(&mut character.associated_events, target_event_id);
            if let Some(source_id) = source_event_id {
                character.associated_events.retain(|id| id != source_id);
            }
        }
        sync::refresh_character_places(&mut self.project, character_id);
        Ok(())
    }

    /// Reorder a character within one event's stacking order.
    pub fn reposition_participant(
        &mut self,
        event_id: &str,
        character_id: &str,
        index: usize,
    ) -> Result<(), EditError> {
        let Some(event) = self.project.event_mut(event_id) else {
            return Err(unknown(EntityKind::Event, event_id));
        };
        if !event.has_participant(character_id) {
            return Err(unknown(EntityKind::Character, character_id));
        }
        event.participants.retain(|id| id != character_id);
        let index = index.min(event.participants.len());
        event.participants.insert(index, character_id.to_string());
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Pairwise overlap gate over a proposed event selection, exposed so
    /// forms can validate before submitting.
    pub fn validate_participants(&self, event_ids: &[String]) -> Result<(), ConflictError> {
        validate_participant_set(&self.project.events, &sync::dedup_ids(event_ids))
    }

    /// Default day index for a new day-sequence event: one past the
    /// highest index in use, or 1 for an empty project.
    pub fn next_day_index(&self) -> u32 {
        let mut highest = 0;
        for event in &self.project.events {
            for value in [event.day_index, event.day_index_end].into_iter().flatten() {
                highest = highest.max(value);
            }
        }
        highest + 1
    }

    /// Compute the full timeline layout, recomputed from scratch.
    ///
    /// Normalization writes repaired dates and fallback indices back onto
    /// the events, and freshly assigned lane colors are persisted onto
    /// their places; both are the documented side effects of a refresh.
    pub fn layout(&mut self, mode: Option<TimelineMode>) -> TimelineLayout {
        let mode = mode.unwrap_or_else(|| self.project.metadata.timeline_mode());
        let today = Local::now().date_naive();
        let (normalized, axis) = normalize_events(&mut self.project.events, mode, today);
        let computed = layout::layout(
            &self.project.events,
            &normalized,
            &self.project.places,
            &self.project.characters,
            &axis,
            &mut self.colors,
        );
        for lane in &computed.lanes {
            if let Some(place) = self.project.place_mut(&lane.id) {
                if place.color != lane.color {
                    place.color = lane.color.clone();
                }
            }
        }
        computed
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn checked_name(
        &self,
        kind: EntityKind,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<String, EditError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName(kind.noun()));
        }
        if self.project.is_name_taken(kind, name, exclude_id) {
            return Err(EditError::DuplicateName {
                kind: kind.noun(),
                name: name.to_string(),
            });
        }
        Ok(name.to_string())
    }

    /// Modes for an event save: locked projects override the form.
    fn resolve_modes(&self, form: &EventForm) -> (TimelineMode, DisplayMode) {
        let metadata = &self.project.metadata;
        let mode = if metadata.timeline_mode_locked {
            metadata.timeline_mode()
        } else {
            form.timeline_mode.unwrap_or_else(|| metadata.timeline_mode())
        };
        let display = if metadata.display_mode_locked {
            metadata.display_mode()
        } else {
            form.display_mode.unwrap_or_else(|| metadata.display_mode())
        };
        (mode, display)
    }

    /// The first saved event fixes the project-wide modes; every save
    /// locks them until the last event is removed.
    fn lock_timeline_modes(&mut self, mode: TimelineMode, display: DisplayMode, is_new: bool) {
        let metadata = &mut self.project.metadata;
        if is_new || metadata.timeline_mode.is_none() {
            metadata.timeline_mode = Some(mode);
        }
        metadata.timeline_mode_locked = true;
        if !metadata.display_mode_locked {
            metadata.display_mode = Some(display);
            metadata.display_mode_locked = true;
        }
    }
}

fn unknown(kind: EntityKind, id: &str) -> EditError {
    EditError::UnknownId {
        kind: kind.noun(),
        id: id.to_string(),
    }
}

fn migrate_missing_ids(project: &mut Project) -> usize {
    let mut migrated = 0;
    for character in &mut project.characters {
        if character.id.is_empty() {
            character.id = Uuid::new_v4().to_string();
            migrated += 1;
        }
    }
    for event in &mut project.events {
        if event.id.is_empty() {
            event.id = Uuid::new_v4().to_string();
            migrated += 1;
        }
    }
    for place in &mut project.places {
        if place.id.is_empty() {
            place.id = Uuid::new_v4().to_string();
            migrated += 1;
        }
    }
    migrated
}

fn apply_character_form(character: &mut Character, form: CharacterForm, event_ids: Vec<String>) {
    character.description = form.description;
    character.notes = form.notes;
    character.age = form.age.filter(|age| *age > 0);
    character.aliases = form.aliases;
    character.associated_events = event_ids;
}

/// Canonical time fields for an event save, derived from the form the way
/// the edit dialog derives them: defaults fill the gaps, end never
/// precedes start.
struct CanonicalTimes {
    start_date: String,
    end_date: String,
    day_index: Option<u32>,
    day_index_end: Option<u32>,
}

impl CanonicalTimes {
    fn range(&self, mode: TimelineMode) -> Option<TimeRange> {
        TimeRange::resolve(
            mode,
            &self.start_date,
            &self.end_date,
            self.day_index,
            self.day_index_end,
        )
    }
}

fn canonical_times(form: &EventForm, mode: TimelineMode, display: DisplayMode) -> CanonicalTimes {
    match mode {
        TimelineMode::DaySequence => {
            let start = form
                .day_index
                .or_else(|| extract_day_index(&form.start_date))
                .unwrap_or(1);
            let mut end = form
                .day_index_end
                .or_else(|| extract_day_index(&form.end_date))
                .filter(|e| *e >= start)
                .unwrap_or(start);
            if display == DisplayMode::Point {
                end = start;
            }
            CanonicalTimes {
                start_date: format!("Day {start}"),
                end_date: format!("Day {end}"),
                day_index: Some(start),
                day_index_end: Some(end),
            }
        }
        TimelineMode::Calendar => {
            let start = parse_date(&form.start_date).unwrap_or_else(|| Local::now().date_naive());
            let mut end = parse_date(&form.end_date).filter(|e| *e >= start).unwrap_or(start);
            if display == DisplayMode::Point {
                end = start;
            }
            CanonicalTimes {
                start_date: start.format("%Y-%m-%d").to_string(),
                end_date: end.format("%Y-%m-%d").to_string(),
                day_index: None,
                day_index_end: None,
            }
        }
    }
}

fn apply_event_form(
    event: &mut Event,
    form: EventForm,
    mode: TimelineMode,
    display: DisplayMode,
    times: &CanonicalTimes,
    participants: Vec<String>,
) {
    event.description = form.description;
    event.notes = form.notes;
    event.timeline_mode = mode;
    event.display_mode = display;
    event.start_date = times.start_date.clone();
    event.end_date = times.end_date.clone();
    event.day_index = times.day_index;
    event.day_index_end = times.day_index_end;
    event.participants = participants;
    event.associated_places = sync::dedup_ids(&form.places).into_iter().take(1).collect();
}
