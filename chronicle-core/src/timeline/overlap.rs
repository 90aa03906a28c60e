//! Temporal overlap detection and the edit gates built on it.
//!
//! Two events conflict when they resolve to the same time representation
//! and their inclusive integer intervals intersect. Events in different
//! representations (one calendar, one day-sequence) never overlap; that is
//! a deliberate policy, not a missing case: mixed-mode comparisons have no
//! meaningful common axis, so the engine refuses to invent one.

use chrono::Datelike;
use thiserror::Error;

use crate::character::Character;
use crate::event::{Event, TimelineMode};
use crate::timeline::normalize::{extract_day_index, parse_date};

/// A conflict between two named events, ready to render to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    /// Two events in one selection occupy overlapping time.
    #[error("\"{first}\" and \"{second}\" overlap in time")]
    EventsOverlap { first: String, second: String },

    /// A character already participates in an event that overlaps the
    /// candidate event.
    #[error(
        "character \"{character}\" is already participating in \"{existing}\", \
         which overlaps with \"{candidate}\""
    )]
    ParticipantOverlap {
        character: String,
        existing: String,
        candidate: String,
    },
}

/// The time window of one event, detached from the store: exactly what the
/// overlap check needs and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub mode: TimelineMode,
    /// Inclusive interval on the mode's own integer axis: days-from-epoch
    /// for calendar events, day indices for day-sequence events.
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// Resolve a stored time representation to its window. Returns `None`
    /// when no usable start exists; such events conflict with nothing.
    pub fn resolve(
        mode: TimelineMode,
        start_date: &str,
        end_date: &str,
        day_index: Option<u32>,
        day_index_end: Option<u32>,
    ) -> Option<TimeRange> {
        match mode {
            TimelineMode::DaySequence => {
                let start = day_index.or_else(|| extract_day_index(start_date))?;
                let end = day_index_end
                    .or_else(|| extract_day_index(end_date))
                    .filter(|e| *e >= start)
                    .unwrap_or(start);
                Some(TimeRange {
                    mode: TimelineMode::DaySequence,
                    start: start as i64,
                    end: end as i64,
                })
            }
            TimelineMode::Calendar => {
                let start = parse_date(start_date)?;
                let end = parse_date(end_date).filter(|e| *e >= start).unwrap_or(start);
                Some(TimeRange {
                    mode: TimelineMode::Calendar,
                    start: i64::from(start.num_days_from_ce()),
                    end: i64::from(end.num_days_from_ce()),
                })
            }
        }
    }

    /// Resolve an event's stored representation to its time window.
    pub fn of_event(event: &Event) -> Option<TimeRange> {
        Self::resolve(
            event.timeline_mode,
            &event.start_date,
            &event.end_date,
            event.day_index,
            event.day_index_end,
        )
    }

    /// Inclusive interval intersection within one mode; `false` across
    /// modes by policy.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.mode == other.mode && self.start <= other.end && other.start <= self.end
    }
}

/// Whether two events occupy overlapping time.
pub fn events_overlap(a: &Event, b: &Event) -> bool {
    match (TimeRange::of_event(a), TimeRange::of_event(b)) {
        (Some(ra), Some(rb)) => ra.overlaps(&rb),
        _ => false,
    }
}

/// A candidate event under validation, before it exists in the store.
/// Edits validate against this so a rejected edit leaves no trace.
#[derive(Debug, Clone)]
pub struct EventWindow {
    /// Id of the event being edited, if any; its previous version is
    /// excluded from the checks.
    pub id: Option<String>,
    pub name: String,
    pub range: Option<TimeRange>,
}

impl EventWindow {
    /// Snapshot an existing event.
    pub fn of_event(event: &Event) -> Self {
        Self {
            id: Some(event.id.clone()),
            name: event.name.clone(),
            range: TimeRange::of_event(event),
        }
    }
}

/// Gate for assigning a set of events to one character: every pair must be
/// non-overlapping. Fails on the first conflicting pair; the caller must
/// not apply any part of the edit.
pub fn validate_participant_set(events: &[Event], selected_ids: &[String]) -> Result<(), ConflictError> {
    let selected: Vec<&Event> = selected_ids
        .iter()
        .filter_map(|id| events.iter().find(|e| &e.id == id))
        .collect();

    for (index, first) in selected.iter().enumerate() {
        for second in &selected[index + 1..] {
            if events_overlap(first, second) {
                return Err(ConflictError::EventsOverlap {
                    first: first.name.clone(),
                    second: second.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Gate for an event edit that selects participants: no selected character
/// may already participate in an event overlapping the candidate window.
pub fn validate_event_participants(
    events: &[Event],
    characters: &[Character],
    candidate: &EventWindow,
    participant_ids: &[String],
) -> Result<(), ConflictError> {
    let Some(range) = candidate.range else {
        return Ok(());
    };

    for character_id in participant_ids {
        let Some(character) = characters.iter().find(|c| &c.id == character_id) else {
            continue;
        };
        for existing_id in &character.associated_events {
            if candidate.id.as_deref() == Some(existing_id.as_str()) {
                continue;
            }
            let Some(existing) = events.iter().find(|e| &e.id == existing_id) else {
                continue;
            };
            if TimeRange::of_event(existing).is_some_and(|r| r.overlaps(&range)) {
                return Err(ConflictError::ParticipantOverlap {
                    character: character.name.clone(),
                    existing: existing.name.clone(),
                    candidate: candidate.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Gate for moving a character onto `target`: with `target` and `source`
/// set aside, none of the character's remaining events may overlap the
/// target.
pub fn validate_move(
    events: &[Event],
    character: &Character,
    target: &Event,
    source: Option<&Event>,
) -> Result<(), ConflictError> {
    let remaining = character.associated_events.iter().filter(|id| {
        id.as_str() != target.id && source.map_or(true, |s| id.as_str() != s.id)
    });

    for existing_id in remaining {
        let Some(existing) = events.iter().find(|e| &e.id == existing_id) else {
            continue;
        };
        if events_overlap(target, existing) {
            return Err(ConflictError::ParticipantOverlap {
                character: character.name.clone(),
                existing: existing.name.clone(),
                candidate: target.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar_event(id: &str, name: &str, start: &str, end: &str) -> Event {
        let mut event = Event::new(id, name);
        event.start_date = start.to_string();
        event.end_date = end.to_string();
        event
    }

    fn day_event(id: &str, name: &str, start: u32, end: u32) -> Event {
        let mut event = Event::new(id, name);
        event.timeline_mode = TimelineMode::DaySequence;
        event.day_index = Some(start);
        event.day_index_end = Some(end);
        event
    }

    #[test]
    fn test_overlap_is_symmetric_and_reflexive() {
        let a = calendar_event("a", "A", "2025-01-01", "2025-01-05");
        let b = calendar_event("b", "B", "2025-01-03", "2025-01-04");
        let c = calendar_event("c", "C", "2025-02-01", "2025-02-02");

        assert!(events_overlap(&a, &a));
        assert_eq!(events_overlap(&a, &b), events_overlap(&b, &a));
        assert!(events_overlap(&a, &b));
        assert!(!events_overlap(&a, &c));
    }

    #[test]
    fn test_touching_intervals_overlap_inclusively() {
        let a = day_event("a", "A", 1, 3);
        let b = day_event("b", "B", 3, 5);
        let c = day_event("c", "C", 4, 6);

        assert!(events_overlap(&a, &b));
        assert!(!events_overlap(&a, &c));
    }

    #[test]
    fn test_different_modes_never_overlap() {
        let a = calendar_event("a", "A", "2025-01-01", "2025-01-05");
        let b = day_event("b", "B", 1, 500);
        assert!(!events_overlap(&a, &b));
    }

    #[test]
    fn test_unparseable_event_conflicts_with_nothing() {
        let a = calendar_event("a", "A", "sometime", "");
        let b = calendar_event("b", "B", "2025-01-01", "2025-01-05");
        assert!(!events_overlap(&a, &b));
        assert!(!events_overlap(&a, &a));
    }

    #[test]
    fn test_participant_set_rejects_first_conflicting_pair() {
        let events = vec![
            day_event("e1", "March", 1, 3),
            day_event("e2", "Siege", 5, 6),
            day_event("e3", "Council", 2, 4),
        ];
        let ids: Vec<String> = ["e1", "e2", "e3"].iter().map(|s| s.to_string()).collect();

        let err = validate_participant_set(&events, &ids).unwrap_err();
        assert_eq!(
            err,
            ConflictError::EventsOverlap {
                first: "March".to_string(),
                second: "Council".to_string(),
            }
        );

        let ok_ids: Vec<String> = ["e1", "e2"].iter().map(|s| s.to_string()).collect();
        assert!(validate_participant_set(&events, &ok_ids).is_ok());
    }

    #[test]
    fn test_event_participants_gate_names_all_parties() {
        let events = vec![calendar_event("e1", "Festival", "2025-01-01", "2025-01-05")];
        let mut character = Character::new("c1", "Mira", "");
        character.associated_events.push("e1".to_string());
        let characters = vec![character];

        let candidate = EventWindow {
            id: None,
            name: "Duel".to_string(),
            range: TimeRange::of_event(&calendar_event("x", "Duel", "2025-01-03", "2025-01-04")),
        };

        let err = validate_event_participants(&events, &characters, &candidate, &["c1".to_string()])
            .unwrap_err();
        assert_eq!(
            err,
            ConflictError::ParticipantOverlap {
                character: "Mira".to_string(),
                existing: "Festival".to_string(),
                candidate: "Duel".to_string(),
            }
        );
    }

    #[test]
    fn test_event_participants_skips_the_event_being_edited() {
        let events = vec![calendar_event("e1", "Festival", "2025-01-01", "2025-01-05")];
        let mut character = Character::new("c1", "Mira", "");
        character.associated_events.push("e1".to_string());
        let characters = vec![character];

        // Editing e1 itself: its old window must not block the edit.
        let mut candidate = EventWindow::of_event(&events[0]);
        candidate.range =
            TimeRange::of_event(&calendar_event("x", "x", "2025-01-02", "2025-01-03"));
        assert!(
            validate_event_participants(&events, &characters, &candidate, &["c1".to_string()])
                .is_ok()
        );
    }

    #[test]
    fn test_validate_move_ignores_source_and_target() {
        let events = vec![
            day_event("e1", "March", 1, 3),
            day_event("e2", "Siege", 2, 4),
            day_event("e3", "Council", 3, 5),
        ];
        let mut character = Character::new("c1", "Mira", "");
        character.associated_events = vec!["e1".to_string(), "e2".to_string()];

        // Moving from e2 to e3: only e1 remains; 1..=3 touches 3..=5 at
        // day 3, which counts as overlap.
        let err = validate_move(&events, &character, &events[2], Some(&events[1])).unwrap_err();
        assert!(matches!(err, ConflictError::ParticipantOverlap { .. }));

        // Moving from e1 to e3: e2 remains and overlaps the target.
        let err = validate_move(&events, &character, &events[2], Some(&events[0]));
        assert!(err.is_err());

        // Character with only the source event can always move.
        let mut lone = Character::new("c2", "Odo", "");
        lone.associated_events = vec!["e1".to_string()];
        assert!(validate_move(&events, &lone, &events[2], Some(&events[0])).is_ok());
    }
}
