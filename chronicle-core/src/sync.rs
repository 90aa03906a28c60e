//! Relationship synchronizer: the single place where the bidirectional
//! links between characters, events, and places are repaired.
//!
//! Event participant lists and event place lists are the authoritative
//! side of each relation; everything else (`Character::associated_events`,
//! `Place::associated_events`, `Character::associated_places`) is a
//! back-reference this module keeps consistent. Every mutation commits
//! through here; no other call site touches a back-reference.

use std::collections::HashSet;

use log::{debug, info};

use crate::project::Project;

/// Remove blanks and duplicates, keeping first occurrences in order.
pub fn dedup_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| !id.is_empty() && seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Prepend `value` unless it is blank or already present. New links go to
/// the front so the most recent association stacks on top.
pub fn push_unique_front(list: &mut Vec<String>, value: &str) {
    if !value.is_empty() && !list.iter().any(|id| id == value) {
        list.insert(0, value.to_string());
    }
}

fn remove_id(list: &mut Vec<String>, value: &str) {
    list.retain(|id| id != value);
}

/// Restore all invariants around one event after it was created or edited.
///
/// Collapses the event's place list to at most one id (first wins), then
/// makes every character's and place's back-reference list agree with the
/// event's participant list and place. Characters whose event set changed
/// get their derived place list recomputed.
pub fn after_event_saved(project: &mut Project, event_id: &str) {
    let Some(event) = project.event_mut(event_id) else {
        return;
    };
    event.participants = dedup_ids(&event.participants);

    let primary = dedup_ids(&event.associated_places).into_iter().next();
    if event.associated_places.len() > 1 {
        debug!(
            "event {event_id}: collapsing {} associated places to one",
            event.associated_places.len()
        );
    }
    event.associated_places = primary.iter().cloned().collect();
    let participants: HashSet<String> = event.participants.iter().cloned().collect();

    for place in &mut project.places {
        if primary.as_deref() == Some(place.id.as_str()) {
            push_unique_front(&mut place.associated_events, event_id);
        } else {
            remove_id(&mut place.associated_events, event_id);
        }
    }

    let character_ids: Vec<String> = project.characters.iter().map(|c| c.id.clone()).collect();
    for character_id in character_ids {
        let Some(character) = project.character_mut(&character_id) else {
            continue;
        };
        let linked = character.has_event(event_id);
        let should_link = participants.contains(&character_id);
        if should_link {
            push_unique_front(&mut character.associated_events, event_id);
        } else {
            remove_id(&mut character.associated_events, event_id);
        }
        // The event's place may have changed, so every character touching
        // this event gets its derived places recomputed, not just the ones
        // whose membership flipped.
        if should_link || linked {
            refresh_character_places(project, &character_id);
        }
    }
}

/// Restore all invariants around one character after it was created or
/// edited: every event's participant list agrees with the character's
/// event list, and the derived place list is recomputed.
pub fn after_character_saved(project: &mut Project, character_id: &str) {
    let Some(character) = project.character_mut(character_id) else {
        return;
    };
    character.associated_events = dedup_ids(&character.associated_events);
    let wanted: HashSet<String> = character.associated_events.iter().cloned().collect();

    for event in &mut project.events {
        if wanted.contains(&event.id) {
            push_unique_front(&mut event.participants, character_id);
        } else {
            remove_id(&mut event.participants, character_id);
        }
    }

    refresh_character_places(project, character_id);
}

/// Recompute a character's derived place list: the union of the associated
/// place of every event the character participates in.
pub fn refresh_character_places(project: &mut Project, character_id: &str) {
    let Some(character) = project.character(character_id) else {
        return;
    };
    let mut places = Vec::new();
    for event_id in &character.associated_events {
        let Some(event) = project.event(event_id) else {
            continue;
        };
        if let Some(place_id) = event.place_id() {
            if !places.iter().any(|id| id == place_id) {
                places.push(place_id.to_string());
            }
        }
    }
    if let Some(character) = project.character_mut(character_id) {
        character.associated_places = places;
    }
}

/// Remove every reference to `entity_id` from every association list in
/// the project. Runs before an entity record is dropped so no dangling id
/// stays reachable.
pub fn strip_references(project: &mut Project, entity_id: &str) {
    for event in &mut project.events {
        remove_id(&mut event.participants, entity_id);
        remove_id(&mut event.associated_places, entity_id);
    }
    for character in &mut project.characters {
        remove_id(&mut character.associated_events, entity_id);
        remove_id(&mut character.associated_places, entity_id);
    }
    for place in &mut project.places {
        remove_id(&mut place.associated_events, entity_id);
    }
}

/// Rebuild every back-reference from scratch from the authoritative side.
///
/// Runs when a project is opened: persisted back-references are treated as
/// untrusted and recomputed wholesale, which silently repairs any on-disk
/// inconsistency. Pre-existing temporal overlaps are left alone; only new
/// edits are gated.
pub fn rebuild_backrefs(project: &mut Project) {
    for event in &mut project.events {
        event.merge_legacy_fields();
        event.participants = dedup_ids(&event.participants);
        event.associated_places = dedup_ids(&event.associated_places)
            .into_iter()
            .take(1)
            .collect();
    }

    for character in &mut project.characters {
        character.associated_events.clear();
    }
    for place in &mut project.places {
        place.associated_events.clear();
    }

    let event_links: Vec<(String, Vec<String>, Option<String>)> = project
        .events
        .iter()
        .map(|e| {
            (
                e.id.clone(),
                e.participants.clone(),
                e.place_id().map(str::to_string),
            )
        })
        .collect();

    for (event_id, participants, place_id) in &event_links {
        for character_id in participants {
            if let Some(character) = project.character_mut(character_id) {
                if !character.has_event(event_id) {
                    character.associated_events.push(event_id.clone());
                }
            }
        }
        if let Some(place_id) = place_id {
            if let Some(place) = project.place_mut(place_id) {
                if !place.has_event(event_id) {
                    place.associated_events.push(event_id.clone());
                }
            }
        }
    }

    let character_ids: Vec<String> = project.characters.iter().map(|c| c.id.clone()).collect();
    for character_id in &character_ids {
        refresh_character_places(project, character_id);
    }

    info!(
        "rebuilt associations for {} characters and {} places",
        project.characters.len(),
        project.places.len()
    );
}
