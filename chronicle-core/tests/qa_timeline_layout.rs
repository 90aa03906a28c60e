//! QA tests for the timeline layout pipeline: store edits in, absolute
//! lane/column geometry out.

use chronicle_core::{
    CharacterForm, EventForm, PlaceForm, TimelineMode, TimelineStore, NO_PLACE_LANE,
};

fn day_event(name: &str, start: u32, end: u32, place: Option<&str>) -> EventForm {
    EventForm {
        name: name.to_string(),
        timeline_mode: Some(TimelineMode::DaySequence),
        day_index: Some(start),
        day_index_end: Some(end),
        places: place.map(|p| vec![p.to_string()]).unwrap_or_default(),
        ..Default::default()
    }
}

fn store_with_harbor() -> TimelineStore {
    let mut store = TimelineStore::new("Saga");
    store
        .add_place(PlaceForm {
            name: "Harbor".to_string(),
            ..Default::default()
        })
        .unwrap();
    store
}

// =============================================================================
// TEST 1: Column packing across overlapping and disjoint events
// =============================================================================

#[test]
fn test_overlapping_events_split_into_columns() {
    let mut store = store_with_harbor();
    store.add_event(day_event("A", 1, 3, Some("PLA001"))).unwrap();
    store.add_event(day_event("B", 2, 4, Some("PLA001"))).unwrap();
    store.add_event(day_event("C", 5, 6, Some("PLA001"))).unwrap();

    let layout = store.layout(None);
    let a = layout.event("EVE001").unwrap();
    let b = layout.event("EVE002").unwrap();
    let c = layout.event("EVE003").unwrap();

    assert_ne!(a.column, b.column, "A and B overlap and must split");
    assert_eq!(c.column, a.column, "C starts after A ends and reuses its column");
    assert!(layout
        .events
        .iter()
        .all(|e| e.column_count == 2 && e.lane_id == "PLA001"));
}

#[test]
fn test_offsets_are_zero_based_from_the_minimum_day() {
    let mut store = store_with_harbor();
    store.add_event(day_event("A", 4, 5, Some("PLA001"))).unwrap();
    store.add_event(day_event("B", 7, 7, Some("PLA001"))).unwrap();

    let layout = store.layout(None);
    assert_eq!(layout.event("EVE001").unwrap().start_offset, 0);
    assert_eq!(layout.event("EVE002").unwrap().start_offset, 3);
    assert_eq!(layout.day_count, 4);
    assert_eq!(layout.axis_labels.first().map(String::as_str), Some("Day 4"));
}

// =============================================================================
// TEST 2: Lane composition
// =============================================================================

#[test]
fn test_lane_order_and_no_place_bucket() {
    let mut store = TimelineStore::new("Saga");
    store
        .add_place(PlaceForm {
            name: "Harbor".to_string(),
            ..Default::default()
        })
        .unwrap();
    store
        .add_place(PlaceForm {
            name: "Keep".to_string(),
            ..Default::default()
        })
        .unwrap();
    store.add_event(day_event("Adrift", 1, 2, None)).unwrap();

    let layout = store.layout(None);
    let ids: Vec<&str> = layout.lanes.iter().map(|l| l.id.as_str()).collect();
    // No-place bucket first, then places in reverse collection order.
    assert_eq!(ids, vec![NO_PLACE_LANE, "PLA002", "PLA001"]);
    assert_eq!(layout.event("EVE001").unwrap().lane_id, NO_PLACE_LANE);

    // Lanes stack: each top is the previous top plus its height.
    for pair in layout.lanes.windows(2) {
        assert_eq!(pair[1].top, pair[0].top + pair[0].height);
    }
}

#[test]
fn test_empty_project_still_lays_out() {
    let mut store = TimelineStore::new("Saga");
    let layout = store.layout(None);

    assert_eq!(layout.day_count, 10);
    assert_eq!(layout.lanes.len(), 1);
    assert_eq!(layout.lanes[0].id, NO_PLACE_LANE);
    assert!(layout.events.is_empty());
    assert!(layout.total_height > 0.0);
    assert!(layout.lanes.iter().all(|l| l.height > 0.0 && l.top >= 0.0));
}

// =============================================================================
// TEST 3: Heights follow participant content
// =============================================================================

#[test]
fn test_participant_heavy_events_deepen_their_lane() {
    let mut store = store_with_harbor();
    let names = ["Mira", "Odo", "Tess", "Bran"];
    let mut ids = Vec::new();
    for name in names {
        ids.push(
            store
                .add_character(CharacterForm {
                    name: name.to_string(),
                    ..Default::default()
                })
                .unwrap(),
        );
    }

    let mut crowded = day_event("Council", 1, 2, Some("PLA001"));
    crowded.participants = ids;
    store.add_event(crowded).unwrap();
    store.add_event(day_event("Quiet", 1, 2, Some("PLA001"))).unwrap();

    let layout = store.layout(None);
    let crowded = layout.event("EVE001").unwrap();
    let quiet = layout.event("EVE002").unwrap();

    // 44 base + 4 rows of 28 + 3 gaps of 6 + 8 padding.
    assert_eq!(crowded.height, 182.0);
    assert!(quiet.height < crowded.height);

    // Both columns share the slot sized by the tallest event, and the lane
    // covers both columns plus its insets.
    let lane = layout.lane("PLA001").unwrap();
    assert_eq!(lane.height, 32.0 + 2.0 * 182.0 + 56.0);

    // Blocks never cross the lane's bottom edge.
    for event in &layout.events {
        let lane = layout.lane(&event.lane_id).unwrap();
        assert!(event.y >= lane.top);
        assert!(event.y + event.height <= lane.top + lane.height);
    }
}

// =============================================================================
// TEST 4: Stability
// =============================================================================

#[test]
fn test_layout_is_stable_across_refreshes() {
    let mut store = store_with_harbor();
    store.add_event(day_event("A", 1, 3, Some("PLA001"))).unwrap();
    store.add_event(day_event("B", 1, 3, Some("PLA001"))).unwrap();
    store.add_event(day_event("C", 2, 5, None)).unwrap();

    let first = store.layout(None);
    let second = store.layout(None);

    assert_eq!(first, second);
}

#[test]
fn test_lane_colors_survive_refresh_and_mode_toggle() {
    let mut store = store_with_harbor();
    store.add_event(day_event("A", 1, 3, Some("PLA001"))).unwrap();

    let first = store.layout(None);
    let color = first.lane("PLA001").unwrap().color.clone();
    assert!(!color.is_empty());

    let toggled = store.layout(Some(TimelineMode::Calendar));
    assert_eq!(toggled.lane("PLA001").unwrap().color, color);
}

#[test]
fn test_mode_toggle_renormalizes_events() {
    let mut store = store_with_harbor();
    store.add_event(day_event("A", 3, 4, Some("PLA001"))).unwrap();

    let day_layout = store.layout(Some(TimelineMode::DaySequence));
    assert_eq!(day_layout.axis_labels[0], "Day 3");

    // Toggling to calendar re-derives everything; the day indices give way
    // to a calendar window anchored on today.
    let calendar_layout = store.layout(Some(TimelineMode::Calendar));
    assert_eq!(calendar_layout.mode, TimelineMode::Calendar);
    assert_eq!(calendar_layout.events.len(), 1);
    let event = store.project().event("EVE001").unwrap();
    assert_eq!(event.timeline_mode, TimelineMode::Calendar);
    assert!(event.day_index.is_none());
}
