//! Lane/column layout: places become lanes, concurrent events split into
//! columns, heights grow with participant content.
//!
//! The layout is a pure recompute: every call rebuilds all coordinates
//! from scratch from the current entity graph. The only state that
//! survives between calls lives in [`ColorAllocator`], so a place keeps
//! its color across refreshes.

use std::collections::{HashMap, HashSet};

use crate::character::Character;
use crate::event::{Event, TimelineMode};
use crate::place::Place;
use crate::timeline::color::ColorAllocator;
use crate::timeline::normalize::{NormalizedEvent, TimeAxis};

/// Id of the synthetic lane for events without a resolvable place.
pub const NO_PLACE_LANE: &str = "__NO_PLACE__";
/// Label of the synthetic lane.
pub const NO_PLACE_LABEL: &str = "No Place";

/// Width of one axis unit in scene coordinates.
pub const DAY_WIDTH: f32 = 120.0;
/// Space reserved left of the first axis unit for lane labels.
pub const LEFT_MARGIN: f32 = 180.0;
/// Space above the first lane.
pub const TOP_MARGIN: f32 = 80.0;
/// Minimum lane height.
pub const DEFAULT_LANE_HEIGHT: f32 = 160.0;

const LANE_TOP_INSET: f32 = 32.0;
const LANE_BOTTOM_RESERVE: f32 = 56.0;
const EVENT_BASE_HEIGHT: f32 = 44.0;
const PARTICIPANT_ROW_HEIGHT: f32 = 28.0;
const PARTICIPANT_SPACING: f32 = 6.0;
const EVENT_PADDING: f32 = 8.0;
const MIN_EVENT_HEIGHT: f32 = 36.0;
const EVENT_INSET_X: f32 = 6.0;
const POINT_WIDTH_FACTOR: f32 = 0.35;
const TRAILING_WIDTH: f32 = 300.0;
const TRAILING_HEIGHT: f32 = 120.0;

/// One horizontal lane of the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneLayout {
    /// Place id, or [`NO_PLACE_LANE`].
    pub id: String,
    pub label: String,
    /// Absolute top edge in scene coordinates.
    pub top: f32,
    pub height: f32,
    pub color: String,
}

/// One positioned event block.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLayout {
    pub id: String,
    pub lane_id: String,
    pub start_offset: i64,
    pub end_offset: i64,
    /// Column index inside the lane; events sharing a column never overlap
    /// in time.
    pub column: usize,
    /// Number of columns in this event's lane.
    pub column_count: usize,
    /// Absolute scene coordinates.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub is_point: bool,
    /// Block color, shared with the lane.
    pub color: String,
}

/// A full timeline layout: absolute coordinates for every lane and event.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineLayout {
    pub mode: TimelineMode,
    /// Units on the visible axis.
    pub day_count: i64,
    /// One label per axis unit.
    pub axis_labels: Vec<String>,
    /// Lanes in final top-to-bottom order.
    pub lanes: Vec<LaneLayout>,
    pub events: Vec<EventLayout>,
    pub total_width: f32,
    pub total_height: f32,
}

impl TimelineLayout {
    /// Lane carrying the given id, if present.
    pub fn lane(&self, lane_id: &str) -> Option<&LaneLayout> {
        self.lanes.iter().find(|l| l.id == lane_id)
    }

    /// Layout entry for the given event, if it was placed.
    pub fn event(&self, event_id: &str) -> Option<&EventLayout> {
        self.events.iter().find(|e| e.id == event_id)
    }
}

/// The lane an event belongs to: its first associated place that has a
/// lane, else the synthetic no-place lane.
pub fn resolve_place(event: &Event, lane_index: &HashMap<String, usize>) -> String {
    for place_id in &event.associated_places {
        if lane_index.contains_key(place_id) {
            return place_id.clone();
        }
    }
    NO_PLACE_LANE.to_string()
}

/// Lane order: one lane per place in reverse collection order, extra lanes
/// for place ids only events know about, and the synthetic no-place lane
/// prepended when any event needs it or no lanes exist at all.
fn build_lane_order(events: &[Event], places: &[Place]) -> Vec<(String, String)> {
    let mut lanes: Vec<(String, String)> = places
        .iter()
        .rev()
        .map(|p| (p.id.clone(), p.name.clone()))
        .collect();
    let mut known: HashSet<String> = lanes.iter().map(|(id, _)| id.clone()).collect();

    let mut has_no_place = false;
    for event in events {
        if event.associated_places.is_empty() {
            has_no_place = true;
            continue;
        }
        for place_id in &event.associated_places {
            if known.insert(place_id.clone()) {
                lanes.push((place_id.clone(), format!("Place {place_id}")));
            }
        }
    }

    if lanes.is_empty() || has_no_place {
        let mut with_bucket = vec![(NO_PLACE_LANE.to_string(), NO_PLACE_LABEL.to_string())];
        with_bucket.extend(lanes);
        lanes = with_bucket;
    }
    lanes
}

/// Height of one event block from its participant content.
fn event_height(participant_count: usize) -> f32 {
    if participant_count == 0 {
        return EVENT_BASE_HEIGHT + EVENT_PADDING;
    }
    let rows = PARTICIPANT_ROW_HEIGHT * participant_count as f32;
    let spacing = PARTICIPANT_SPACING * (participant_count.saturating_sub(1)) as f32;
    EVENT_BASE_HEIGHT + rows + spacing + EVENT_PADDING
}

/// Count an event's participants that actually exist, duplicates removed.
fn live_participant_count(event: &Event, characters: &[Character]) -> usize {
    let mut seen = Vec::new();
    for id in &event.participants {
        if !seen.contains(&id) && characters.iter().any(|c| &c.id == id) {
            seen.push(id);
        }
    }
    seen.len()
}

struct PackedEvent {
    event_index: usize,
    start: i64,
    end: i64,
    is_point: bool,
    height: f32,
    column: usize,
}

/// Greedy interval packing: events sorted by (start, longest-first) take
/// the first column whose last event ends strictly before their start.
/// Returns the column count.
fn assign_columns(lane_events: &mut [PackedEvent]) -> usize {
    let mut column_ends: Vec<i64> = Vec::new();
    for packed in lane_events.iter_mut() {
        let mut assigned = None;
        for (index, last_end) in column_ends.iter_mut().enumerate() {
            if packed.start > *last_end {
                *last_end = packed.end;
                assigned = Some(index);
                break;
            }
        }
        packed.column = match assigned {
            Some(index) => index,
            None => {
                column_ends.push(packed.end);
                column_ends.len() - 1
            }
        };
    }
    column_ends.len().max(1)
}

/// Compute the full layout. `normalized` must be index-aligned with
/// `events` (as produced by [`crate::timeline::normalize::normalize_events`]
/// over the same slice).
pub fn layout(
    events: &[Event],
    normalized: &[NormalizedEvent],
    places: &[Place],
    characters: &[Character],
    axis: &TimeAxis,
    colors: &mut ColorAllocator,
) -> TimelineLayout {
    debug_assert_eq!(events.len(), normalized.len());

    let lane_order = build_lane_order(events, places);
    let lane_index: HashMap<String, usize> = lane_order
        .iter()
        .enumerate()
        .map(|(index, (id, _))| (id.clone(), index))
        .collect();

    // Bucket events per lane, tallest content first computed up front.
    let mut lane_events: Vec<Vec<PackedEvent>> = (0..lane_order.len()).map(|_| Vec::new()).collect();
    for (event_index, (event, norm)) in events.iter().zip(normalized).enumerate() {
        let lane_id = resolve_place(event, &lane_index);
        let lane = lane_index[&lane_id];
        let height = event_height(live_participant_count(event, characters)).max(MIN_EVENT_HEIGHT);
        lane_events[lane].push(PackedEvent {
            event_index,
            start: norm.start_offset,
            end: norm.end_offset,
            is_point: norm.is_point,
            height,
            column: 0,
        });
    }

    // Pack columns per lane and derive the lane's uniform slot height from
    // its tallest event, so equal column indices line up across the lane.
    let mut lane_columns: Vec<usize> = Vec::with_capacity(lane_order.len());
    let mut lane_slots: Vec<f32> = Vec::with_capacity(lane_order.len());
    let mut lane_heights: Vec<f32> = Vec::with_capacity(lane_order.len());
    for bucket in lane_events.iter_mut() {
        bucket.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then_with(|| events[a.event_index].id.cmp(&events[b.event_index].id))
        });
        let columns = assign_columns(bucket);
        let slot = bucket.iter().map(|p| p.height).fold(0.0_f32, f32::max);
        let height = if bucket.is_empty() {
            DEFAULT_LANE_HEIGHT
        } else {
            let needed = LANE_TOP_INSET + slot * columns as f32 + LANE_BOTTOM_RESERVE;
            needed.max(DEFAULT_LANE_HEIGHT)
        };
        lane_columns.push(columns);
        lane_slots.push(slot);
        lane_heights.push(height);
    }

    // Stack lanes top to bottom.
    let mut lanes = Vec::with_capacity(lane_order.len());
    let mut current_top = TOP_MARGIN;
    for (index, (id, label)) in lane_order.iter().enumerate() {
        let stored = places.iter().find(|p| &p.id == id).map(|p| p.color.as_str());
        lanes.push(LaneLayout {
            id: id.clone(),
            label: label.clone(),
            top: current_top,
            height: lane_heights[index],
            color: colors.lane_color(id, stored),
        });
        current_top += lane_heights[index];
    }
    let total_height = current_top + TRAILING_HEIGHT;

    // Absolute event geometry.
    let mut placed = Vec::with_capacity(events.len());
    for (lane_pos, bucket) in lane_events.iter().enumerate() {
        let lane = &lanes[lane_pos];
        let columns = lane_columns[lane_pos];
        let slot = lane_slots[lane_pos];
        for packed in bucket {
            let event = &events[packed.event_index];
            let duration = (packed.end - packed.start + 1).max(1) as f32;
            let mut width = (duration * DAY_WIDTH - 2.0 * EVENT_INSET_X).max(DAY_WIDTH * POINT_WIDTH_FACTOR);
            let mut x = LEFT_MARGIN + packed.start as f32 * DAY_WIDTH + EVENT_INSET_X;
            if packed.is_point {
                width = width.min(DAY_WIDTH * POINT_WIDTH_FACTOR);
                x = LEFT_MARGIN + packed.start as f32 * DAY_WIDTH + (DAY_WIDTH - width) / 2.0;
            }
            let y = lane.top
                + LANE_TOP_INSET
                + packed.column as f32 * slot
                + (slot - packed.height) / 2.0;

            placed.push(EventLayout {
                id: event.id.clone(),
                lane_id: lane.id.clone(),
                start_offset: packed.start,
                end_offset: packed.end,
                column: packed.column,
                column_count: columns,
                x,
                y,
                width,
                height: packed.height,
                is_point: packed.is_point,
                color: lane.color.clone(),
            });
        }
    }
    placed.sort_by(|a, b| {
        a.start_offset
            .cmp(&b.start_offset)
            .then_with(|| a.id.cmp(&b.id))
    });

    TimelineLayout {
        mode: axis.mode,
        day_count: axis.day_count,
        axis_labels: axis.labels(),
        lanes,
        events: placed,
        total_width: LEFT_MARGIN + axis.day_count as f32 * DAY_WIDTH + TRAILING_WIDTH,
        total_height,
    }
}
