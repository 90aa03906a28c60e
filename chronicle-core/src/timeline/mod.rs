//! The timeline engine: time normalization, overlap validation, and the
//! lane/column layout.

pub mod color;
pub mod layout;
pub mod normalize;
pub mod overlap;

pub use color::{ColorAllocator, CHARACTER_PALETTE, LANE_PALETTE, NO_PLACE_COLOR};
pub use layout::{
    resolve_place, EventLayout, LaneLayout, TimelineLayout, NO_PLACE_LANE, NO_PLACE_LABEL,
};
pub use normalize::{
    extract_day_index, normalize_events, parse_date, AxisOrigin, NormalizedEvent, TimeAxis,
};
pub use overlap::{
    events_overlap, validate_event_participants, validate_move, validate_participant_set,
    ConflictError, EventWindow, TimeRange,
};
