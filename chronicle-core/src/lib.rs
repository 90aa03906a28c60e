//! Narrative timeline engine.
//!
//! This crate is the data and layout core of a narrative-timeline editor:
//! users define characters, events, and places, link them together, and
//! view the result as a lane-based visual timeline. The surrounding UI
//! (dialogs, tables, drawing) stays outside; the engine provides:
//!
//! - An entity store with consistent bidirectional associations between
//!   the three entity kinds, kept in sync by a single synchronizer
//! - Temporal conflict validation: a character can never be added to two
//!   events that overlap in time
//! - Two per-event time representations (calendar dates and ordinal "Day
//!   N" indices) normalized onto one integer axis
//! - A collision-free two-dimensional layout: one lane per place, greedy
//!   column packing for concurrent events, content-driven heights
//!
//! # Quick Start
//!
//! ```
//! use chronicle_core::{CharacterForm, EventForm, TimelineMode, TimelineStore};
//!
//! let mut store = TimelineStore::new("My Saga");
//! let mira = store.add_character(CharacterForm {
//!     name: "Mira".to_string(),
//!     ..Default::default()
//! })?;
//!
//! store.add_event(EventForm {
//!     name: "The Landing".to_string(),
//!     timeline_mode: Some(TimelineMode::DaySequence),
//!     day_index: Some(1),
//!     day_index_end: Some(3),
//!     participants: vec![mira],
//!     ..Default::default()
//! })?;
//!
//! let layout = store.layout(None);
//! assert_eq!(layout.events.len(), 1);
//! # Ok::<(), chronicle_core::EditError>(())
//! ```

pub mod character;
pub mod event;
pub mod ids;
pub mod persist;
pub mod place;
pub mod project;
pub mod store;
pub mod sync;
pub mod timeline;

// Primary public API
pub use character::Character;
pub use event::{DisplayMode, Event, TimelineMode};
pub use persist::{open_store, save_store, PersistError, SavedProject};
pub use place::Place;
pub use project::{EntityKind, Project, ProjectMetadata};
pub use store::{CharacterForm, EditError, EventForm, PlaceForm, TimelineStore};
pub use timeline::{
    ConflictError, EventLayout, LaneLayout, TimeRange, TimelineLayout, NO_PLACE_LANE,
};
