//! Data models for score playback synchronization
//!
//! - `timemap`: measure onsets and durations on the millisecond timeline
//! - `events`: sounding-element events with cached sounding sets
//! - `location`: the measure + offset vocabulary passed to renderers

pub mod events;
pub mod location;
pub mod timemap;

// Re-export commonly used types
pub use events::{ElementId, EventStream, MeasureAnchor, RawSoundingEvent, SoundingEvent};
pub use location::PlaybackLocation;
pub use timemap::{build_timemap, total_duration_ms, MeasureIndex, Millis, Timemap, TimemapEntry};
