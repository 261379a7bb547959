//! Synchronization engine
//!
//! - `resolver`: timestamp/measure lookups on the timemap
//! - `highlight`: incremental sounding-element highlighting
//! - `scheduler`: frame scheduling seam and resize debouncing
//! - `player`: the playback state machine tying collaborators together

pub mod highlight;
pub mod player;
pub mod resolver;
pub mod scheduler;

pub use highlight::{ActiveElement, HighlightState, HighlightStep, SavedStyle, HIGHLIGHT_ATTRIBUTES};
pub use player::{AudioSequencer, Player, PlayerState};
pub use resolver::{resolve_by_measure_and_position, resolve_by_timestamp};
pub use scheduler::{Debouncer, FrameOutcome, FrameScheduler};
