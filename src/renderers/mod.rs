//! Renderers module
//!
//! A renderer turns resolved playback locations into visual state on a
//! rendered score: note highlighting, cursor placement and scrolling.
//! Backends implement [`SheetRenderer`]; element-tree backends reuse
//! [`NotationRenderer`] over their own [`ScoreSurface`].

pub mod cursor;
pub mod notation;
pub mod surface;

pub use cursor::{horizontal_scroll, measure_progress, place_cursor};
pub use notation::NotationRenderer;
pub use surface::{CursorPlacement, Rect, ScoreSurface};

use crate::error::Result;
use crate::models::PlaybackLocation;

/// Capability surface of a sheet renderer backend
pub trait SheetRenderer {
    /// Lay out and cache geometry; called once before playback
    fn initialize(&mut self) -> Result<()>;

    /// Show `location`; called once per resolved position
    fn move_to(&mut self, location: &PlaybackLocation) -> Result<()>;

    /// Recompute geometry after the container changed size
    fn on_resize(&mut self) -> Result<()>;

    /// Map a user event on an element to a navigation target
    fn on_event(&mut self, element_id: &str) -> Option<PlaybackLocation>;

    /// Restore every highlighted element and drop the cursor
    fn destroy(&mut self);

    fn version(&self) -> String;
}
