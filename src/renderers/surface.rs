//! Render-tree access used by the synchronization engine
//!
//! The rendering backend owns the element tree. The engine only reads
//! geometry and reads/writes presentation attributes on elements it has been
//! told exist; it never changes layout.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ElementId;

/// Axis-aligned box in page coordinates (same convention as `DOMRect`)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> f64 {
        self.x.min(self.x + self.width)
    }

    pub fn top(&self) -> f64 {
        self.y.min(self.y + self.height)
    }

    /// Shrink from the left so the box starts at `left`, keeping the right edge
    pub fn clip_left(&mut self, left: f64) {
        self.width -= left - self.left();
        self.x = left;
    }
}

/// Where the playback cursor is drawn
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct CursorPlacement {
    pub x: f64,
    pub y: f64,
    pub height: f64,
}

/// Element lookup and mutation surface of a rendered score
///
/// Every element-addressed method fails with
/// [`SyncError::StaleElementReference`](crate::error::SyncError) when the id is
/// no longer in the tree.
pub trait ScoreSurface {
    fn attribute(&self, element_id: &str, name: &str) -> Result<Option<String>>;

    fn set_attribute(&mut self, element_id: &str, name: &str, value: &str) -> Result<()>;

    fn remove_attribute(&mut self, element_id: &str, name: &str) -> Result<()>;

    fn bounding_rect(&self, element_id: &str) -> Result<Rect>;

    /// Id of the system (staff line group) containing the element
    fn system_of(&self, element_id: &str) -> Result<ElementId>;

    /// Horizontal scroll offset of the score container
    fn scroll_left(&self) -> f64;

    fn scroll_to(&mut self, left: f64);

    fn scroll_into_view(&mut self, element_id: &str);

    fn place_cursor(&mut self, cursor: CursorPlacement);

    fn remove_cursor(&mut self);
}
