//! Cursor geometry
//!
//! During continuous playback the cursor glides across the measure in
//! proportion to the elapsed time. After a discrete jump it snaps to the
//! left edge of the first sounding note.

use super::surface::{CursorPlacement, Rect};
use crate::models::PlaybackLocation;

/// Fraction of the measure already played, if the location interpolates
pub fn measure_progress(location: &PlaybackLocation) -> Option<f64> {
    match location.measure_duration_ms {
        Some(duration) if duration > 0.0 => {
            Some((location.offset_within_measure_ms / duration).clamp(0.0, 1.0))
        }
        _ => None,
    }
}

/// Cursor position for `location`
///
/// `scroll_offset` is the container's horizontal scroll at the last layout,
/// so that page coordinates map back into the scrolled container.
pub fn place_cursor(
    location: &PlaybackLocation,
    scroll_offset: f64,
    rect_measure: &Rect,
    rect_system: &Rect,
    rect_note: &Rect,
) -> CursorPlacement {
    let x = match measure_progress(location) {
        Some(progress) => rect_measure.left() + (progress * rect_measure.width).round(),
        None => rect_note.left(),
    };
    CursorPlacement {
        x: scroll_offset + x,
        y: rect_system.top(),
        height: rect_system.height,
    }
}

/// Container scroll that keeps the cursor at a fixed screen position in
/// single-line (horizontal) layouts; `None` when the location snaps
pub fn horizontal_scroll(location: &PlaybackLocation, rect_measure: &Rect, cursor_offset: f64) -> Option<f64> {
    let progress = measure_progress(location)?;
    Some((rect_measure.left() - cursor_offset + progress * rect_measure.width).floor())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects() -> (Rect, Rect, Rect) {
        (
            Rect::new(100.0, 50.0, 200.0, 40.0),
            Rect::new(0.0, 40.0, 800.0, 120.0),
            Rect::new(130.0, 60.0, 10.0, 10.0),
        )
    }

    #[test]
    fn test_interpolates_during_playback() {
        let (measure, system, note) = rects();
        let location = PlaybackLocation {
            measure_index: 0,
            measure_onset_ms: 0.0,
            offset_within_measure_ms: 250.0,
            measure_duration_ms: Some(1000.0),
        };
        let cursor = place_cursor(&location, 0.0, &measure, &system, &note);
        assert_eq!(cursor, CursorPlacement { x: 150.0, y: 40.0, height: 120.0 });
    }

    #[test]
    fn test_progress_is_capped() {
        let location = PlaybackLocation {
            measure_index: 0,
            measure_onset_ms: 0.0,
            offset_within_measure_ms: 1500.0,
            measure_duration_ms: Some(1000.0),
        };
        assert_eq!(measure_progress(&location), Some(1.0));
    }

    #[test]
    fn test_snaps_to_note_after_jump() {
        let (measure, system, note) = rects();
        let location = PlaybackLocation::discrete(0, 0.0, 250.0);
        let cursor = place_cursor(&location, 20.0, &measure, &system, &note);
        assert_eq!(cursor.x, 150.0);
        assert_eq!(horizontal_scroll(&location, &measure, 100.0), None);
    }

    #[test]
    fn test_zero_length_measure_snaps() {
        let location = PlaybackLocation {
            measure_duration_ms: Some(0.0),
            ..PlaybackLocation::discrete(0, 0.0, 0.0)
        };
        assert_eq!(measure_progress(&location), None);
    }

    #[test]
    fn test_horizontal_scroll() {
        let (measure, _, _) = rects();
        let location = PlaybackLocation {
            measure_index: 0,
            measure_onset_ms: 0.0,
            offset_within_measure_ms: 500.0,
            measure_duration_ms: Some(1000.0),
        };
        assert_eq!(horizontal_scroll(&location, &measure, 30.0), Some(170.0));
    }
}
