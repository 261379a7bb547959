//! Notation renderer driving highlight and cursor on a [`ScoreSurface`]
//!
//! Shared by every backend that exposes its rendered score as an element tree
//! with ids matching the converter's event stream (Verovio SVG, static SVG,
//! headless). The temporal data (event stream) is fixed for a loaded score;
//! only geometry is recomputed on resize.

use super::cursor::{horizontal_scroll, place_cursor};
use super::surface::{Rect, ScoreSurface};
use super::SheetRenderer;
use crate::error::{Result, SyncError};
use crate::models::{ElementId, EventStream, PlaybackLocation};
use crate::options::RendererOptions;
use crate::sync::highlight::HighlightState;

/// Cached geometry of one measure
#[derive(Clone, Debug, PartialEq)]
struct MeasureGeometry {
    system_id: ElementId,
    rect_measure: Rect,
    rect_system: Rect,
}

pub struct NotationRenderer<S: ScoreSurface> {
    surface: S,
    stream: EventStream,
    options: RendererOptions,
    highlight: HighlightState,
    measures: Vec<MeasureGeometry>,
    /// Boxes of the elements starting at each event; never empty once laid out
    event_rects: Vec<Vec<Rect>>,
    cursor_offset: f64,
    scroll_offset: f64,
    current: PlaybackLocation,
    initialized: bool,
}

impl<S: ScoreSurface> NotationRenderer<S> {
    pub fn new(surface: S, stream: EventStream, options: RendererOptions) -> Self {
        let highlight = HighlightState::new(options.highlight_color.clone());
        Self {
            surface,
            stream,
            options,
            highlight,
            measures: Vec::new(),
            event_rects: Vec::new(),
            cursor_offset: 0.0,
            scroll_offset: 0.0,
            current: PlaybackLocation::default(),
            initialized: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn stream(&self) -> &EventStream {
        &self.stream
    }

    pub fn highlight(&self) -> &HighlightState {
        &self.highlight
    }

    /// Last location passed to `move_to`
    pub fn current_location(&self) -> PlaybackLocation {
        self.current
    }

    /// Left edge of the first sounding element at the last layout
    pub fn cursor_offset(&self) -> f64 {
        self.cursor_offset
    }

    /// Measure box as laid out, after first-note clipping
    pub fn measure_rect(&self, measure_entry: usize) -> Option<Rect> {
        self.measures.get(measure_entry).map(|m| m.rect_measure)
    }

    /// Recompute measure, system and note boxes from the surface
    fn refresh(&mut self) -> Result<()> {
        let mut measures = Vec::with_capacity(self.stream.measures().len());
        for anchor in self.stream.measures() {
            let system_id = self.surface.system_of(&anchor.element_id)?;
            measures.push(MeasureGeometry {
                rect_measure: self.surface.bounding_rect(&anchor.element_id)?,
                rect_system: self.surface.bounding_rect(&system_id)?,
                system_id,
            });
        }

        let mut event_rects = Vec::with_capacity(self.stream.events().len());
        for (i, event) in self.stream.events().iter().enumerate() {
            let mut rects: Vec<Rect> = event
                .elements_turning_on
                .iter()
                .filter_map(|id| match self.surface.bounding_rect(id) {
                    Ok(rect) => Some(rect),
                    Err(e) => {
                        log::debug!("no geometry for event {}: {}", i, e);
                        None
                    }
                })
                .collect();
            if rects.is_empty() {
                rects.push(measures[event.measure_entry].rect_measure);
            }

            // Start the first measure at the first sounding element so the
            // cursor skips clefs and key/time signatures.
            if i == 0 {
                let first_left = rects[0].left();
                measures[event.measure_entry].rect_measure.clip_left(first_left);
                self.cursor_offset = first_left;
            }
            event_rects.push(rects);
        }

        self.measures = measures;
        self.event_rects = event_rects;
        self.scroll_offset = self.surface.scroll_left();
        Ok(())
    }

    fn render(&mut self, location: PlaybackLocation) -> Result<()> {
        if !self.initialized {
            return Err(SyncError::Renderer("renderer is not initialized".to_string()));
        }
        self.current = location;
        let Some(last_measure) = self.measures.len().checked_sub(1) else {
            return Ok(());
        };
        let measure_entry = if location.measure_index > last_measure {
            log::debug!(
                "measure {} out of range, clamped to {}",
                location.measure_index,
                last_measure
            );
            last_measure
        } else {
            location.measure_index
        };

        let anchor = &self.stream.measures()[measure_entry];
        let target_ms = anchor.timestamp_ms + location.offset_within_measure_ms;
        let Some(step) = self
            .highlight
            .apply(&mut self.surface, &self.stream, measure_entry, target_ms)
        else {
            return Ok(());
        };

        let geometry = &self.measures[measure_entry];
        if step.changed && self.options.follow_cursor {
            if self.options.horizontal {
                if location.measure_duration_ms.is_none() {
                    let event = &self.stream.events()[step.event_index];
                    let focus = event
                        .elements_sounding_after
                        .first()
                        .unwrap_or(&anchor.element_id);
                    self.surface.scroll_into_view(focus);
                }
            } else {
                self.surface.scroll_into_view(&geometry.system_id);
            }
        }

        if self.options.horizontal {
            if let Some(left) = horizontal_scroll(&location, &geometry.rect_measure, self.cursor_offset) {
                self.surface.scroll_to(left);
            }
        }

        let rect_note = self.event_rects[step.event_index][0];
        let cursor = place_cursor(
            &location,
            self.scroll_offset,
            &geometry.rect_measure,
            &geometry.rect_system,
            &rect_note,
        );
        self.surface.place_cursor(cursor);
        Ok(())
    }
}

impl<S: ScoreSurface> SheetRenderer for NotationRenderer<S> {
    fn initialize(&mut self) -> Result<()> {
        self.refresh()?;
        self.initialized = true;
        log::info!(
            "notation renderer ready: {} measures, {} events",
            self.measures.len(),
            self.event_rects.len()
        );
        Ok(())
    }

    fn move_to(&mut self, location: &PlaybackLocation) -> Result<()> {
        self.render(*location)
    }

    fn on_resize(&mut self) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.refresh()?;
        self.render(self.current)
    }

    fn on_event(&mut self, element_id: &str) -> Option<PlaybackLocation> {
        self.stream.locate(element_id)
    }

    fn destroy(&mut self) {
        self.highlight.release(&mut self.surface);
        self.surface.remove_cursor();
        self.initialized = false;
    }

    fn version(&self) -> String {
        format!("{}/NotationRenderer v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessSurface;
    use crate::models::RawSoundingEvent;

    fn raw(ts: f64, on: &[&str], off: &[&str], measure_on: Option<&str>) -> RawSoundingEvent {
        RawSoundingEvent {
            timestamp_ms: ts,
            on: on.iter().map(|s| s.to_string()).collect(),
            off: off.iter().map(|s| s.to_string()).collect(),
            measure_on: measure_on.map(|s| s.to_string()),
        }
    }

    fn renderer(options: RendererOptions) -> NotationRenderer<HeadlessSurface> {
        let stream = EventStream::build(vec![
            raw(0.0, &["n1"], &[], Some("m1")),
            raw(500.0, &["n2"], &["n1"], None),
            raw(1000.0, &["n3"], &["n2"], Some("m2")),
        ])
        .expect("valid stream");

        let surface = HeadlessSurface::new();
        surface.add_element("sys1", Rect::new(0.0, 100.0, 1000.0, 200.0), None);
        surface.add_element("m1", Rect::new(0.0, 120.0, 500.0, 80.0), Some("sys1"));
        surface.add_element("m2", Rect::new(500.0, 120.0, 500.0, 80.0), Some("sys1"));
        surface.add_element("n1", Rect::new(100.0, 130.0, 10.0, 10.0), Some("sys1"));
        surface.add_element("n2", Rect::new(300.0, 130.0, 10.0, 10.0), Some("sys1"));
        surface.add_element("n3", Rect::new(550.0, 130.0, 10.0, 10.0), Some("sys1"));
        NotationRenderer::new(surface, stream, options)
    }

    #[test]
    fn test_first_measure_clipped_to_first_note() {
        let mut renderer = renderer(RendererOptions::default());
        renderer.initialize().expect("layout succeeds");
        assert_eq!(renderer.measure_rect(0), Some(Rect::new(100.0, 120.0, 400.0, 80.0)));
        assert_eq!(renderer.cursor_offset(), 100.0);
    }

    #[test]
    fn test_move_before_initialize_fails() {
        let mut renderer = renderer(RendererOptions::default());
        let result = renderer.move_to(&PlaybackLocation::default());
        assert!(matches!(result, Err(SyncError::Renderer(_))));
    }

    #[test]
    fn test_cursor_interpolates_in_playback() {
        let mut renderer = renderer(RendererOptions::default());
        renderer.initialize().unwrap();
        renderer
            .move_to(&PlaybackLocation {
                measure_index: 0,
                measure_onset_ms: 0.0,
                offset_within_measure_ms: 500.0,
                measure_duration_ms: Some(1000.0),
            })
            .unwrap();

        let cursor = renderer.surface().cursor().expect("cursor placed");
        assert_eq!(cursor.x, 300.0);
        assert_eq!(cursor.y, 100.0);
        assert_eq!(cursor.height, 200.0);
        assert_eq!(renderer.highlight().active_event_index(), Some(1));
    }

    #[test]
    fn test_cursor_snaps_after_jump() {
        let mut renderer = renderer(RendererOptions::default());
        renderer.initialize().unwrap();
        renderer.move_to(&PlaybackLocation::discrete(1, 1000.0, 0.0)).unwrap();
        assert_eq!(renderer.surface().cursor().unwrap().x, 550.0);
        assert_eq!(renderer.surface().scrolled_into_view(), vec!["sys1".to_string()]);
    }

    #[test]
    fn test_resize_recomputes_geometry() {
        let mut renderer = renderer(RendererOptions::default());
        renderer.initialize().unwrap();
        renderer.move_to(&PlaybackLocation::discrete(1, 1000.0, 0.0)).unwrap();

        renderer.surface().set_rect("n3", Rect::new(650.0, 130.0, 10.0, 10.0));
        renderer.on_resize().unwrap();
        assert_eq!(renderer.surface().cursor().unwrap().x, 650.0);
        assert_eq!(renderer.current_location(), PlaybackLocation::discrete(1, 1000.0, 0.0));
    }

    #[test]
    fn test_on_event_locates_clicked_note() {
        let mut renderer = renderer(RendererOptions::default());
        renderer.initialize().unwrap();
        assert_eq!(renderer.on_event("n2"), Some(PlaybackLocation::discrete(0, 0.0, 500.0)));
    }

    #[test]
    fn test_destroy_restores_styles_and_cursor() {
        let mut renderer = renderer(RendererOptions::default());
        renderer.initialize().unwrap();
        renderer.move_to(&PlaybackLocation::discrete(0, 0.0, 0.0)).unwrap();
        assert!(renderer.surface().attribute("n1", "fill").unwrap().is_some());

        renderer.destroy();
        assert_eq!(renderer.surface().attribute("n1", "fill").unwrap(), None);
        assert!(renderer.surface().cursor().is_none());
    }

    #[test]
    fn test_horizontal_mode_scrolls_container() {
        let options = RendererOptions {
            horizontal: true,
            ..RendererOptions::default()
        };
        let mut renderer = renderer(options);
        renderer.initialize().unwrap();
        renderer
            .move_to(&PlaybackLocation {
                measure_index: 1,
                measure_onset_ms: 1000.0,
                offset_within_measure_ms: 250.0,
                measure_duration_ms: Some(500.0),
            })
            .unwrap();
        assert_eq!(renderer.surface().scroll_left(), 650.0);
    }
}
