//! Incremental note highlighting
//!
//! Tracks which sounding event is currently shown and which elements carry the
//! highlight overlay. Each query scans forward from the owning measure's first
//! event (or from the active event when it is still behind the target), then
//! applies only the difference against the previously highlighted set.
//!
//! Highlighting overwrites `fill`/`stroke` on elements owned by the renderer,
//! so the original values are captured before the first write and written
//! back (or removed) when the element stops sounding.

use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::models::{ElementId, EventStream, Millis};
use crate::renderers::ScoreSurface;

/// Presentation attributes overwritten by the highlight
pub const HIGHLIGHT_ATTRIBUTES: [&str; 2] = ["fill", "stroke"];

/// Pre-highlight values of [`HIGHLIGHT_ATTRIBUTES`]
#[derive(Serialize, Clone, Debug, PartialEq, Default)]
pub struct SavedStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
}

impl SavedStyle {
    fn capture<S: ScoreSurface + ?Sized>(surface: &S, element_id: &str) -> Result<Self> {
        Ok(Self {
            fill: surface.attribute(element_id, "fill")?,
            stroke: surface.attribute(element_id, "stroke")?,
        })
    }

    fn restore<S: ScoreSurface + ?Sized>(&self, surface: &mut S, element_id: &str) -> Result<()> {
        for (name, value) in [("fill", &self.fill), ("stroke", &self.stroke)] {
            match value {
                Some(value) => surface.set_attribute(element_id, name, value)?,
                None => surface.remove_attribute(element_id, name)?,
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ActiveElement {
    pub element_id: ElementId,
    pub saved: SavedStyle,
}

/// Result of one highlight step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightStep {
    /// Event shown after the step
    pub event_index: usize,
    /// Whether any style was written
    pub changed: bool,
}

#[derive(Clone, Debug)]
pub struct HighlightState {
    active_event_index: Option<usize>,
    active_elements: Vec<ActiveElement>,
    color: String,
}

impl HighlightState {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            active_event_index: None,
            active_elements: Vec::new(),
            color: color.into(),
        }
    }

    pub fn active_event_index(&self) -> Option<usize> {
        self.active_event_index
    }

    pub fn active_elements(&self) -> &[ActiveElement] {
        &self.active_elements
    }

    /// Event sounding at `target_ms`, scanning from `measure_entry`
    ///
    /// Returns `None` for an empty stream. A `measure_entry` past the end is
    /// clamped to the last measure.
    pub fn find_event(&self, stream: &EventStream, measure_entry: usize, target_ms: Millis) -> Option<usize> {
        let events = stream.events();
        let measure = stream
            .measures()
            .get(measure_entry)
            .or_else(|| stream.measures().last())?;

        let mut index = measure.first_event;
        if let Some(active) = self.active_event_index {
            if active > index && active < events.len() && events[active].timestamp_ms <= target_ms {
                index = active;
            }
        }
        while index + 1 < events.len() && events[index + 1].timestamp_ms <= target_ms {
            index += 1;
        }
        Some(index)
    }

    /// Move the highlight to the event sounding at `target_ms`
    ///
    /// Styles are only touched when the resolved event differs from the active
    /// one, or nothing is highlighted yet. Elements missing from the surface are
    /// skipped.
    pub fn apply<S: ScoreSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        stream: &EventStream,
        measure_entry: usize,
        target_ms: Millis,
    ) -> Option<HighlightStep> {
        let event_index = self.find_event(stream, measure_entry, target_ms)?;

        if self.active_event_index == Some(event_index) && !self.active_elements.is_empty() {
            return Some(HighlightStep {
                event_index,
                changed: false,
            });
        }

        let event = &stream.events()[event_index];
        let targets: Vec<&str> = if event.elements_sounding_after.is_empty() {
            vec![stream.measures()[event.measure_entry].element_id.as_str()]
        } else {
            event.elements_sounding_after.iter().map(String::as_str).collect()
        };

        let (keep, release): (Vec<ActiveElement>, Vec<ActiveElement>) = self
            .active_elements
            .drain(..)
            .partition(|active| targets.contains(&active.element_id.as_str()));
        for active in &release {
            swallow_stale(active.saved.restore(surface, &active.element_id));
        }
        self.active_elements = keep;

        for element_id in targets {
            if self.active_elements.iter().any(|a| a.element_id == element_id) {
                continue;
            }
            let saved = match SavedStyle::capture(surface, element_id) {
                Ok(saved) => saved,
                Err(e) => {
                    swallow_stale(Err(e));
                    continue;
                }
            };
            if swallow_stale(self.paint(surface, element_id)) {
                self.active_elements.push(ActiveElement {
                    element_id: element_id.to_string(),
                    saved,
                });
            }
        }

        self.active_event_index = Some(event_index);
        Some(HighlightStep {
            event_index,
            changed: true,
        })
    }

    /// Restore every highlighted element and forget the active event
    pub fn release<S: ScoreSurface + ?Sized>(&mut self, surface: &mut S) {
        for active in self.active_elements.drain(..) {
            swallow_stale(active.saved.restore(surface, &active.element_id));
        }
        self.active_event_index = None;
    }

    fn paint<S: ScoreSurface + ?Sized>(&self, surface: &mut S, element_id: &str) -> Result<()> {
        for name in HIGHLIGHT_ATTRIBUTES {
            surface.set_attribute(element_id, name, &self.color)?;
        }
        Ok(())
    }
}

/// Stale references degrade to a no-op; returns whether the call succeeded
fn swallow_stale(result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(SyncError::StaleElementReference(id)) => {
            log::debug!("skipping highlight update for missing element {}", id);
            false
        }
        Err(e) => {
            log::warn!("highlight update failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessSurface;
    use crate::models::RawSoundingEvent;
    use crate::renderers::Rect;

    const COLOR: &str = "red";

    fn raw(ts: Millis, on: &[&str], off: &[&str], measure_on: Option<&str>) -> RawSoundingEvent {
        RawSoundingEvent {
            timestamp_ms: ts,
            on: on.iter().map(|s| s.to_string()).collect(),
            off: off.iter().map(|s| s.to_string()).collect(),
            measure_on: measure_on.map(|s| s.to_string()),
        }
    }

    fn fixture() -> (HeadlessSurface, EventStream) {
        let stream = EventStream::build(vec![
            raw(0.0, &["n1"], &[], Some("m1")),
            raw(500.0, &["n2"], &["n1"], None),
            raw(1000.0, &[], &["n2"], Some("m2")),
            raw(1500.0, &["n3"], &[], None),
        ])
        .expect("valid stream");

        let surface = HeadlessSurface::new();
        for id in ["m1", "m2", "n1", "n2", "n3"] {
            surface.add_element(id, Rect::default(), None);
        }
        surface.set_initial_attribute("n1", "fill", "black");
        (surface, stream)
    }

    #[test]
    fn test_highlight_first_event() {
        let (mut surface, stream) = fixture();
        let mut state = HighlightState::new(COLOR);

        let step = state.apply(&mut surface, &stream, 0, 100.0).unwrap();
        assert_eq!(step, HighlightStep { event_index: 0, changed: true });
        assert_eq!(surface.attribute("n1", "fill").unwrap().as_deref(), Some(COLOR));
        assert_eq!(state.active_elements()[0].saved.fill.as_deref(), Some("black"));
    }

    #[test]
    fn test_same_timestamp_is_idempotent() {
        let (mut surface, stream) = fixture();
        let mut state = HighlightState::new(COLOR);

        state.apply(&mut surface, &stream, 0, 600.0);
        let writes = surface.mutation_count();
        let step = state.apply(&mut surface, &stream, 0, 600.0).unwrap();
        assert!(!step.changed);
        assert_eq!(surface.mutation_count(), writes);
    }

    #[test]
    fn test_restores_released_elements() {
        let (mut surface, stream) = fixture();
        let mut state = HighlightState::new(COLOR);

        state.apply(&mut surface, &stream, 0, 0.0);
        state.apply(&mut surface, &stream, 0, 700.0);

        assert_eq!(surface.attribute("n1", "fill").unwrap().as_deref(), Some("black"));
        assert_eq!(surface.attribute("n1", "stroke").unwrap(), None);
        assert_eq!(surface.attribute("n2", "fill").unwrap().as_deref(), Some(COLOR));
    }

    #[test]
    fn test_rest_highlights_measure() {
        let (mut surface, stream) = fixture();
        let mut state = HighlightState::new(COLOR);

        let step = state.apply(&mut surface, &stream, 1, 1200.0).unwrap();
        assert_eq!(step.event_index, 2);
        assert_eq!(surface.attribute("m2", "fill").unwrap().as_deref(), Some(COLOR));
        assert_eq!(state.active_elements().len(), 1);
    }

    #[test]
    fn test_backward_seek_rescans_from_measure() {
        let (mut surface, stream) = fixture();
        let mut state = HighlightState::new(COLOR);

        state.apply(&mut surface, &stream, 1, 1600.0);
        let step = state.apply(&mut surface, &stream, 0, 10.0).unwrap();
        assert_eq!(step.event_index, 0);
        assert_eq!(surface.attribute("n3", "fill").unwrap(), None);
        assert_eq!(surface.attribute("n1", "fill").unwrap().as_deref(), Some(COLOR));
    }

    #[test]
    fn test_stale_elements_are_skipped() {
        let (mut surface, stream) = fixture();
        let mut state = HighlightState::new(COLOR);

        state.apply(&mut surface, &stream, 0, 0.0);
        surface.remove_element("n1");
        let step = state.apply(&mut surface, &stream, 0, 600.0).unwrap();
        assert!(step.changed);
        assert_eq!(surface.attribute("n2", "fill").unwrap().as_deref(), Some(COLOR));
    }

    #[test]
    fn test_release_restores_everything() {
        let (mut surface, stream) = fixture();
        let mut state = HighlightState::new(COLOR);

        state.apply(&mut surface, &stream, 0, 0.0);
        state.release(&mut surface);
        assert_eq!(surface.attribute("n1", "fill").unwrap().as_deref(), Some("black"));
        assert!(state.active_elements().is_empty());
        assert_eq!(state.active_event_index(), None);
    }

    #[test]
    fn test_empty_stream() {
        let mut surface = HeadlessSurface::new();
        let mut state = HighlightState::new(COLOR);
        assert!(state.apply(&mut surface, &EventStream::default(), 0, 0.0).is_none());
    }
}
