//! Sounding-element event stream
//!
//! Each event records which score elements start or stop sounding at a given
//! timestamp. The set of elements sounding after each event is derived once
//! when the stream is built so that highlight queries never replay history.

use serde::{Deserialize, Serialize};

use super::location::PlaybackLocation;
use super::timemap::{MeasureIndex, Millis};
use crate::error::{Result, SyncError};

/// Identifier of a visual element in the rendered score (SVG/DOM id)
pub type ElementId = String;

/// Event as delivered by a converter, before derivation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawSoundingEvent {
    pub timestamp_ms: Millis,
    #[serde(default)]
    pub on: Vec<ElementId>,
    #[serde(default)]
    pub off: Vec<ElementId>,
    /// Element id of a measure starting at this event
    #[serde(default)]
    pub measure_on: Option<ElementId>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoundingEvent {
    pub timestamp_ms: Millis,
    pub elements_turning_on: Vec<ElementId>,
    pub elements_turning_off: Vec<ElementId>,
    /// Index into [`EventStream::measures`] of the owning measure
    pub measure_entry: usize,
    /// Cached: previous sounding set - turning off + turning on
    pub elements_sounding_after: Vec<ElementId>,
}

/// Where a measure starts inside the event stream
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasureAnchor {
    pub measure_index: MeasureIndex,
    pub timestamp_ms: Millis,
    /// First event owned by this measure
    pub first_event: usize,
    /// Whole-measure element, highlighted when nothing else sounds
    pub element_id: ElementId,
}

#[derive(Serialize, Clone, Debug, PartialEq, Default)]
pub struct EventStream {
    events: Vec<SoundingEvent>,
    measures: Vec<MeasureAnchor>,
}

impl EventStream {
    /// Derive the sounding sets and measure anchors from raw events.
    ///
    /// The first event must open a measure and timestamps may not decrease.
    pub fn build(raw: Vec<RawSoundingEvent>) -> Result<Self> {
        let mut events: Vec<SoundingEvent> = Vec::with_capacity(raw.len());
        let mut measures: Vec<MeasureAnchor> = Vec::new();
        let mut previous_timestamp = 0.0;

        for (i, event) in raw.into_iter().enumerate() {
            if !event.timestamp_ms.is_finite() || event.timestamp_ms < previous_timestamp {
                return Err(SyncError::MalformedTimemap(format!(
                    "sounding event {} at {}ms is out of order",
                    i, event.timestamp_ms
                )));
            }
            previous_timestamp = event.timestamp_ms;

            if let Some(measure_id) = event.measure_on {
                measures.push(MeasureAnchor {
                    measure_index: measures.len(),
                    timestamp_ms: event.timestamp_ms,
                    first_event: i,
                    element_id: measure_id,
                });
            }
            if measures.is_empty() {
                return Err(SyncError::MalformedTimemap(
                    "first sounding event does not open a measure".to_string(),
                ));
            }

            let mut sounding: Vec<ElementId> = events
                .last()
                .map(|prev| prev.elements_sounding_after.clone())
                .unwrap_or_default();
            sounding.retain(|id| !event.off.contains(id));
            for id in &event.on {
                if !sounding.contains(id) {
                    sounding.push(id.clone());
                }
            }

            events.push(SoundingEvent {
                timestamp_ms: event.timestamp_ms,
                elements_turning_on: event.on,
                elements_turning_off: event.off,
                measure_entry: measures.len() - 1,
                elements_sounding_after: sounding,
            });
        }

        Ok(Self { events, measures })
    }

    pub fn events(&self) -> &[SoundingEvent] {
        &self.events
    }

    pub fn measures(&self) -> &[MeasureAnchor] {
        &self.measures
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Location of the event that starts sounding `element_id`
    ///
    /// Used to turn a click on a note into a navigation request.
    pub fn locate(&self, element_id: &str) -> Option<PlaybackLocation> {
        let event = self
            .events
            .iter()
            .find(|e| e.elements_turning_on.iter().any(|id| id == element_id))?;
        let measure = &self.measures[event.measure_entry];
        Some(PlaybackLocation::discrete(
            measure.measure_index,
            measure.timestamp_ms,
            event.timestamp_ms - measure.timestamp_ms,
        ))
    }
}
