//! Playback location shared by the sequencer-facing and notation-facing sides

use serde::{Deserialize, Serialize};

use super::timemap::{MeasureIndex, Millis, TimemapEntry};

/// A point in the score expressed as measure + offset
///
/// `measure_duration_ms` is present during continuous playback, which asks the
/// renderer to interpolate the cursor across the measure. It is absent after a
/// discrete jump (click), which asks the renderer to snap to the exact note.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackLocation {
    pub measure_index: MeasureIndex,
    pub measure_onset_ms: Millis,
    pub offset_within_measure_ms: Millis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_duration_ms: Option<Millis>,
}

impl PlaybackLocation {
    /// Location reached by continuous playback at `clock_ms` inside `entry`
    pub fn continuous(entry: &TimemapEntry, clock_ms: Millis) -> Self {
        Self {
            measure_index: entry.measure_index,
            measure_onset_ms: entry.timestamp_ms,
            offset_within_measure_ms: (clock_ms - entry.timestamp_ms).max(0.0),
            measure_duration_ms: Some(entry.duration_ms),
        }
    }

    /// Location reached by explicit navigation
    pub fn discrete(measure_index: MeasureIndex, measure_onset_ms: Millis, offset_ms: Millis) -> Self {
        Self {
            measure_index,
            measure_onset_ms,
            offset_within_measure_ms: offset_ms,
            measure_duration_ms: None,
        }
    }

    /// Absolute timestamp this location points at
    pub fn timestamp_ms(&self) -> Millis {
        self.measure_onset_ms + self.offset_within_measure_ms
    }

    pub fn is_interpolated(&self) -> bool {
        self.measure_duration_ms.is_some()
    }
}
