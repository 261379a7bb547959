//! Measure timemap: where each measure begins and ends on the millisecond timeline
//!
//! A timemap is produced once per loaded score by a converter and is read-only
//! afterwards. Construction validates the structural invariants so that every
//! consumer (resolver, highlighter, aligner) can rely on them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Index of a measure in the rendered score (0-based)
pub type MeasureIndex = usize;

/// Milliseconds on the playback timeline
pub type Millis = f64;

/// Tolerance used when checking that consecutive durations tile the timeline
const DURATION_TOLERANCE_MS: Millis = 1e-6;

/// One measure occurrence on the playback timeline
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimemapEntry {
    #[serde(alias = "measure")]
    pub measure_index: MeasureIndex,
    #[serde(alias = "timestamp")]
    pub timestamp_ms: Millis,
    #[serde(alias = "duration")]
    pub duration_ms: Millis,
}

impl TimemapEntry {
    pub fn new(measure_index: MeasureIndex, timestamp_ms: Millis, duration_ms: Millis) -> Self {
        Self {
            measure_index,
            timestamp_ms,
            duration_ms,
        }
    }

    /// End of this measure occurrence (exclusive)
    pub fn end_ms(&self) -> Millis {
        self.timestamp_ms + self.duration_ms
    }
}

/// Validated, immutable sequence of measure entries
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Timemap {
    entries: Vec<TimemapEntry>,
}

impl Timemap {
    /// Validate raw entries and wrap them.
    ///
    /// Fails with `MalformedTimemap` if:
    /// - the first entry is not measure 0 at 0 ms
    /// - measure indices decrease
    /// - a timestamp or duration is negative or not finite
    /// - timestamps decrease
    /// - a non-final duration does not reach the next onset
    ///
    /// Fails with `EmptyTimemap` when `raw` is empty.
    pub fn build(raw: Vec<TimemapEntry>) -> Result<Self> {
        let first = raw.first().ok_or(SyncError::EmptyTimemap)?;
        if first.measure_index != 0 || first.timestamp_ms != 0.0 {
            return Err(SyncError::MalformedTimemap(format!(
                "first entry must be measure 0 at 0ms, got measure {} at {}ms",
                first.measure_index, first.timestamp_ms
            )));
        }

        for (i, entry) in raw.iter().enumerate() {
            if !entry.timestamp_ms.is_finite() || entry.timestamp_ms < 0.0 {
                return Err(SyncError::MalformedTimemap(format!(
                    "entry {} has invalid timestamp {}",
                    i, entry.timestamp_ms
                )));
            }
            if !entry.duration_ms.is_finite() || entry.duration_ms < 0.0 {
                return Err(SyncError::MalformedTimemap(format!(
                    "entry {} has invalid duration {}",
                    i, entry.duration_ms
                )));
            }
        }

        for (i, pair) in raw.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            if next.measure_index < current.measure_index {
                return Err(SyncError::MalformedTimemap(format!(
                    "measure index goes backwards at entry {}: {} -> {}",
                    i + 1,
                    current.measure_index,
                    next.measure_index
                )));
            }
            if next.timestamp_ms < current.timestamp_ms {
                return Err(SyncError::MalformedTimemap(format!(
                    "timestamp goes backwards at entry {}: {} -> {}",
                    i + 1,
                    current.timestamp_ms,
                    next.timestamp_ms
                )));
            }
            let expected = next.timestamp_ms - current.timestamp_ms;
            if (current.duration_ms - expected).abs() > DURATION_TOLERANCE_MS {
                return Err(SyncError::MalformedTimemap(format!(
                    "entry {} lasts {}ms but the next measure starts {}ms later",
                    i, current.duration_ms, expected
                )));
            }
        }

        Ok(Self { entries: raw })
    }

    /// Build from measure onsets, deriving every duration.
    ///
    /// Non-final durations are the gaps between onsets; the final one runs
    /// until `total_duration_ms`.
    pub fn from_onsets(onsets: &[(MeasureIndex, Millis)], total_duration_ms: Millis) -> Result<Self> {
        let mut raw: Vec<TimemapEntry> = onsets
            .iter()
            .map(|&(measure_index, timestamp_ms)| TimemapEntry::new(measure_index, timestamp_ms, 0.0))
            .collect();

        for i in 1..raw.len() {
            raw[i - 1].duration_ms = raw[i].timestamp_ms - raw[i - 1].timestamp_ms;
        }
        if let Some(last) = raw.last_mut() {
            last.duration_ms = total_duration_ms - last.timestamp_ms;
        }

        Self::build(raw)
    }

    pub fn entries(&self) -> &[TimemapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a built timemap; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> &TimemapEntry {
        &self.entries[0]
    }

    pub fn last(&self) -> &TimemapEntry {
        &self.entries[self.entries.len() - 1]
    }

    /// End of the last measure
    pub fn total_duration_ms(&self) -> Millis {
        self.last().end_ms()
    }

    /// Sum of every entry's duration
    pub fn summed_duration_ms(&self) -> Millis {
        self.entries.iter().map(|e| e.duration_ms).sum()
    }
}

/// Free-function form of [`Timemap::build`]
pub fn build_timemap(raw: Vec<TimemapEntry>) -> Result<Timemap> {
    Timemap::build(raw)
}

/// Free-function form of [`Timemap::total_duration_ms`]
pub fn total_duration_ms(timemap: &Timemap) -> Millis {
    timemap.total_duration_ms()
}
