//! Position resolution: timestamp -> timemap entry, and measure -> timestamp
//!
//! `resolve_by_timestamp` runs once per animation frame for the whole duration
//! of playback, so it is a binary search and never a scan.

use crate::error::{Result, SyncError};
use crate::models::{MeasureIndex, Millis, Timemap, TimemapEntry};

/// Entry sounding at `timestamp_ms`
///
/// Exact onset hits return that entry. Otherwise the entry immediately
/// preceding `timestamp_ms` is returned, floored at the first entry.
pub fn resolve_by_timestamp(timemap: &Timemap, timestamp_ms: Millis) -> Result<&TimemapEntry> {
    let entries = timemap.entries();
    if entries.is_empty() {
        return Err(SyncError::EmptyTimemap);
    }
    let insertion = entries.partition_point(|e| e.timestamp_ms <= timestamp_ms);
    Ok(&entries[insertion.saturating_sub(1)])
}

/// Occurrence of `measure_index` closest to `approximate_timestamp_ms`
///
/// An unrolled score can play the same notated measure several times. The
/// occurrence nearest to the given time wins; on equal distance the later
/// occurrence wins. A measure index that never occurs resolves to the nearest
/// measure index that does, so requests past the end land on the last measure.
pub fn resolve_by_measure_and_position(
    timemap: &Timemap,
    measure_index: MeasureIndex,
    approximate_timestamp_ms: Millis,
) -> Result<&TimemapEntry> {
    let mut best: Option<(&TimemapEntry, usize, Millis)> = None;

    for entry in timemap.entries() {
        let measure_distance = entry.measure_index.abs_diff(measure_index);
        let time_distance = (entry.timestamp_ms - approximate_timestamp_ms).abs();
        let better = match best {
            None => true,
            Some((_, best_measure, best_time)) => {
                measure_distance < best_measure
                    || (measure_distance == best_measure && time_distance <= best_time)
            }
        };
        if better {
            best = Some((entry, measure_distance, time_distance));
        }
    }

    let (entry, measure_distance, _) = best.ok_or(SyncError::EmptyTimemap)?;
    if measure_distance != 0 {
        log::debug!(
            "measure {} not in timemap, clamped to measure {}",
            measure_index,
            entry.measure_index
        );
    }
    Ok(entry)
}
