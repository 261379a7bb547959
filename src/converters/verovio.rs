//! Verovio timemap parsing
//!
//! Verovio's `timemap` output is a JSON array of events. Each event lists the
//! notes and rests starting (`on`, `restsOn`) and ending (`off`, `restsOff`) at
//! `tstamp` milliseconds, and `measureOn` when a measure begins. One file feeds
//! both the measure timemap and the sounding-event stream.
//!
//! Produce it with:
//! `verovio --xml-id-checksum -t timemap --timemap-options '{ "includeMeasures": true, "includeRests": true }' score.musicxml`

use serde::Deserialize;

use crate::error::{Result, SyncError};
use crate::models::{ElementId, EventStream, RawSoundingEvent, Timemap};

#[derive(Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerovioEvent {
    pub tstamp: f64,
    #[serde(default)]
    pub qstamp: Option<f64>,
    #[serde(default)]
    pub on: Vec<ElementId>,
    #[serde(default)]
    pub off: Vec<ElementId>,
    #[serde(default)]
    pub rests_on: Vec<ElementId>,
    #[serde(default)]
    pub rests_off: Vec<ElementId>,
    #[serde(default)]
    pub measure_on: Option<ElementId>,
    #[serde(default)]
    pub tempo: Option<f64>,
}

pub fn parse_verovio_timemap(json: &str) -> Result<Vec<VerovioEvent>> {
    serde_json::from_str(json)
        .map_err(|e| SyncError::Converter(format!("Invalid Verovio timemap: {}", e)))
}

/// One timemap entry per `measureOn` event
///
/// The last measure ends at the latest event timestamp in the file.
pub fn measure_timemap(events: &[VerovioEvent]) -> Result<Timemap> {
    let onsets: Vec<(usize, f64)> = events
        .iter()
        .filter(|e| e.measure_on.is_some())
        .enumerate()
        .map(|(measure, e)| (measure, e.tstamp))
        .collect();
    let end = events.iter().map(|e| e.tstamp).fold(0.0, f64::max);
    Timemap::from_onsets(&onsets, end)
}

/// Event stream with notes and rests merged
pub fn sounding_events(events: &[VerovioEvent]) -> Result<EventStream> {
    let raw = events
        .iter()
        .map(|e| RawSoundingEvent {
            timestamp_ms: e.tstamp,
            on: e.on.iter().chain(&e.rests_on).cloned().collect(),
            off: e.off.iter().chain(&e.rests_off).cloned().collect(),
            measure_on: e.measure_on.clone(),
        })
        .collect();
    EventStream::build(raw)
}

/// Build both the timemap and the event stream from a Verovio timemap file
pub fn parse_verovio(json: &str) -> Result<(Timemap, EventStream)> {
    let events = parse_verovio_timemap(json)?;
    Ok((measure_timemap(&events)?, sounding_events(&events)?))
}
