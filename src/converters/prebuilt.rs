//! Converter over pre-rendered assets
//!
//! MIDI as obtained by `verovio --xml-id-checksum -t midi score.musicxml`,
//! plus either Verovio's timemap JSON or explicit timemap entries.

use super::verovio::{measure_timemap, parse_verovio_timemap};
use super::MidiConverter;
use crate::error::{Result, SyncError};
use crate::models::{Timemap, TimemapEntry};

/// Where a prebuilt converter takes its timemap from
#[derive(Clone, Debug, PartialEq)]
pub enum TimemapSource {
    /// Verovio timemap JSON
    Verovio(String),
    /// Entries already in measure/timestamp/duration form
    Entries(Vec<TimemapEntry>),
}

impl TimemapSource {
    fn build(&self) -> Result<Timemap> {
        match self {
            TimemapSource::Verovio(json) => measure_timemap(&parse_verovio_timemap(json)?),
            TimemapSource::Entries(entries) => Timemap::build(entries.clone()),
        }
    }
}

pub struct StaticConverter {
    midi: Vec<u8>,
    source: TimemapSource,
    timemap: Option<Timemap>,
}

impl StaticConverter {
    pub fn new(midi: Vec<u8>, source: TimemapSource) -> Self {
        Self {
            midi,
            source,
            timemap: None,
        }
    }

    pub fn from_verovio(midi: Vec<u8>, timemap_json: impl Into<String>) -> Self {
        Self::new(midi, TimemapSource::Verovio(timemap_json.into()))
    }
}

impl MidiConverter for StaticConverter {
    fn initialize(&mut self, _score: &str) -> Result<()> {
        if self.midi.is_empty() {
            return Err(SyncError::Converter("no MIDI data".to_string()));
        }
        let timemap = self.source.build()?;
        log::info!(
            "static converter: {} measures, {} MIDI bytes",
            timemap.len(),
            self.midi.len()
        );
        self.timemap = Some(timemap);
        Ok(())
    }

    fn midi(&self) -> Result<&[u8]> {
        Ok(&self.midi)
    }

    fn timemap(&self) -> Result<&Timemap> {
        self.timemap
            .as_ref()
            .ok_or_else(|| SyncError::Converter("converter is not initialized".to_string()))
    }

    fn version(&self) -> String {
        format!("{}/StaticConverter v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}
