//! MuseScore score media
//!
//! `mscore score.musicxml --score-media` exports, among others, the MIDI file
//! and an `mpos` XML listing the onset of every measure in milliseconds:
//!
//! ```xml
//! <score>
//!   <events>
//!     <event elid="0" position="0"/>
//!     <event elid="1" position="2000"/>
//!   </events>
//! </score>
//! ```
//!
//! The last measure lasts until the score's reported total duration.

use roxmltree::Document as XmlDocument;

use super::MidiConverter;
use crate::error::{Result, SyncError};
use crate::models::{Millis, Timemap};

/// Parse measure positions into a timemap ending at `total_duration_ms`
pub fn parse_mpos_timemap(mpos_xml: &str, total_duration_ms: Millis) -> Result<Timemap> {
    let doc = XmlDocument::parse(mpos_xml)
        .map_err(|e| SyncError::Converter(format!("Invalid mpos XML: {}", e)))?;

    let mut onsets = Vec::new();
    for event in doc.descendants().filter(|n| {
        n.has_tag_name("event") && n.parent().is_some_and(|p| p.has_tag_name("events"))
    }) {
        let position = event
            .attribute("position")
            .ok_or_else(|| SyncError::Converter("mpos event without position".to_string()))?;
        let position: i64 = position
            .trim()
            .parse()
            .map_err(|_| SyncError::Converter(format!("Invalid mpos position '{}'", position)))?;
        onsets.push((onsets.len(), position as Millis));
    }

    Timemap::from_onsets(&onsets, total_duration_ms)
}

pub struct MuseScoreConverter {
    midi: Vec<u8>,
    mpos_xml: String,
    duration_ms: Millis,
    mscore_version: Option<String>,
    timemap: Option<Timemap>,
}

impl MuseScoreConverter {
    /// `duration_ms` is the score metadata's duration (seconds) times 1000
    pub fn new(midi: Vec<u8>, mpos_xml: impl Into<String>, duration_ms: Millis) -> Self {
        Self {
            midi,
            mpos_xml: mpos_xml.into(),
            duration_ms,
            mscore_version: None,
            timemap: None,
        }
    }

    pub fn with_mscore_version(mut self, version: impl Into<String>) -> Self {
        self.mscore_version = Some(version.into());
        self
    }
}

impl MidiConverter for MuseScoreConverter {
    fn initialize(&mut self, _score: &str) -> Result<()> {
        let timemap = parse_mpos_timemap(&self.mpos_xml, self.duration_ms)?;
        log::info!("MuseScore converter: {} measures", timemap.len());
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
        match &self.mscore_version {
            Some(version) => format!("MuseScore v{}", version),
            None => "MuseScore".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimemapEntry;

    const MPOS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<score>
  <elements>
    <element id="0" x="10" y="20" sx="100" sy="50" page="0"/>
  </elements>
  <events>
    <event elid="0" position="0"/>
    <event elid="1" position="2000"/>
    <event elid="2" position="4000"/>
  </events>
</score>"#;

    #[test]
    fn test_parse_mpos() {
        let timemap = parse_mpos_timemap(MPOS, 5500.0).expect("valid mpos");
        assert_eq!(
            timemap.entries(),
            [
                TimemapEntry::new(0, 0.0, 2000.0),
                TimemapEntry::new(1, 2000.0, 2000.0),
                TimemapEntry::new(2, 4000.0, 1500.0),
            ]
        );
    }

    #[test]
    fn test_bad_position() {
        let xml = r#"<score><events><event position="soon"/></events></score>"#;
        assert!(matches!(parse_mpos_timemap(xml, 100.0), Err(SyncError::Converter(_))));
    }

    #[test]
    fn test_no_events() {
        let xml = "<score><events/></score>";
        assert_eq!(parse_mpos_timemap(xml, 100.0), Err(SyncError::EmptyTimemap));
    }

    #[test]
    fn test_converter_version() {
        let mut converter = MuseScoreConverter::new(vec![0x4d], MPOS, 5500.0).with_mscore_version("4.2.1");
        converter.initialize("").unwrap();
        assert_eq!(converter.version(), "MuseScore v4.2.1");
        assert_eq!(converter.timemap().unwrap().total_duration_ms(), 5500.0);
    }
}
