//! Converters module
//!
//! A converter turns a score into the two artefacts playback needs: a standard
//! MIDI file and a measure timemap. Repeats and jumps must already be unrolled
//! in the timemap so the visual score follows the audio.

pub mod musescore;
pub mod prebuilt;
pub mod verovio;

pub use musescore::{parse_mpos_timemap, MuseScoreConverter};
pub use prebuilt::{StaticConverter, TimemapSource};
pub use verovio::{parse_verovio, parse_verovio_timemap, VerovioEvent};

use crate::error::Result;
use crate::models::Timemap;

/// Capability surface of a MIDI converter backend
pub trait MidiConverter {
    /// Produce the MIDI file and timemap for `score`
    fn initialize(&mut self, score: &str) -> Result<()>;

    fn midi(&self) -> Result<&[u8]>;

    /// Non-empty, validated timemap; only available after `initialize`
    fn timemap(&self) -> Result<&Timemap>;

    fn version(&self) -> String;
}
