//! MIDI post-processing
//!
//! The converter's MIDI output is patched once at load time so that playback
//! lasts exactly as long as the notated score.

mod align;

pub use align::{align_midi_duration, alignment_tick, first_tempo_bpm, midi_duration_ms, AlignedMidi};
