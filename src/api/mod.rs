//! Score Player WASM API
//!
//! JavaScript-facing bindings. Everything here adapts browser objects to the
//! engine's collaborator traits; no playback logic lives in this module.
//!
//! # Module Structure
//!
//! - `helpers`: console logging macros, (de)serialization, error conversion
//! - `surface`: `ScoreSurface` over the DOM (Verovio SVG inside a container)
//! - `sequencer`: `AudioSequencer` over a JavaScript MIDI player object
//! - `player`: the exported `WasmPlayer` class and its frame loop

pub mod helpers;
pub mod player;
pub mod sequencer;
pub mod surface;

pub use player::WasmPlayer;
pub use sequencer::{JsAudioSequencer, JsSequencer};
pub use surface::DomSurface;
