//! Score Player WASM Module
//!
//! Plays a score: drives a MIDI sequencer and, in lockstep, moves a cursor and
//! highlights the sounding notes on the rendered score.
//!
//! The engine itself (`models`, `sync`, `midi`, `renderers`, `converters`) is
//! platform independent; `api` adapts it to the browser and `headless`
//! provides in-memory collaborators for native use and tests.

pub mod api;
pub mod converters;
pub mod error;
pub mod headless;
pub mod midi;
pub mod models;
pub mod options;
pub mod renderers;
pub mod sync;

// Re-export commonly used types
pub use error::{Result, SyncError};
pub use models::{EventStream, PlaybackLocation, Timemap, TimemapEntry};
pub use options::{PlayerOptions, RendererOptions};
pub use sync::{FrameOutcome, Player, PlayerState};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "console_log")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        wasm_warn!("logger already initialized");
    }

    log::info!("Score player WASM module initialized");
}
