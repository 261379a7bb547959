//! Player and renderer options
//!
//! Options arrive from JavaScript as plain objects (camelCase keys); every
//! field is optional and falls back to the defaults below.

use serde::{Deserialize, Serialize};

/// Tempo assumed when a MIDI file carries no tempo event
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Default ticks per quarter note (MIDI resolution)
pub const DEFAULT_TPQ: u16 = 480;

/// Controller number of the no-op event appended by the duration aligner
/// (CC 50 is undefined in General MIDI)
pub const ALIGNMENT_CONTROLLER: u8 = 50;

/// Seek lands this far before the resolved boundary so it resolves inside the
/// target measure rather than the next one
pub const DEFAULT_NAVIGATION_EPSILON_MS: f64 = 1.0;

/// Resize notifications closer together than this are coalesced
pub const DEFAULT_RESIZE_DEBOUNCE_MS: f64 = 100.0;

pub const DEFAULT_HIGHLIGHT_COLOR: &str = "rgb(234, 107, 36)";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RendererOptions {
    pub highlight_color: String,
    /// Scroll the score so the cursor stays visible
    pub follow_cursor: bool,
    /// Score laid out as a single horizontal line
    pub horizontal: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
            follow_cursor: true,
            horizontal: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerOptions {
    pub mute: bool,
    /// Number of times to play; `None` loops forever
    pub repeat: Option<u32>,
    /// Playback speed, 1.0 is normal
    pub velocity: f64,
    pub navigation_epsilon_ms: f64,
    pub resize_debounce_ms: f64,
    pub renderer: RendererOptions,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            mute: false,
            repeat: Some(1),
            velocity: 1.0,
            navigation_epsilon_ms: DEFAULT_NAVIGATION_EPSILON_MS,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            renderer: RendererOptions::default(),
        }
    }
}
