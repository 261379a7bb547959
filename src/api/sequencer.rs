//! JavaScript MIDI player adapter
//!
//! The host passes any object shaped like this (a `MIDI.js`-style player):
//!
//! ```text
//! currentTime: number            // seconds, read/write
//! playbackRate: number           // write
//! loopCount: number              // write, Infinity loops forever
//! channelsAmount: number         // read
//! play(), pause()
//! muteChannel(channel, mute)
//! loadMidi(bytes: Uint8Array)    // may throw
//! version?: string
//! ```

use wasm_bindgen::prelude::*;

use crate::error::{Result, SyncError};
use crate::models::Millis;
use crate::sync::AudioSequencer;

use super::helpers::describe_js;

#[wasm_bindgen]
extern "C" {
    pub type JsSequencer;

    #[wasm_bindgen(method, getter = currentTime)]
    fn current_time(this: &JsSequencer) -> f64;

    #[wasm_bindgen(method, setter = currentTime)]
    fn set_current_time(this: &JsSequencer, seconds: f64);

    #[wasm_bindgen(method)]
    fn play(this: &JsSequencer);

    #[wasm_bindgen(method)]
    fn pause(this: &JsSequencer);

    #[wasm_bindgen(method, setter = playbackRate)]
    fn set_playback_rate(this: &JsSequencer, rate: f64);

    #[wasm_bindgen(method, setter = loopCount)]
    fn set_loop_count(this: &JsSequencer, count: f64);

    #[wasm_bindgen(method, getter = channelsAmount)]
    fn channels_amount(this: &JsSequencer) -> u8;

    #[wasm_bindgen(method, js_name = muteChannel)]
    fn mute_channel(this: &JsSequencer, channel: u8, mute: bool);

    #[wasm_bindgen(method, catch, js_name = loadMidi)]
    fn load_midi(this: &JsSequencer, midi: &[u8]) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, getter)]
    fn version(this: &JsSequencer) -> Option<String>;
}

pub struct JsAudioSequencer {
    inner: JsSequencer,
}

impl JsAudioSequencer {
    pub fn new(inner: JsSequencer) -> Self {
        Self { inner }
    }
}

impl AudioSequencer for JsAudioSequencer {
    fn load(&mut self, midi: &[u8]) -> Result<()> {
        self.inner
            .load_midi(midi)
            .map_err(|e| SyncError::Midi(format!("sequencer rejected MIDI: {}", describe_js(&e))))
    }

    fn current_time_ms(&self) -> Millis {
        self.inner.current_time() * 1000.0
    }

    fn set_current_time_ms(&mut self, time_ms: Millis) {
        self.inner.set_current_time(time_ms / 1000.0);
    }

    fn play(&mut self) {
        self.inner.play();
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.inner.set_playback_rate(rate);
    }

    fn set_loop_count(&mut self, count: Option<u32>) {
        self.inner
            .set_loop_count(count.map_or(f64::INFINITY, f64::from));
    }

    fn channel_count(&self) -> u8 {
        self.inner.channels_amount()
    }

    fn mute_channel(&mut self, channel: u8, mute: bool) {
        self.inner.mute_channel(channel, mute);
    }

    fn version(&self) -> String {
        self.inner
            .version()
            .unwrap_or_else(|| "JavaScript sequencer".to_string())
    }
}
