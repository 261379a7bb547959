use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::{Result, SyncError};
use crate::models::Millis;
use crate::sync::AudioSequencer;

#[derive(Debug)]
struct SequencerState {
    midi: Vec<u8>,
    time_ms: Millis,
    playing: bool,
    playback_rate: f64,
    loop_count: Option<u32>,
    channels: u8,
    muted: BTreeSet<u8>,
}

/// Sequencer whose clock advances only through [`ManualSequencer::advance`]
#[derive(Clone, Debug)]
pub struct ManualSequencer {
    state: Rc<RefCell<SequencerState>>,
}

impl Default for ManualSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualSequencer {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SequencerState {
                midi: Vec::new(),
                time_ms: 0.0,
                playing: false,
                playback_rate: 1.0,
                loop_count: Some(1),
                channels: 16,
                muted: BTreeSet::new(),
            })),
        }
    }

    /// Move the clock forward by `wall_ms` scaled by the playback rate, if playing
    pub fn advance(&self, wall_ms: Millis) {
        let mut state = self.state.borrow_mut();
        if state.playing {
            state.time_ms += wall_ms * state.playback_rate;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    /// Bytes handed over by the last `load`
    pub fn loaded_midi(&self) -> Vec<u8> {
        self.state.borrow().midi.clone()
    }

    pub fn playback_rate(&self) -> f64 {
        self.state.borrow().playback_rate
    }

    pub fn loop_count(&self) -> Option<u32> {
        self.state.borrow().loop_count
    }

    pub fn muted_channels(&self) -> Vec<u8> {
        self.state.borrow().muted.iter().copied().collect()
    }
}

impl AudioSequencer for ManualSequencer {
    fn load(&mut self, midi: &[u8]) -> Result<()> {
        if midi.is_empty() {
            return Err(SyncError::Midi("empty MIDI buffer".to_string()));
        }
        let mut state = self.state.borrow_mut();
        state.midi = midi.to_vec();
        state.time_ms = 0.0;
        state.playing = false;
        Ok(())
    }

    fn current_time_ms(&self) -> Millis {
        self.state.borrow().time_ms
    }

    fn set_current_time_ms(&mut self, time_ms: Millis) {
        self.state.borrow_mut().time_ms = time_ms;
    }

    fn play(&mut self) {
        self.state.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.state.borrow_mut().playback_rate = rate;
    }

    fn set_loop_count(&mut self, count: Option<u32>) {
        self.state.borrow_mut().loop_count = count;
    }

    fn channel_count(&self) -> u8 {
        self.state.borrow().channels
    }

    fn mute_channel(&mut self, channel: u8, mute: bool) {
        let mut state = self.state.borrow_mut();
        if mute {
            state.muted.insert(channel);
        } else {
            state.muted.remove(&channel);
        }
    }

    fn version(&self) -> String {
        format!("{}/ManualSequencer v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}
