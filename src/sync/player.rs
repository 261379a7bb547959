//! Playback controller
//!
//! Owns one loaded score: converter output, aligned MIDI, the renderer and
//! the sequencer. The per-frame loop is cooperative. The host calls
//! [`Player::tick`] whenever the [`FrameScheduler`] fires, and the player
//! re-arms the scheduler only while it is playing, at most one frame at a time.

use std::collections::BTreeMap;

use serde::Serialize;

use super::resolver::{resolve_by_measure_and_position, resolve_by_timestamp};
use super::scheduler::{Debouncer, FrameOutcome, FrameScheduler};
use crate::converters::MidiConverter;
use crate::error::{Result, SyncError};
use crate::midi::{align_midi_duration, AlignedMidi};
use crate::models::{MeasureIndex, Millis, PlaybackLocation, Timemap};
use crate::options::PlayerOptions;
use crate::renderers::SheetRenderer;

/// Capability surface of an audio/MIDI sequencer
pub trait AudioSequencer {
    /// Replace the loaded sequence; the clock resets to zero
    fn load(&mut self, midi: &[u8]) -> Result<()>;

    fn current_time_ms(&self) -> Millis;

    fn set_current_time_ms(&mut self, time_ms: Millis);

    fn play(&mut self);

    fn pause(&mut self);

    fn set_playback_rate(&mut self, rate: f64);

    /// `None` loops forever
    fn set_loop_count(&mut self, count: Option<u32>);

    fn channel_count(&self) -> u8;

    fn mute_channel(&mut self, channel: u8, mute: bool);

    fn version(&self) -> String;
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

pub struct Player {
    options: PlayerOptions,
    converter: Box<dyn MidiConverter>,
    renderer: Box<dyn SheetRenderer>,
    sequencer: Box<dyn AudioSequencer>,
    scheduler: Box<dyn FrameScheduler>,
    timemap: Timemap,
    midi: AlignedMidi,
    state: PlayerState,
    frame_scheduled: bool,
    resize: Debouncer,
    destroyed: bool,
}

impl Player {
    /// Load `score` and get every collaborator ready to play
    ///
    /// Any failure aborts the whole load; no partially initialized player is
    /// ever returned.
    pub fn create(
        options: PlayerOptions,
        mut converter: Box<dyn MidiConverter>,
        mut renderer: Box<dyn SheetRenderer>,
        mut sequencer: Box<dyn AudioSequencer>,
        scheduler: Box<dyn FrameScheduler>,
        score: &str,
    ) -> Result<Self> {
        converter.initialize(score)?;
        renderer.initialize()?;

        let timemap = converter.timemap()?.clone();
        if timemap.is_empty() {
            return Err(SyncError::EmptyTimemap);
        }
        let midi = align_midi_duration(converter.midi()?, &timemap)?;
        sequencer.load(&midi.bytes)?;

        let resize = Debouncer::new(options.resize_debounce_ms);
        let mut player = Self {
            options,
            converter,
            renderer,
            sequencer,
            scheduler,
            timemap,
            midi,
            state: PlayerState::Stopped,
            frame_scheduled: false,
            resize,
            destroyed: false,
        };
        player.apply_mute();
        player.sequencer.set_playback_rate(player.options.velocity);
        player.sequencer.set_loop_count(player.options.repeat);
        player.renderer.move_to(&PlaybackLocation::discrete(0, 0.0, 0.0))?;

        log::info!(
            "player ready: {} measures, {:.0}ms",
            player.timemap.len(),
            player.midi.duration_ms
        );
        Ok(player)
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn timemap(&self) -> &Timemap {
        &self.timemap
    }

    /// Aligned MIDI as handed to the sequencer
    pub fn midi(&self) -> &[u8] {
        &self.midi.bytes
    }

    pub fn duration_ms(&self) -> Millis {
        self.midi.duration_ms
    }

    /// Audio clock, kept strictly inside the sequence
    pub fn position_ms(&self) -> Millis {
        self.sequencer
            .current_time_ms()
            .min(self.duration_ms() - 1.0)
            .max(0.0)
    }

    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn version(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "player".to_string(),
                format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            ),
            ("renderer".to_string(), self.renderer.version()),
            ("converter".to_string(), self.converter.version()),
            ("sequencer".to_string(), self.sequencer.version()),
        ])
    }

    pub fn play(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.sequencer.play();
        self.state = PlayerState::Playing;
        self.schedule_frame();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.sequencer.pause();
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
        Ok(())
    }

    /// Back to the first measure, without interpolation
    pub fn rewind(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.sequencer.pause();
        self.sequencer.set_current_time_ms(0.0);
        self.state = PlayerState::Stopped;
        let first = self.timemap.first();
        self.renderer
            .move_to(&PlaybackLocation::discrete(first.measure_index, first.timestamp_ms, 0.0))
    }

    /// One animation frame
    ///
    /// Never fails: a frame that cannot be rendered is logged and skipped, and
    /// the loop keeps going while playing.
    pub fn tick(&mut self, now_ms: Millis) -> FrameOutcome {
        self.frame_scheduled = false;
        if self.destroyed || self.state != PlayerState::Playing {
            return FrameOutcome::Halt;
        }

        if let Err(e) = self.synchronize() {
            log::warn!("skipped frame: {}", e);
        }
        if let Err(e) = self.poll_resize(now_ms) {
            log::warn!("resize failed: {}", e);
        }

        self.schedule_frame();
        FrameOutcome::Continue
    }

    /// Jump to `offset_ms` into measure `measure_index`
    ///
    /// Among repeated occurrences of the measure, the one nearest to the
    /// current playback position is chosen.
    pub fn move_to(&mut self, measure_index: MeasureIndex, measure_onset_ms: Millis, offset_ms: Millis) -> Result<()> {
        self.ensure_alive()?;
        let anchor = self.position_ms() - offset_ms;
        let entry = *resolve_by_measure_and_position(&self.timemap, measure_index, anchor)?;

        let target = entry.timestamp_ms + offset_ms - self.options.navigation_epsilon_ms;
        let seek = target.clamp(0.0, self.duration_ms());
        if seek != target {
            log::debug!("seek target {:.1}ms clamped to {:.1}ms", target, seek);
        }
        log::debug!(
            "move to measure {} (requested onset {:.0}ms) at {:.0}ms",
            entry.measure_index,
            measure_onset_ms,
            seek
        );

        self.sequencer.set_current_time_ms(seek);
        self.renderer
            .move_to(&PlaybackLocation::discrete(entry.measure_index, entry.timestamp_ms, offset_ms))
    }

    /// Navigate to the event that starts sounding `element_id`
    ///
    /// Returns `false` when the renderer does not know the element.
    pub fn on_element_event(&mut self, element_id: &str) -> Result<bool> {
        self.ensure_alive()?;
        let Some(location) = self.renderer.on_event(element_id) else {
            return Ok(false);
        };
        self.move_to(
            location.measure_index,
            location.measure_onset_ms,
            location.offset_within_measure_ms,
        )?;
        Ok(true)
    }

    /// Record a container resize; bursts are coalesced
    pub fn notify_resize(&mut self, now_ms: Millis) {
        if !self.destroyed {
            self.resize.trigger(now_ms);
        }
    }

    /// Re-layout if a resize burst has settled; returns whether it did
    pub fn poll_resize(&mut self, now_ms: Millis) -> Result<bool> {
        if self.destroyed || !self.resize.poll(now_ms) {
            return Ok(false);
        }
        self.renderer.on_resize()?;
        Ok(true)
    }

    pub fn set_mute(&mut self, mute: bool) {
        self.options.mute = mute;
        self.apply_mute();
    }

    pub fn set_repeat(&mut self, repeat: Option<u32>) {
        self.options.repeat = repeat;
        self.sequencer.set_loop_count(repeat);
    }

    pub fn set_velocity(&mut self, velocity: f64) {
        self.options.velocity = velocity;
        self.sequencer.set_playback_rate(velocity);
    }

    /// Stop audio, stop the loop and restore the score; safe to call twice
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.sequencer.pause();
        self.state = PlayerState::Stopped;
        self.destroyed = true;
        self.resize.cancel();
        self.renderer.destroy();
        log::info!("player destroyed");
    }

    fn synchronize(&mut self) -> Result<()> {
        let clock = self.sequencer.current_time_ms();
        let entry = resolve_by_timestamp(&self.timemap, clock)?;
        let location = PlaybackLocation::continuous(entry, clock);
        self.renderer.move_to(&location)
    }

    fn schedule_frame(&mut self) {
        if !self.frame_scheduled {
            self.frame_scheduled = true;
            self.scheduler.request_frame();
        }
    }

    fn apply_mute(&mut self) {
        for channel in 0..self.sequencer.channel_count() {
            self.sequencer.mute_channel(channel, self.options.mute);
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            return Err(SyncError::InvalidState("player has been destroyed".to_string()));
        }
        Ok(())
    }
}
