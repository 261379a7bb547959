use midly::{MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use crate::error::{Result, SyncError};
use crate::models::{Millis, Timemap};
use crate::options::{ALIGNMENT_CONTROLLER, DEFAULT_TEMPO_BPM};

/// MIDI bytes patched to end on the last measure boundary
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedMidi {
    pub bytes: Vec<u8>,
    /// Absolute tick of the appended no-op controller event
    pub alignment_tick: u32,
    /// Playing time of the patched file
    pub duration_ms: Millis,
}

/// Append a no-op controller event at the end of the last measure
///
/// Sequencers stop at the last meaningful event, which can be well before the
/// notated end of the score (short note followed by rests). The timemap's total
/// duration is converted to ticks following the file's resolution and tempo
/// map, and a CC event is placed there on the first track.
pub fn align_midi_duration(midi: &[u8], timemap: &Timemap) -> Result<AlignedMidi> {
    let mut smf = Smf::parse(midi).map_err(|e| SyncError::Midi(format!("Failed to parse MIDI: {}", e)))?;

    let tpq = match smf.header.timing {
        Timing::Metrical(tpq) => tpq.as_int(),
        Timing::Timecode(..) => {
            return Err(SyncError::Midi("SMPTE timing is not supported for alignment".to_string()))
        }
    };
    let bpm = first_tempo_bpm(&smf);
    let alignment_tick = tick_at_ms(&tempo_changes(&smf), tpq, timemap.summed_duration_ms());

    let track = smf
        .tracks
        .first_mut()
        .ok_or_else(|| SyncError::Midi("MIDI file has no tracks".to_string()))?;
    insert_alignment_event(track, alignment_tick);

    let duration_ms = midi_duration_ms(&smf);
    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| SyncError::Midi(format!("Failed to write MIDI: {}", e)))?;

    log::info!(
        "aligned MIDI end: tick {} (starting at {} BPM, {} tpq, {:.0}ms)",
        alignment_tick,
        bpm,
        tpq,
        duration_ms
    );
    Ok(AlignedMidi {
        bytes,
        alignment_tick,
        duration_ms,
    })
}

/// Tick position of `duration_ms` at a constant tempo
pub fn alignment_tick(duration_ms: Millis, bpm: f64, tpq: u16) -> u32 {
    let ms_per_tick = 60_000.0 / bpm / f64::from(tpq);
    (duration_ms / ms_per_tick).round() as u32
}

/// Tick reached after `target_ms` of playback, following the tempo map
///
/// `changes` are (absolute tick, microseconds per beat) sorted by tick. With a
/// single tempo this is [`alignment_tick`].
fn tick_at_ms(changes: &[(u64, u32)], tpq: u16, target_ms: Millis) -> u32 {
    let tpq = f64::from(tpq);
    let mut elapsed = 0.0;
    let mut last_tick = 0u64;
    let mut micros_per_beat = 60_000_000.0 / DEFAULT_TEMPO_BPM;
    for &(tick, micros) in changes {
        let segment_ms = (tick - last_tick) as f64 * micros_per_beat / tpq / 1000.0;
        if elapsed + segment_ms >= target_ms {
            break;
        }
        elapsed += segment_ms;
        last_tick = tick;
        micros_per_beat = f64::from(micros);
    }
    let ms_per_tick = micros_per_beat / tpq / 1000.0;
    (last_tick as f64 + (target_ms - elapsed) / ms_per_tick).round() as u32
}

/// Tempo of the earliest tempo event in any track
pub fn first_tempo_bpm(smf: &Smf) -> f64 {
    tempo_changes(smf)
        .first()
        .map(|&(_, micros)| 60_000_000.0 / f64::from(micros))
        .unwrap_or(DEFAULT_TEMPO_BPM)
}

/// Playing time of a whole file, following its tempo map
pub fn midi_duration_ms(smf: &Smf) -> Millis {
    let end_tick = smf
        .tracks
        .iter()
        .map(|track| track.iter().map(|e| u64::from(e.delta.as_int())).sum::<u64>())
        .max()
        .unwrap_or(0);

    match smf.header.timing {
        Timing::Metrical(tpq) => {
            let tpq = f64::from(tpq.as_int());
            let mut elapsed = 0.0;
            let mut last_tick = 0u64;
            let mut micros_per_beat = 60_000_000.0 / DEFAULT_TEMPO_BPM;
            for (tick, micros) in tempo_changes(smf) {
                if tick >= end_tick {
                    break;
                }
                elapsed += (tick - last_tick) as f64 * micros_per_beat / tpq / 1000.0;
                last_tick = tick;
                micros_per_beat = f64::from(micros);
            }
            elapsed + (end_tick - last_tick) as f64 * micros_per_beat / tpq / 1000.0
        }
        Timing::Timecode(fps, subframes) => {
            let ticks_per_second = f64::from(fps.as_f32()) * f64::from(subframes);
            end_tick as f64 * 1000.0 / ticks_per_second
        }
    }
}

/// (absolute tick, microseconds per beat) sorted by tick
fn tempo_changes(smf: &Smf) -> Vec<(u64, u32)> {
    let mut changes = Vec::new();
    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += u64::from(event.delta.as_int());
            if let TrackEventKind::Meta(MetaMessage::Tempo(micros)) = event.kind {
                changes.push((tick, micros.as_int()));
            }
        }
    }
    changes.sort_by_key(|&(tick, _)| tick);
    changes
}

/// Insert the controller event at `tick`, keeping End of Track last
fn insert_alignment_event(track: &mut Track, tick: u32) {
    let mut absolute: Vec<(u32, TrackEventKind)> = Vec::with_capacity(track.len() + 2);
    let mut current = 0u32;
    for event in track.iter() {
        current += event.delta.as_int();
        if !matches!(event.kind, TrackEventKind::Meta(MetaMessage::EndOfTrack)) {
            absolute.push((current, event.kind));
        }
    }

    let position = absolute.partition_point(|&(t, _)| t <= tick);
    absolute.insert(
        position,
        (
            tick,
            TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::Controller {
                    controller: ALIGNMENT_CONTROLLER.into(),
                    value: 0.into(),
                },
            },
        ),
    );
    absolute.push((current.max(tick), TrackEventKind::Meta(MetaMessage::EndOfTrack)));

    track.clear();
    let mut prev_tick = 0u32;
    for (t, kind) in absolute {
        track.push(TrackEvent {
            delta: t.saturating_sub(prev_tick).into(),
            kind,
        });
        prev_tick = t;
    }
}
