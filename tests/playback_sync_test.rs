// Playback synchronization tests
//
// Drives a full player (static converter over a Verovio timemap, notation
// renderer over the in-memory surface, manual sequencer and frames) and checks
// what the score shows as the audio clock moves.

use std::collections::BTreeMap;

use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use score_player_wasm::converters::{parse_verovio, StaticConverter};
use score_player_wasm::headless::{HeadlessSurface, ManualFrames, ManualSequencer};
use score_player_wasm::renderers::{NotationRenderer, Rect, ScoreSurface};
use score_player_wasm::sync::{resolve_by_timestamp, AudioSequencer};
use score_player_wasm::{FrameOutcome, Player, PlayerOptions, PlayerState, SyncError};

const COLOR: &str = "rgb(234, 107, 36)";

/// Three measures of 1000ms; the last one is a whole rest
const TIMEMAP: &str = r#"[
    { "tstamp": 0, "qstamp": 0, "on": ["n1"], "measureOn": "m1", "tempo": 120 },
    { "tstamp": 500, "qstamp": 1, "on": ["n2"], "off": ["n1"] },
    { "tstamp": 1000, "qstamp": 2, "on": ["n3"], "off": ["n2"], "measureOn": "m2" },
    { "tstamp": 2000, "qstamp": 4, "restsOn": ["r1"], "off": ["n3"], "measureOn": "m3" },
    { "tstamp": 3000, "qstamp": 6, "restsOff": ["r1"] }
]"#;

/// One note lasting three beats at 120 BPM, ending well before the last measure
fn midi() -> Vec<u8> {
    let track = vec![
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(500_000.into())),
        },
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn { key: 60.into(), vel: 80.into() },
            },
        },
        TrackEvent {
            delta: 1440.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOff { key: 60.into(), vel: 0.into() },
            },
        },
        TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ];
    let smf = Smf {
        header: Header {
            format: Format::SingleTrack,
            timing: Timing::Metrical(480.into()),
        },
        tracks: vec![track],
    };
    let mut out = Vec::new();
    smf.write(&mut out).expect("Failed to write SMF");
    out
}

/// Two systems: m1 and m2 on the first, m3 on the second
fn surface() -> HeadlessSurface {
    let surface = HeadlessSurface::new();
    surface.add_element("sys1", Rect::new(0.0, 0.0, 1000.0, 120.0), None);
    surface.add_element("sys2", Rect::new(0.0, 200.0, 1000.0, 120.0), None);
    surface.add_element("m1", Rect::new(0.0, 20.0, 500.0, 80.0), Some("sys1"));
    surface.add_element("m2", Rect::new(500.0, 20.0, 500.0, 80.0), Some("sys1"));
    surface.add_element("m3", Rect::new(0.0, 220.0, 800.0, 80.0), Some("sys2"));
    surface.add_element("n1", Rect::new(80.0, 40.0, 10.0, 10.0), Some("sys1"));
    surface.add_element("n2", Rect::new(300.0, 40.0, 10.0, 10.0), Some("sys1"));
    surface.add_element("n3", Rect::new(550.0, 40.0, 10.0, 10.0), Some("sys1"));
    surface.add_element("r1", Rect::new(400.0, 240.0, 10.0, 10.0), Some("sys2"));
    surface.set_initial_attribute("n1", "fill", "black");
    surface.set_initial_attribute("r1", "stroke", "#333");
    surface
}

struct Session {
    player: Player,
    surface: HeadlessSurface,
    sequencer: ManualSequencer,
    frames: ManualFrames,
}

fn load(timemap_json: &str, surface: HeadlessSurface) -> Result<Session, SyncError> {
    let (_, stream) = parse_verovio(timemap_json)?;
    let renderer = NotationRenderer::new(surface.clone(), stream, Default::default());
    let converter = StaticConverter::from_verovio(midi(), timemap_json);
    let sequencer = ManualSequencer::new();
    let frames = ManualFrames::new();

    let player = Player::create(
        PlayerOptions::default(),
        Box::new(converter),
        Box::new(renderer),
        Box::new(sequencer.clone()),
        Box::new(frames.clone()),
        "score.musicxml",
    )?;
    Ok(Session {
        player,
        surface,
        sequencer,
        frames,
    })
}

impl Session {
    /// Let `ms` of audio play, then run the pending frame
    fn run(&mut self, ms: f64) -> FrameOutcome {
        self.sequencer.advance(ms);
        assert!(self.frames.take(), "a frame should be pending");
        let now = self.sequencer.current_time_ms();
        self.player.tick(now)
    }

    /// Ids currently carrying the highlight colour
    fn highlighted(&self) -> Vec<String> {
        self.surface
            .attributes()
            .into_iter()
            .filter(|(_, attributes)| attributes.get("fill").map(String::as_str) == Some(COLOR))
            .map(|(id, _)| id)
            .collect()
    }
}

#[test]
fn test_highlight_follows_playback() {
    let mut session = load(TIMEMAP, surface()).expect("score loads");
    assert_eq!(session.highlighted(), vec!["n1"]);

    session.player.play().unwrap();
    session.run(100.0);
    assert_eq!(session.highlighted(), vec!["n1"]);

    session.run(500.0);
    assert_eq!(session.highlighted(), vec!["n2"]);
    assert_eq!(session.surface.attribute("n1", "fill").unwrap().as_deref(), Some("black"));

    session.run(600.0);
    assert_eq!(session.highlighted(), vec!["n3"]);

    session.run(1300.0);
    assert_eq!(session.highlighted(), vec!["r1"]);
    assert_eq!(session.surface.scrolled_into_view().last().map(String::as_str), Some("sys2"));
}

#[test]
fn test_cursor_interpolates_across_measure() {
    let mut session = load(TIMEMAP, surface()).expect("score loads");
    session.player.play().unwrap();
    session.run(1250.0);

    // m2 spans 500..1000, a quarter of the way in
    let cursor = session.surface.cursor().expect("cursor placed");
    assert_eq!(cursor.x, 625.0);
    assert_eq!(cursor.y, 0.0);
    assert_eq!(cursor.height, 120.0);
}

#[test]
fn test_repeated_frames_do_not_touch_styles() {
    let mut session = load(TIMEMAP, surface()).expect("score loads");
    session.player.play().unwrap();
    session.run(700.0);

    let writes = session.surface.mutation_count();
    session.run(0.0);
    session.run(0.0);
    assert_eq!(session.surface.mutation_count(), writes);
}

#[test]
fn test_pause_and_resume() {
    let mut session = load(TIMEMAP, surface()).expect("score loads");
    session.player.play().unwrap();
    session.run(200.0);

    session.player.pause().unwrap();
    assert_eq!(session.player.state(), PlayerState::Paused);
    assert_eq!(session.run(0.0), FrameOutcome::Halt);
    assert_eq!(session.frames.pending(), 0);

    session.player.play().unwrap();
    assert_eq!(session.frames.pending(), 1);
    assert_eq!(session.run(900.0), FrameOutcome::Continue);
    assert_eq!(session.highlighted(), vec!["n3"]);
}

#[test]
fn test_click_navigates_and_snaps() {
    let mut session = load(TIMEMAP, surface()).expect("score loads");
    session.player.play().unwrap();
    session.run(2500.0);

    assert!(session.player.on_element_event("n2").unwrap());
    assert_eq!(session.sequencer.current_time_ms(), 499.0);
    assert_eq!(session.highlighted(), vec!["n2"]);
    assert_eq!(session.surface.cursor().unwrap().x, 300.0);
}

#[test]
fn test_rewind_returns_to_first_note() {
    let mut session = load(TIMEMAP, surface()).expect("score loads");
    session.player.play().unwrap();
    session.run(2200.0);

    session.player.rewind().unwrap();
    assert_eq!(session.player.state(), PlayerState::Stopped);
    assert_eq!(session.player.position_ms(), 0.0);
    assert_eq!(session.highlighted(), vec!["n1"]);
    // first measure starts at the first note
    assert_eq!(session.surface.cursor().unwrap().x, 80.0);
}

#[test]
fn test_destroy_restores_score() {
    let surface = surface();
    let before: BTreeMap<_, _> = surface.attributes();

    let mut session = load(TIMEMAP, surface).expect("score loads");
    session.player.play().unwrap();
    session.run(600.0);
    session.run(1800.0);

    session.player.destroy();
    assert_eq!(session.surface.attributes(), before);
    assert!(session.surface.cursor().is_none());
    assert!(!session.sequencer.is_playing());

    assert_eq!(session.run(100.0), FrameOutcome::Halt);
    assert_eq!(session.frames.pending(), 0);
    assert_eq!(session.sequencer.current_time_ms(), 2400.0);
}

#[test]
fn test_resolution_is_monotonic_over_playback() {
    let session = load(TIMEMAP, surface()).expect("score loads");
    let timemap = session.player.timemap();

    let mut previous = 0;
    for step in 0..=320 {
        let t = f64::from(step) * 10.0;
        let entry = resolve_by_timestamp(timemap, t).unwrap();
        assert!(entry.measure_index >= previous, "measure went backwards at {}ms", t);
        previous = entry.measure_index;
    }
    assert_eq!(previous, 2);
}

#[test]
fn test_malformed_timemap_aborts_load() {
    let timemap = r#"[
        { "tstamp": 100, "on": ["n1"], "measureOn": "m1" },
        { "tstamp": 900, "off": ["n1"] }
    ]"#;
    let result = load(timemap, surface());
    assert!(matches!(result, Err(SyncError::MalformedTimemap(_))));
}

#[test]
fn test_stale_elements_do_not_stop_playback() {
    let mut session = load(TIMEMAP, surface()).expect("score loads");
    session.player.play().unwrap();
    session.run(100.0);

    session.surface.remove_element("n2");
    assert_eq!(session.run(500.0), FrameOutcome::Continue);
    assert!(session.highlighted().is_empty());

    assert_eq!(session.run(500.0), FrameOutcome::Continue);
    assert_eq!(session.highlighted(), vec!["n3"]);
}
