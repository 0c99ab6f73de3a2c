//! Integration tests for the chart converter
//!
//! Tests the full pipeline from a Standard MIDI File to TJA text.

use mid2tja::{
    convert, convert_midi, reclock, ChartError, ChartOptions, NoteSymbol, Song, TimedEvent,
};
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

fn options(note: char) -> ChartOptions {
    ChartOptions {
        note: NoteSymbol::new(note).unwrap(),
        ..ChartOptions::default()
    }
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

fn midi(delta: u32, channel: u8, message: MidiMessage) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Midi {
            channel: u4::new(channel),
            message,
        },
    }
}

fn note_on(delta: u32, channel: u8, key: u8, vel: u8) -> TrackEvent<'static> {
    midi(
        delta,
        channel,
        MidiMessage::NoteOn {
            key: u7::new(key),
            vel: u7::new(vel),
        },
    )
}

fn note_off(delta: u32, channel: u8, key: u8) -> TrackEvent<'static> {
    midi(
        delta,
        channel,
        MidiMessage::NoteOff {
            key: u7::new(key),
            vel: u7::new(64),
        },
    )
}

/// A two-track file: tempo map plus the given note track.
fn midi_file(ticks_per_beat: u16, notes: Vec<TrackEvent<'static>>) -> Vec<u8> {
    let mut note_track = notes;
    note_track.push(meta(0, MetaMessage::EndOfTrack));

    let smf = Smf {
        header: Header::new(Format::Parallel, Timing::Metrical(u15::new(ticks_per_beat))),
        tracks: vec![
            vec![
                meta(0, MetaMessage::Tempo(u24::new(500_000))),
                meta(0, MetaMessage::EndOfTrack),
            ],
            note_track,
        ],
    };
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}

#[test]
fn test_convert_balloon_file() {
    let bytes = midi_file(480, vec![note_on(0, 0, 69, 100), note_off(240, 0, 69)]);

    let tja = convert_midi(&bytes, &options('7')).unwrap();
    let expected = "// mid2tja\nTITLE:\nBPM:120.0\nOFFSET:0\n\
\n\n// Channel 0, polyphonic position 0\nBALLOON:110\n\n\
#START\n#BPMCHANGE 120.0\n78000000,\n#END\n";
    assert_eq!(tja, expected);
}

#[test]
fn test_zero_velocity_note_on_ends_note() {
    let bytes = midi_file(480, vec![note_on(0, 0, 60, 100), note_on(240, 0, 60, 0)]);

    let tja = convert_midi(&bytes, &options('5')).unwrap();
    assert!(tja.contains("#START\n#BPMCHANGE 120.0\n58000000,\n#END\n"));
    assert!(!tja.contains("BALLOON:"));
}

#[test]
fn test_channels_get_their_own_lanes() {
    let bytes = midi_file(
        480,
        vec![
            note_on(0, 9, 36, 100),
            note_on(0, 1, 60, 100),
            note_on(960, 9, 38, 100),
        ],
    );

    let tja = convert_midi(&bytes, &options('1')).unwrap();
    let first = tja.find("// Channel 9, polyphonic position 0").unwrap();
    let second = tja.find("// Channel 1, polyphonic position 0").unwrap();
    assert!(first < second);
    assert_eq!(tja.matches("#START").count(), 2);
    assert!(tja.contains("#START\n#BPMCHANGE 120.0\n11,\n#END\n"));
    assert!(tja.contains("#START\n#BPMCHANGE 120.0\n1,\n#END\n"));
}

#[test]
fn test_timing_only_chart() {
    let song = Song::new(480).with_track(vec![
        TimedEvent::time_signature(0, 3, 4),
        TimedEvent::tempo(0, 400_000),
        TimedEvent::note_on(0, 0, 60, 100),
        TimedEvent::tempo(1440, 500_000),
    ]);

    let tja = convert(&song, &options('0')).unwrap();
    assert!(tja.contains("BPM:150.0\n"));
    assert!(tja.contains(
        "#START\n#MEASURE 3/4\n#BPMCHANGE 150.0\n0,\n#BPMCHANGE 120.0\n0,\n#END\n"
    ));
}

#[test]
fn test_title_from_options_file() {
    let mut options = ChartOptions::from_yaml("title: Test Song\nnote: 1\n").unwrap();
    options.title = options.title.map(|t| t.to_uppercase());
    let song = Song::new(96).with_track(vec![TimedEvent::note_on(0, 0, 60, 100)]);

    let tja = convert(&song, &options).unwrap();
    assert!(tja.contains("TITLE:TEST SONG\n"));
    assert!(tja.contains("#START\n1,\n#END\n"));
}

#[test]
fn test_reclock_keeps_chart() {
    let bytes = midi_file(
        480,
        vec![
            note_on(0, 0, 69, 100),
            note_off(240, 0, 69),
            note_on(480, 0, 72, 100),
            note_off(720, 0, 72),
        ],
    );
    let reclocked = reclock(&bytes, 960, 1.0).unwrap();

    let original = convert_midi(&bytes, &options('7')).unwrap();
    assert_eq!(convert_midi(&reclocked, &options('7')).unwrap(), original);
}

#[test]
fn test_reclock_rate_raises_tempo() {
    let bytes = midi_file(480, vec![note_on(0, 0, 69, 100), note_off(240, 0, 69)]);
    let faster = reclock(&bytes, 480, 2.0).unwrap();

    let tja = convert_midi(&faster, &options('7')).unwrap();
    assert!(tja.contains("BPM:240.0\n"));
    // twice the beats at twice the tempo: same hold time
    assert!(tja.contains("BALLOON:110\n"));
    assert!(tja.contains("#BPMCHANGE 240.0\n7800,\n"));
}

#[test]
fn test_malformed_stream_is_rejected() {
    let song = Song::new(480).with_track(vec![
        TimedEvent::tempo(960, 500_000),
        TimedEvent::tempo(480, 500_000),
    ]);

    let result = convert(&song, &ChartOptions::default());
    assert!(matches!(
        result,
        Err(ChartError::MalformedInput {
            track: 0,
            index: 1,
            ..
        })
    ));
}

#[test]
fn test_unknown_note_symbol_is_rejected() {
    assert!(matches!(
        "E".parse::<NoteSymbol>(),
        Err(ChartError::UnknownNoteSymbol(_))
    ));
    assert!(ChartOptions::from_yaml("note: 8\n").is_err());
}

#[test]
fn test_oversized_long_gap_is_rejected() {
    let song = Song::new(480).with_track(vec![TimedEvent::note_on(0, 0, 60, 100)]);
    let options = ChartOptions {
        long_gap: "9223372036854775807/1".parse().unwrap(),
        ..options('7')
    };

    assert!(matches!(
        convert(&song, &options),
        Err(ChartError::InvalidOption(_))
    ));
}

#[test]
fn test_decimal_long_gap() {
    let options = ChartOptions::from_yaml("note: 5\nlong-gap: 0.25\n").unwrap();
    let song = Song::new(4).with_track(vec![TimedEvent::note_on(0, 0, 60, 100)]);

    // a quarter of a whole note: the unterminated roll lasts 4 ticks
    let tja = convert(&song, &options).unwrap();
    assert!(tja.contains("#START\n5800,\n#END\n"));
}

#[test]
fn test_invalid_midi_is_rejected() {
    assert!(matches!(
        convert_midi(b"MThd", &ChartOptions::default()),
        Err(ChartError::MidiError(_))
    ));
}
