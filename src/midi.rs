//! # MIDI Module
//!
//! Standard MIDI File decoding into a [`Song`], and the reclock utility that
//! rescales a file's resolution and tempo.
//!
//! ## Decoding
//! Only metrical (ticks per quarter note) files are supported. Delta times are
//! accumulated into absolute ticks per track. Tempo, time signature, note-on
//! and note-off events are kept; everything else is dropped.
//!
//! A note-on with velocity 0 is kept as a note-on; the lane assignor treats
//! it as a note-off.
//!
//! ## Reclock
//! ```text
//! delta' = round(rate * delta * target / original)
//! tempo' = round(tempo / rate)
//! ```

use crate::error::ChartError;
use crate::events::{Song, Tick, TimedEvent};
use midly::num::{u15, u24, u28};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::path::{Path, PathBuf};

/// Decode a Standard MIDI File.
pub fn parse_midi(bytes: &[u8]) -> Result<Song, ChartError> {
    let smf = Smf::parse(bytes).map_err(|e| ChartError::MidiError(e.to_string()))?;
    let ticks_per_beat = metrical_resolution(&smf)?;

    let mut song = Song::new(u32::from(ticks_per_beat));
    for (index, track) in smf.tracks.iter().enumerate() {
        let mut tick: Tick = 0;
        let mut events = Vec::new();

        for event in track {
            tick += u64::from(event.delta.as_int());
            if let Some(timed) = decode_event(tick, &event.kind)? {
                events.push(timed);
            }
        }

        log::debug!("track {}: {} event(s) kept", index, events.len());
        song.tracks.push(events);
    }

    Ok(song)
}

/// Read and decode a Standard MIDI File.
pub fn load_midi(path: &Path) -> Result<Song, ChartError> {
    let bytes = fs::read(path)
        .map_err(|e| ChartError::IoError(format!("cannot read '{}': {}", path.display(), e)))?;
    parse_midi(&bytes)
}

fn metrical_resolution(smf: &Smf) -> Result<u16, ChartError> {
    match smf.header.timing {
        Timing::Metrical(ticks_per_beat) => Ok(ticks_per_beat.as_int()),
        Timing::Timecode(fps, subframes) => Err(ChartError::MidiError(format!(
            "SMPTE timing ({} fps, {} subframes) is not supported",
            fps.as_int(),
            subframes
        ))),
    }
}

fn decode_event(tick: Tick, kind: &TrackEventKind) -> Result<Option<TimedEvent>, ChartError> {
    let event = match *kind {
        TrackEventKind::Meta(MetaMessage::Tempo(usec_per_beat)) => {
            Some(TimedEvent::tempo(tick, usec_per_beat.as_int()))
        }
        TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, power, _, _)) => {
            // denominator is stored as a power of two
            let denominator = 1u32.checked_shl(u32::from(power)).ok_or_else(|| {
                ChartError::MidiError(format!(
                    "time signature denominator 2^{} at tick {} is out of range",
                    power, tick
                ))
            })?;
            Some(TimedEvent::time_signature(
                tick,
                u32::from(numerator),
                denominator,
            ))
        }
        TrackEventKind::Midi { channel, message } => match message {
            MidiMessage::NoteOn { key, vel } => Some(TimedEvent::note_on(
                tick,
                channel.as_int(),
                key.as_int(),
                vel.as_int(),
            )),
            MidiMessage::NoteOff { key, .. } => {
                Some(TimedEvent::note_off(tick, channel.as_int(), key.as_int()))
            }
            _ => None,
        },
        _ => None,
    };
    Ok(event)
}

/// Rescale a MIDI file to `target` ticks per beat and `rate` times the tempo.
///
/// Returns the re-encoded file. Playback time is unchanged: every position
/// moves `rate` times further in beats while the tempo rises by `rate`.
pub fn reclock(bytes: &[u8], target: u16, rate: f64) -> Result<Vec<u8>, ChartError> {
    if !(rate.is_finite() && rate > 0.0) {
        return Err(ChartError::InvalidOption(format!(
            "tempo rate must be a positive number, got {}",
            rate
        )));
    }
    let resolution = u15::try_from(target)
        .filter(|t| t.as_int() > 0)
        .ok_or_else(|| {
            ChartError::InvalidOption(format!(
                "ticks per beat must be between 1 and 32767, got {}",
                target
            ))
        })?;

    let mut smf = Smf::parse(bytes).map_err(|e| ChartError::MidiError(e.to_string()))?;
    let original = metrical_resolution(&smf)?;
    if original == 0 {
        return Err(ChartError::MidiError("ticks per beat is zero".to_string()));
    }
    let scale = rate * f64::from(target) / f64::from(original);
    log::info!(
        "reclocking {} -> {} ticks per beat at {}x tempo",
        original,
        target,
        rate
    );

    smf.header.timing = Timing::Metrical(resolution);
    for track in smf.tracks.iter_mut() {
        for event in track.iter_mut() {
            let delta = (scale * f64::from(event.delta.as_int())).round();
            event.delta = u28::try_from(float_to_u32(delta)?).ok_or_else(|| {
                ChartError::InvalidOption(format!("rescaled delta {} exceeds 28 bits", delta))
            })?;

            if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = &mut event.kind {
                let rescaled = (f64::from(tempo.as_int()) / rate).round();
                *tempo = u24::try_from(float_to_u32(rescaled)?)
                    .filter(|t| t.as_int() > 0)
                    .ok_or_else(|| {
                        ChartError::InvalidOption(format!(
                            "rescaled tempo {} is outside 1..=16777215",
                            rescaled
                        ))
                    })?;
            }
        }
    }

    let mut out = Vec::new();
    smf.write_std(&mut out)
        .map_err(|e| ChartError::MidiError(e.to_string()))?;
    Ok(out)
}

fn float_to_u32(value: f64) -> Result<u32, ChartError> {
    if value < 0.0 || value > f64::from(u32::MAX) {
        return Err(ChartError::InvalidOption(format!(
            "rescaled value {} is out of range",
            value
        )));
    }
    Ok(value as u32)
}

/// `<input>.<target>tpb-<rate>xbpm.mid`
pub fn reclocked_path(input: &Path, target: u16, rate: f64) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(format!(".{}tpb-{:?}xbpm.mid", target, rate));
    PathBuf::from(name)
}
