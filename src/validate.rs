//! # Input Validation Module
//!
//! This module checks that a decoded `Song` can be converted at all.
//!
//! ## Purpose
//! The chart engine assumes a complete, tick-ordered event list. A stream that
//! breaks that assumption cannot be quantized meaningfully, so it is rejected
//! before any lane is scanned and no partial chart is produced.
//!
//! ## Validation Rules
//!
//! ### Resolution
//! - `ticks_per_beat` must be non-zero
//!
//! ### Ordering
//! - Within each track, ticks must be non-decreasing
//!
//! ### Values
//! - Time signatures need a non-zero numerator and denominator
//! - Tempo changes need a non-zero microseconds-per-beat
//! - Pitch and velocity must fit the 7-bit MIDI range
//!
//! ## Entry Point
//! `validate(song: &Song) -> Result<(), ChartError>`

use crate::error::ChartError;
use crate::events::{EventKind, Song, TimedEvent};

/// Validate a song for conversion.
pub fn validate(song: &Song) -> Result<(), ChartError> {
    if song.ticks_per_beat == 0 {
        return Err(ChartError::MalformedInput {
            track: 0,
            index: 0,
            message: "ticks per beat must be positive".to_string(),
        });
    }

    for (track, events) in song.tracks.iter().enumerate() {
        validate_track(events, track)?;
    }

    Ok(())
}

fn validate_track(events: &[TimedEvent], track: usize) -> Result<(), ChartError> {
    let mut last_tick = 0;

    for (index, event) in events.iter().enumerate() {
        if event.tick < last_tick {
            return Err(ChartError::MalformedInput {
                track,
                index,
                message: format!("tick {} precedes previous tick {}", event.tick, last_tick),
            });
        }
        last_tick = event.tick;

        validate_event(event).map_err(|message| ChartError::MalformedInput {
            track,
            index,
            message,
        })?;
    }

    Ok(())
}

fn validate_event(event: &TimedEvent) -> Result<(), String> {
    match event.kind {
        EventKind::TimeSignature {
            numerator,
            denominator,
        } => {
            if numerator == 0 || denominator == 0 {
                return Err(format!(
                    "invalid time signature {}/{}",
                    numerator, denominator
                ));
            }
        }
        EventKind::Tempo { usec_per_beat } => {
            if usec_per_beat == 0 {
                return Err("tempo must be positive".to_string());
            }
        }
        EventKind::NoteOn {
            pitch, velocity, ..
        } => {
            check_7bit("pitch", pitch)?;
            check_7bit("velocity", velocity)?;
        }
        EventKind::NoteOff { pitch, .. } => check_7bit("pitch", pitch)?,
    }
    Ok(())
}

fn check_7bit(what: &str, value: u8) -> Result<(), String> {
    if value > 127 {
        Err(format!("{} {} is out of range 0..=127", what, value))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TimedEvent;

    #[test]
    fn test_valid_song() {
        let song = Song::new(480).with_track(vec![
            TimedEvent::tempo(0, 500_000),
            TimedEvent::note_on(0, 0, 60, 100),
            TimedEvent::note_off(480, 0, 60),
        ]);
        assert!(validate(&song).is_ok());
    }

    #[test]
    fn test_zero_resolution() {
        let result = validate(&Song::new(0));
        assert!(matches!(result, Err(ChartError::MalformedInput { .. })));
    }

    #[test]
    fn test_unsorted_track() {
        let song = Song::new(480)
            .with_track(vec![TimedEvent::tempo(0, 500_000)])
            .with_track(vec![
                TimedEvent::note_on(120, 0, 60, 100),
                TimedEvent::note_off(90, 0, 60),
            ]);
        let result = validate(&song);
        if let Err(ChartError::MalformedInput {
            track,
            index,
            message,
        }) = result
        {
            assert_eq!(track, 1);
            assert_eq!(index, 1);
            assert!(message.contains("precedes"));
        } else {
            panic!("Expected MalformedInput but got: {:?}", result);
        }
    }

    #[test]
    fn test_zero_denominator() {
        let song = Song::new(480).with_track(vec![TimedEvent::time_signature(0, 4, 0)]);
        assert!(validate(&song).is_err());
    }

    #[test]
    fn test_zero_tempo() {
        let song = Song::new(480).with_track(vec![TimedEvent::tempo(0, 0)]);
        assert!(validate(&song).is_err());
    }

    #[test]
    fn test_pitch_out_of_range() {
        let song = Song::new(480).with_track(vec![TimedEvent::note_on(0, 0, 200, 100)]);
        let result = validate(&song);
        if let Err(ChartError::MalformedInput { message, .. }) = result {
            assert!(message.contains("pitch 200"));
        } else {
            panic!("Expected MalformedInput but got: {:?}", result);
        }
    }
}
