//! # Event Stream Types
//!
//! This module defines the event stream the converter consumes.
//!
//! ## Type Hierarchy
//! ```text
//! Song
//!   ├── ticks_per_beat: u32 (file-wide resolution)
//!   └── Vec<Vec<TimedEvent>> (one ascending list per track)
//!
//! TimedEvent
//!   ├── tick: Tick (absolute)
//!   └── kind: EventKind
//!         ├── TimeSignature { numerator, denominator }
//!         ├── Tempo { usec_per_beat }
//!         ├── NoteOn { channel, pitch, velocity }
//!         └── NoteOff { channel, pitch }
//! ```
//!
//! ## Key Concepts
//!
//! ### Ticks
//! Every event carries an absolute tick at `ticks_per_beat` pulses per quarter
//! note. Events of one track must be non-decreasing in tick; tracks are merged
//! with a stable sort so events sharing a tick keep their track order.
//!
//! ### Timing vs. note events
//! Time-signature and tempo changes are global: they apply to every lane of the
//! chart. Note events are split into lanes by the lane assignor.
//!
//! ## Related Modules
//! - `midi` - Decodes Standard MIDI Files into a `Song`
//! - `validate` - Rejects unsortable or out-of-range event streams
//! - `chart` - Converts a `Song` into TJA text

/// Absolute time position in file ticks.
pub type Tick = u64;

/// Payload of a timed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TimeSignature { numerator: u32, denominator: u32 },
    Tempo { usec_per_beat: u32 },
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
}

impl EventKind {
    /// Time-signature and tempo changes.
    pub fn is_timing(&self) -> bool {
        matches!(self, EventKind::TimeSignature { .. } | EventKind::Tempo { .. })
    }

    pub fn is_note(&self) -> bool {
        !self.is_timing()
    }
}

/// An event stamped with its absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub tick: Tick,
    pub kind: EventKind,
}

impl TimedEvent {
    pub fn new(tick: Tick, kind: EventKind) -> Self {
        Self { tick, kind }
    }

    pub fn time_signature(tick: Tick, numerator: u32, denominator: u32) -> Self {
        Self::new(tick, EventKind::TimeSignature { numerator, denominator })
    }

    pub fn tempo(tick: Tick, usec_per_beat: u32) -> Self {
        Self::new(tick, EventKind::Tempo { usec_per_beat })
    }

    pub fn note_on(tick: Tick, channel: u8, pitch: u8, velocity: u8) -> Self {
        Self::new(tick, EventKind::NoteOn { channel, pitch, velocity })
    }

    pub fn note_off(tick: Tick, channel: u8, pitch: u8) -> Self {
        Self::new(tick, EventKind::NoteOff { channel, pitch })
    }
}

/// A complete source file: resolution plus per-track event lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Song {
    pub ticks_per_beat: u32,
    pub tracks: Vec<Vec<TimedEvent>>,
}

impl Song {
    pub fn new(ticks_per_beat: u32) -> Self {
        Self {
            ticks_per_beat,
            tracks: Vec::new(),
        }
    }

    /// Append a track; returns `self` so songs can be built inline.
    pub fn with_track(mut self, events: Vec<TimedEvent>) -> Self {
        self.tracks.push(events);
        self
    }

    /// All time-signature and tempo changes across tracks, ordered by tick.
    pub fn timing_events(&self) -> Vec<TimedEvent> {
        self.collect_sorted(|e| e.kind.is_timing())
    }

    /// All note-on/note-off events across tracks, ordered by tick.
    pub fn note_events(&self) -> Vec<TimedEvent> {
        self.collect_sorted(|e| e.kind.is_note())
    }

    fn collect_sorted(&self, keep: impl Fn(&TimedEvent) -> bool) -> Vec<TimedEvent> {
        let mut events: Vec<TimedEvent> = self
            .tracks
            .iter()
            .flatten()
            .filter(|e| keep(e))
            .copied()
            .collect();
        // stable: equal ticks keep track order
        events.sort_by_key(|e| e.tick);
        events
    }
}
