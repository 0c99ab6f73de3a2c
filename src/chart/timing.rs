//! Timing model: current signature and tempo, measure cursor, and the
//! tick-to-microsecond anchor.

use crate::events::{EventKind, Tick, TimedEvent};

/// 120 BPM.
pub const DEFAULT_USEC_PER_BEAT: u64 = 500_000;

/// Mutable timing state of one scan.
///
/// A baseline is built once per song and cloned for every scan; clones never
/// share state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingState {
    ticks_per_beat: u64,
    tsign_upper: u32,
    tsign_lower: u32,
    usec_per_beat: u64,
    tick_measure_begin: Tick,
    tick_checkpoint: Tick,
    usec_checkpoint: u64,
}

impl TimingState {
    pub fn new(ticks_per_beat: u32) -> Self {
        Self {
            ticks_per_beat: u64::from(ticks_per_beat),
            tsign_upper: 4,
            tsign_lower: 4,
            usec_per_beat: DEFAULT_USEC_PER_BEAT,
            tick_measure_begin: 0,
            tick_checkpoint: 0,
            usec_checkpoint: 0,
        }
    }

    /// Initial state of a song: default 4/4, tempo taken from the tick-0 tempo
    /// events (the last one wins).
    pub fn baseline(ticks_per_beat: u32, timing_events: &[TimedEvent]) -> Self {
        let mut state = Self::new(ticks_per_beat);
        for event in timing_events.iter().take_while(|e| e.tick == 0) {
            if let EventKind::Tempo { usec_per_beat } = event.kind {
                state.usec_per_beat = u64::from(usec_per_beat);
            }
        }
        state
    }

    pub fn ticks_per_beat(&self) -> u64 {
        self.ticks_per_beat
    }

    pub fn time_signature(&self) -> (u32, u32) {
        (self.tsign_upper, self.tsign_lower)
    }

    pub fn usec_per_beat(&self) -> u64 {
        self.usec_per_beat
    }

    pub fn tick_measure_begin(&self) -> Tick {
        self.tick_measure_begin
    }

    /// Quarter notes per minute.
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.usec_per_beat as f64
    }

    /// Length of a measure under the current signature, never less than one tick.
    pub fn ticks_per_measure(&self) -> Tick {
        let ticks =
            self.ticks_per_beat * 4 * u64::from(self.tsign_upper) / u64::from(self.tsign_lower);
        if ticks == 0 {
            log::debug!(
                "measure {}/{} at {} ticks per beat rounds to zero ticks; using 1",
                self.tsign_upper,
                self.tsign_lower,
                self.ticks_per_beat
            );
        }
        ticks.max(1)
    }

    pub fn tick_measure_end(&self) -> Tick {
        self.tick_measure_begin + self.ticks_per_measure()
    }

    /// Real time of `tick`, measured from the last tempo anchor.
    ///
    /// `tick` must not precede the last anchor.
    pub fn usec_at(&self, tick: Tick) -> u64 {
        let elapsed = tick.saturating_sub(self.tick_checkpoint);
        self.usec_checkpoint + elapsed * self.usec_per_beat / self.ticks_per_beat
    }

    /// Re-anchor the tick/usec conversion at `tick`.
    pub fn advance_usec(&mut self, tick: Tick) {
        self.usec_checkpoint = self.usec_at(tick);
        self.tick_checkpoint = tick;
    }

    pub fn advance_measure(&mut self) {
        self.tick_measure_begin = self.tick_measure_end();
    }

    /// Close the current measure early; the next one starts at `tick`.
    pub fn cut_measure(&mut self, tick: Tick) {
        self.tick_measure_begin = tick;
    }

    pub fn set_time_signature(&mut self, numerator: u32, denominator: u32) {
        self.tsign_upper = numerator;
        self.tsign_lower = denominator;
    }

    /// Apply a tempo change at `tick`. The anchor moves first so earlier ticks
    /// keep the old tempo.
    pub fn set_tempo(&mut self, tick: Tick, usec_per_beat: u32) {
        self.advance_usec(tick);
        self.usec_per_beat = u64::from(usec_per_beat);
    }
}
