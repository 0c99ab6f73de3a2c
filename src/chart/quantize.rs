//! Measure quantizer: walks one lane's merged timeline measure by measure and
//! lays every measure out on the coarsest grid that places all of its events
//! exactly.
//!
//! The same scan drives both the silent balloon pass and the emission pass;
//! only the [`ChartSink`] differs.

use super::balloon::{BalloonTracker, HeldNote};
use super::timing::TimingState;
use crate::config::{NoteSymbol, LONG_END_SYMBOL, SILENCE_SYMBOL};
use crate::events::{EventKind, Tick, TimedEvent};
use std::ops::Range;

/// Receives the output of a scan.
pub trait ChartSink {
    /// A run of grid cells belonging to the current measure.
    fn cells(&mut self, cells: &str);
    /// A directive line such as `#BPMCHANGE 150.0`.
    fn directive(&mut self, line: &str);
    fn end_measure(&mut self);
}

/// Sink for the silent pass.
#[derive(Debug, Default)]
pub struct NullSink;

impl ChartSink for NullSink {
    fn cells(&mut self, _cells: &str) {}
    fn directive(&mut self, _line: &str) {}
    fn end_measure(&mut self) {}
}

/// Result of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub measures: usize,
    pub held_notes: Vec<HeldNote>,
}

/// Merge the global timing events with one lane's notes.
///
/// Ordered by tick; on equal ticks timing changes come before notes, so a
/// tempo or signature change is in effect for a note sharing its cell.
pub fn merge_timeline(timing: &[TimedEvent], notes: &[TimedEvent]) -> Vec<TimedEvent> {
    fn order(event: &TimedEvent) -> (Tick, u8) {
        (event.tick, if event.kind.is_timing() { 0 } else { 1 })
    }

    let mut merged = Vec::with_capacity(timing.len() + notes.len());
    let (mut t, mut n) = (0, 0);
    while t < timing.len() && n < notes.len() {
        if order(&notes[n]) < order(&timing[t]) {
            merged.push(notes[n]);
            n += 1;
        } else {
            merged.push(timing[t]);
            t += 1;
        }
    }
    merged.extend_from_slice(&timing[t..]);
    merged.extend_from_slice(&notes[n..]);
    merged
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Scan a merged, tick-ordered timeline into measures.
pub fn scan_chart<S: ChartSink>(
    events: &[TimedEvent],
    state: TimingState,
    note: NoteSymbol,
    sink: &mut S,
) -> ScanSummary {
    let mut scanner = Scanner {
        events,
        state,
        note,
        sink,
        held: BalloonTracker::default(),
        measures: 0,
    };
    scanner.run();
    ScanSummary {
        measures: scanner.measures,
        held_notes: scanner.held.into_records(),
    }
}

struct Scanner<'a, S: ChartSink> {
    events: &'a [TimedEvent],
    state: TimingState,
    note: NoteSymbol,
    sink: &'a mut S,
    held: BalloonTracker,
    measures: usize,
}

impl<S: ChartSink> Scanner<'_, S> {
    fn run(&mut self) {
        let events = self.events;
        let mut first = 0;

        for (i, event) in events.iter().enumerate() {
            while self.state.tick_measure_end() <= event.tick {
                let end = self.state.tick_measure_end();
                self.flush(first..i, end);
                first = i;
                self.state.advance_measure();
            }

            if let EventKind::TimeSignature {
                numerator,
                denominator,
            } = event.kind
            {
                if event.tick > self.state.tick_measure_begin() {
                    // signature changes only take effect on a measure start
                    log::debug!(
                        "time signature {}/{} at tick {} cuts measure starting at tick {}",
                        numerator,
                        denominator,
                        event.tick,
                        self.state.tick_measure_begin()
                    );
                    // changes sharing the tick open the next measure too
                    let split = first
                        + events[first..i].partition_point(|e| e.tick < event.tick);
                    self.flush(first..split, event.tick);
                    first = split;
                    self.state.cut_measure(event.tick);
                }
                self.state.set_time_signature(numerator, denominator);
            }
        }

        let end = self.state.tick_measure_end();
        self.flush(first..events.len(), end);
    }

    /// Emit the events in `range` as one measure ending at `tick_end`.
    fn flush(&mut self, range: Range<usize>, tick_end: Tick) {
        let tick_begin = self.state.tick_measure_begin();
        let length = tick_end - tick_begin;
        let unit = self.quantization_unit(range.clone(), tick_begin, length);

        // a measure cut short by a signature change states its own length
        let mut short_measure = (length < self.state.ticks_per_measure()).then(|| {
            let whole = 4 * self.state.ticks_per_beat();
            let divisor = gcd(length, whole);
            format!("#MEASURE {}/{}", length / divisor, whole / divisor)
        });

        let events = self.events;
        let mut idiv_last = 0;
        let mut symbol = SILENCE_SYMBOL;
        for event in &events[range] {
            let idiv = (event.tick - tick_begin) / unit;
            if idiv > idiv_last {
                if let Some(line) = short_measure.take() {
                    self.sink.directive(&line);
                }
                self.sink.cells(&cell_run(symbol, idiv - idiv_last));
                symbol = SILENCE_SYMBOL;
                idiv_last = idiv;
            }

            match event.kind {
                EventKind::TimeSignature {
                    numerator,
                    denominator,
                } => {
                    self.state.set_time_signature(numerator, denominator);
                    self.sink
                        .directive(&format!("#MEASURE {}/{}", numerator, denominator));
                }
                EventKind::Tempo { usec_per_beat } => {
                    self.state.set_tempo(event.tick, usec_per_beat);
                    self.sink
                        .directive(&format!("#BPMCHANGE {:?}", self.state.bpm()));
                }
                EventKind::NoteOn { pitch, .. } => {
                    let usec = self.state.usec_at(event.tick);
                    if !self.note.is_long() || self.held.open(pitch, usec) {
                        symbol = self.note.as_char();
                    }
                }
                EventKind::NoteOff { .. } => {
                    let usec = self.state.usec_at(event.tick);
                    if self.note.is_long() && self.held.close(usec) {
                        symbol = LONG_END_SYMBOL;
                    }
                }
            }
        }

        if let Some(line) = short_measure.take() {
            self.sink.directive(&line);
        }
        let cells = length / unit;
        self.sink.cells(&cell_run(symbol, cells - idiv_last));
        self.sink.end_measure();
        self.measures += 1;
    }

    /// GCD of all event offsets after the measure start and the measure length.
    fn quantization_unit(&self, range: Range<usize>, tick_begin: Tick, length: Tick) -> Tick {
        let mut offsets: Vec<Tick> = self.events[range]
            .iter()
            .filter(|e| e.tick > tick_begin)
            .map(|e| e.tick - tick_begin)
            .collect();
        offsets.push(length);
        offsets.dedup();

        offsets.into_iter().fold(0, gcd)
    }
}

/// `symbol` followed by silence, `count` cells in total.
fn cell_run(symbol: char, count: u64) -> String {
    let mut run = String::with_capacity(count as usize);
    if count > 0 {
        run.push(symbol);
    }
    for _ in 1..count {
        run.push(SILENCE_SYMBOL);
    }
    run
}
