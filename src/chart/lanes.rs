//! Lane assignment: splits the note events of each channel into monophonic
//! timelines ("lanes") and applies the long-note length and gap policy.
//!
//! ## Modes
//! - **Hit**: every note-on is a momentary note on lane 0 of its channel. A
//!   second note-on at the same tick on the same channel is dropped.
//! - **Sustain**: a note-on opens a span closed by the matching note-off.
//!   Each channel owns a growable list of slots; a slot's index is the lane's
//!   polyphonic position.
//!
//! ## Sustain rules
//! - A slot is reused when its occupant is closed and ended at least
//!   `min_gap` ticks (and at least one tick) before the new note starts; the
//!   lowest such slot wins, otherwise a new slot is appended.
//! - A same-pitch occupant is cut at `max(start + gap, min(end, new_start - gap))`
//!   when its slot is taken over by the new note.
//! - Note-off closes the most recently opened open note of that pitch, at
//!   `max(start + gap, tick)`.
//! - A note that never receives its note-off keeps the minimum length.

use crate::events::{EventKind, Tick, TimedEvent};
use std::collections::HashMap;

/// Identifies one output timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneId {
    pub channel: u8,
    pub position: usize,
}

/// A resolved note. Hit notes have `tick_end == tick_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub channel: u8,
    pub pitch: u8,
    pub tick_start: Tick,
    pub tick_end: Tick,
}

/// One monophonic timeline of non-overlapping notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lane {
    pub id: LaneId,
    pub notes: Vec<Note>,
}

impl Lane {
    pub fn empty(id: LaneId) -> Self {
        Self { id, notes: Vec::new() }
    }

    /// Note-on for every note, plus a note-off at the end of every sustained
    /// note. The result is ordered by tick.
    pub fn events(&self) -> Vec<TimedEvent> {
        let mut events = Vec::with_capacity(self.notes.len() * 2);
        for note in &self.notes {
            events.push(TimedEvent::note_on(note.tick_start, note.channel, note.pitch, 127));
            if note.tick_end > note.tick_start {
                events.push(TimedEvent::note_off(note.tick_end, note.channel, note.pitch));
            }
        }
        events
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignMode {
    Hit,
    Sustain { min_gap: Tick },
}

/// A note under construction.
#[derive(Debug, Clone)]
struct Pending {
    note: Note,
    lane: usize,
    open: bool,
    opened_seq: u64,
}

/// Builds lanes from a tick-ordered stream of note events.
pub struct LaneAssignor {
    mode: AssignMode,
    pending: Vec<Pending>,
    lanes: Vec<LaneId>,
    lane_index: HashMap<LaneId, usize>,
    // channel -> slot occupants (indices into `pending`)
    slots: HashMap<u8, Vec<usize>>,
    next_seq: u64,
}

impl LaneAssignor {
    pub fn new(mode: AssignMode) -> Self {
        Self {
            mode,
            pending: Vec::new(),
            lanes: Vec::new(),
            lane_index: HashMap::new(),
            slots: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn feed(&mut self, event: &TimedEvent) {
        match (event.kind, self.mode) {
            (EventKind::NoteOn { channel, pitch, velocity }, _) if velocity > 0 => {
                self.note_on(channel, pitch, event.tick);
            }
            (EventKind::NoteOn { channel, pitch, .. }, AssignMode::Sustain { .. })
            | (EventKind::NoteOff { channel, pitch }, AssignMode::Sustain { .. }) => {
                self.note_off(channel, pitch, event.tick);
            }
            _ => {}
        }
    }

    fn note_on(&mut self, channel: u8, pitch: u8, tick: Tick) {
        match self.mode {
            AssignMode::Hit => self.hit(channel, pitch, tick),
            AssignMode::Sustain { min_gap } => self.sustain(channel, pitch, tick, min_gap),
        }
    }

    fn hit(&mut self, channel: u8, pitch: u8, tick: Tick) {
        let lane = self.lane(LaneId { channel, position: 0 });
        let concurrent = self
            .pending
            .iter()
            .rev()
            .find(|p| p.lane == lane)
            .is_some_and(|p| p.note.tick_start == tick);
        if concurrent {
            log::trace!(
                "dropping concurrent hit note {} on channel {} at tick {}",
                pitch,
                channel,
                tick
            );
            return;
        }
        self.push(lane, channel, pitch, tick, tick);
    }

    fn sustain(&mut self, channel: u8, pitch: u8, tick: Tick, min_gap: Tick) {
        let occupants = self.slots.entry(channel).or_default().clone();

        let mut reuse = None;
        for (position, &index) in occupants.iter().enumerate() {
            let occupant = &self.pending[index];
            let mut end = occupant.note.tick_end;
            let mut open = occupant.open;

            if occupant.note.pitch == pitch {
                if open {
                    end = tick;
                    open = false;
                }
                end = end
                    .min(tick.saturating_sub(min_gap))
                    .max(occupant.note.tick_start.saturating_add(min_gap));
            }

            if !open && end.saturating_add(min_gap.max(1)) <= tick {
                reuse = Some((position, index, end));
                break;
            }
        }

        let position = match reuse {
            Some((position, occupant, end)) => {
                let cut = &mut self.pending[occupant];
                cut.note.tick_end = end;
                cut.open = false;
                position
            }
            None => occupants.len(),
        };

        let lane = self.lane(LaneId { channel, position });
        let index = self.push(lane, channel, pitch, tick, tick.saturating_add(min_gap));

        let slots = self.slots.entry(channel).or_default();
        if position < slots.len() {
            slots[position] = index;
        } else {
            slots.push(index);
        }
    }

    fn note_off(&mut self, channel: u8, pitch: u8, tick: Tick) {
        let AssignMode::Sustain { min_gap } = self.mode else {
            return;
        };
        let Some(occupants) = self.slots.get(&channel) else {
            return;
        };

        let latest = occupants
            .iter()
            .copied()
            .filter(|&i| self.pending[i].open && self.pending[i].note.pitch == pitch)
            .max_by_key(|&i| self.pending[i].opened_seq);

        if let Some(index) = latest {
            let note = &mut self.pending[index];
            note.note.tick_end = tick.max(note.note.tick_start.saturating_add(min_gap));
            note.open = false;
        }
    }

    fn lane(&mut self, id: LaneId) -> usize {
        if let Some(&index) = self.lane_index.get(&id) {
            return index;
        }
        self.lanes.push(id);
        self.lane_index.insert(id, self.lanes.len() - 1);
        self.lanes.len() - 1
    }

    fn push(&mut self, lane: usize, channel: u8, pitch: u8, start: Tick, end: Tick) -> usize {
        let opened_seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            note: Note {
                channel,
                pitch,
                tick_start: start,
                tick_end: end,
            },
            lane,
            open: matches!(self.mode, AssignMode::Sustain { .. }),
            opened_seq,
        });
        self.pending.len() - 1
    }

    /// Close the stream and return lanes in order of first use.
    ///
    /// Notes left open keep their minimum length. Sustained notes whose end
    /// does not lie after their start are discarded.
    pub fn finish(self) -> Vec<Lane> {
        let mut lanes: Vec<Lane> = self.lanes.iter().map(|&id| Lane::empty(id)).collect();

        for pending in self.pending {
            if pending.open {
                log::warn!(
                    "note {} on channel {} at tick {} has no note-off; closing at tick {}",
                    pending.note.pitch,
                    pending.note.channel,
                    pending.note.tick_start,
                    pending.note.tick_end
                );
            }
            let sustained = matches!(self.mode, AssignMode::Sustain { .. });
            if sustained && pending.note.tick_end <= pending.note.tick_start {
                continue;
            }
            lanes[pending.lane].notes.push(pending.note);
        }

        lanes
    }
}

/// Assign a tick-ordered note stream to lanes.
pub fn assign_lanes(note_events: &[TimedEvent], mode: AssignMode) -> Vec<Lane> {
    let mut assignor = LaneAssignor::new(mode);
    for event in note_events {
        assignor.feed(event);
    }
    assignor.finish()
}
