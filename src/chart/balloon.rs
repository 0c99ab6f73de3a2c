//! Balloon estimator: turns held notes into required hit counts.
//!
//! A balloon asks the player for as many hits as the note's pitch would
//! vibrate during the hold, so higher and longer notes need more hits.

/// A long note observed during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldNote {
    pub pitch: u8,
    pub usec_start: u64,
    pub usec_end: Option<u64>,
}

impl HeldNote {
    pub fn is_closed(&self) -> bool {
        self.usec_end.is_some()
    }

    /// `max(1, round(frequency * seconds))`, ties to even; `None` while open.
    pub fn hit_count(&self) -> Option<u64> {
        let end = self.usec_end?;
        let seconds = end.saturating_sub(self.usec_start) as f64 / 1_000_000.0;
        let hits = (frequency_hz(self.pitch) * seconds).round_ties_even();
        Some((hits as u64).max(1))
    }
}

/// Tracks held notes of one lane in encounter order.
///
/// Only one note can be held at a time: opening while another is held is
/// ignored, and closing always ends the most recent one.
#[derive(Debug, Clone, Default)]
pub struct BalloonTracker {
    records: Vec<HeldNote>,
}

impl BalloonTracker {
    pub fn is_open(&self) -> bool {
        self.records.last().is_some_and(|r| !r.is_closed())
    }

    /// Returns false when a note is already held.
    pub fn open(&mut self, pitch: u8, usec: u64) -> bool {
        if self.is_open() {
            return false;
        }
        self.records.push(HeldNote {
            pitch,
            usec_start: usec,
            usec_end: None,
        });
        true
    }

    /// Returns false when nothing is held.
    pub fn close(&mut self, usec: u64) -> bool {
        match self.records.last_mut() {
            Some(record) if !record.is_closed() => {
                record.usec_end = Some(usec);
                true
            }
            _ => false,
        }
    }

    pub fn into_records(self) -> Vec<HeldNote> {
        self.records
    }
}

/// Equal temperament, pitch 69 = 440 Hz.
pub fn frequency_hz(pitch: u8) -> f64 {
    440.0 * 2f64.powf((f64::from(pitch) - 69.0) / 12.0)
}

/// Hit counts of all closed held notes, in encounter order.
pub fn balloon_counts(records: &[HeldNote]) -> Vec<u64> {
    records.iter().filter_map(HeldNote::hit_count).collect()
}
