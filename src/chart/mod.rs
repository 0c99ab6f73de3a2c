//! # Chart Module
//!
//! Convert a validated `Song` into a quantized, measure-segmented TJA chart.
//!
//! ## Pipeline
//! 1. **Extract** - timing events and note events are pulled from all tracks
//! 2. **Assign lanes** - each channel's notes are split into monophonic lanes
//! 3. **Merge** - every lane is merged with the global timing events
//! 4. **Silent scan** - a scan without output collects the held notes (balloons)
//! 5. **Emission scan** - the same scan writes TJA lines
//!
//! Both scans start from their own clone of one baseline `TimingState`, so
//! they see identical measure boundaries and grids; balloon counts always
//! match the balloon symbols that get written.
//!
//! ## Sub-modules
//! - `timing` - TimingState: signature, tempo, measure cursor, tick-to-usec anchor
//! - `lanes` - LaneAssignor: polyphony split and long-note gap policy
//! - `quantize` - scan_chart: per-measure GCD grid over a `ChartSink`
//! - `balloon` - held notes and their hit counts
//! - `emit` - TjaWriter and final text layout
//!
//! ## Quantization
//! A measure's grid unit is the GCD of every event offset inside the measure
//! and the measure length, so the grid reproduces the measure length exactly:
//!
//! ```text
//! 4/4 at 480 ticks per beat, notes at ticks 0, 720, 960
//! offsets: 720, 960, 1920  ->  unit 240  ->  8 cells
//! 70077000,
//! ```
//!
//! ## Example
//! ```rust
//! use mid2tja::{build_chart, ChartOptions, NoteSymbol, Song, TimedEvent};
//!
//! let song = Song::new(480).with_track(vec![
//!     TimedEvent::note_on(0, 0, 60, 100),
//!     TimedEvent::note_on(960, 0, 60, 100),
//! ]);
//! let options = ChartOptions {
//!     note: NoteSymbol::new('1').unwrap(),
//!     ..ChartOptions::default()
//! };
//!
//! let chart = build_chart(&song, &options).unwrap();
//! assert_eq!(chart.lanes.len(), 1);
//! assert_eq!(chart.lanes[0].body, "11,\n");
//! ```

pub mod balloon;
pub mod emit;
pub mod lanes;
pub mod quantize;
pub mod timing;


use crate::config::ChartOptions;
use crate::error::ChartError;
use crate::events::Song;
use crate::validate::validate;
use balloon::balloon_counts;
use emit::TjaWriter;
use lanes::{assign_lanes, AssignMode, Lane, LaneId};
use quantize::{merge_timeline, scan_chart, NullSink};
use timing::TimingState;

pub use emit::to_tja;

/// A converted chart, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    /// Tempo at tick 0.
    pub bpm: f64,
    pub lanes: Vec<LaneChart>,
}

/// The rendered body of one lane.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneChart {
    pub id: LaneId,
    /// Balloon hit counts, empty unless the note symbol is a balloon.
    pub balloons: Vec<u64>,
    /// Measure lines between `#START` and `#END`.
    pub body: String,
}

/// Build a chart from a song.
///
/// All lanes are converted before anything is returned; any error leaves no
/// partial chart behind.
pub fn build_chart(song: &Song, options: &ChartOptions) -> Result<Chart, ChartError> {
    validate(song)?;

    let note = options.note;
    let timing = song.timing_events();
    let baseline = TimingState::baseline(song.ticks_per_beat, &timing);

    let mut lanes = if note.is_silent() {
        Vec::new()
    } else {
        let mode = if note.is_long() {
            AssignMode::Sustain {
                min_gap: options.min_gap_ticks(song.ticks_per_beat)?,
            }
        } else {
            AssignMode::Hit
        };
        assign_lanes(&song.note_events(), mode)
    };
    if lanes.is_empty() {
        // timing alone still makes a chart
        lanes.push(Lane::empty(LaneId {
            channel: 0,
            position: 0,
        }));
    }
    log::debug!("{} lane(s) for note symbol {}", lanes.len(), note);

    let lanes = lanes
        .iter()
        .map(|lane| {
            let timeline = merge_timeline(&timing, &lane.events());

            let silent = scan_chart(&timeline, baseline.clone(), note, &mut NullSink);
            let balloons = if note.is_balloon() {
                balloon_counts(&silent.held_notes)
            } else {
                Vec::new()
            };
            if !balloons.is_empty() {
                log::debug!(
                    "channel {} position {}: balloons {:?}",
                    lane.id.channel,
                    lane.id.position,
                    balloons
                );
            }

            let mut writer = TjaWriter::new();
            let written = scan_chart(&timeline, baseline.clone(), note, &mut writer);
            log::debug!(
                "channel {} position {}: {} measure(s)",
                lane.id.channel,
                lane.id.position,
                written.measures
            );

            LaneChart {
                id: lane.id,
                balloons,
                body: writer.into_string(),
            }
        })
        .collect();

    Ok(Chart {
        title: options.title.clone().unwrap_or_default(),
        bpm: baseline.bpm(),
        lanes,
    })
}
