//! TJA text output.

use super::quantize::ChartSink;
use super::{Chart, LaneChart};

/// Name written in the leading comment of every chart.
pub const GENERATOR: &str = "mid2tja";

/// Sink writing measures and directives as TJA lines.
///
/// Directives always get their own line; a measure may be split around them
/// and is closed with `,`.
#[derive(Debug)]
pub struct TjaWriter {
    out: String,
    at_line_start: bool,
}

impl TjaWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            at_line_start: true,
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn ensure_line_start(&mut self) {
        if !self.at_line_start {
            self.out.push('\n');
            self.at_line_start = true;
        }
    }
}

impl Default for TjaWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartSink for TjaWriter {
    fn cells(&mut self, cells: &str) {
        if cells.is_empty() {
            return;
        }
        self.out.push_str(cells);
        self.at_line_start = false;
    }

    fn directive(&mut self, line: &str) {
        self.ensure_line_start();
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn end_measure(&mut self) {
        self.out.push_str(",\n");
        self.at_line_start = true;
    }
}

/// Render a complete chart to TJA text.
pub fn to_tja(chart: &Chart) -> String {
    let mut tja = String::new();

    tja.push_str(&format!("// {}\n", GENERATOR));
    tja.push_str(&format!("TITLE:{}\n", chart.title));
    tja.push_str(&format!("BPM:{:?}\n", chart.bpm));
    tja.push_str("OFFSET:0\n");

    for lane in &chart.lanes {
        tja.push_str(&lane_to_tja(lane));
    }

    tja
}

fn lane_to_tja(lane: &LaneChart) -> String {
    let mut tja = String::new();

    tja.push_str("\n\n");
    tja.push_str(&format!(
        "// Channel {}, polyphonic position {}\n",
        lane.id.channel, lane.id.position
    ));

    if !lane.balloons.is_empty() {
        let counts: Vec<String> = lane.balloons.iter().map(|c| c.to_string()).collect();
        tja.push_str(&format!("BALLOON:{}\n", counts.join(",")));
        tja.push('\n');
    }

    tja.push_str("#START\n");
    tja.push_str(&lane.body);
    tja.push_str("#END\n");

    tja
}
