pub mod chart;
pub mod config;
pub mod error;
pub mod events;
pub mod midi;
pub mod validate;

pub use chart::{build_chart, to_tja, Chart, LaneChart};
pub use config::{ChartOptions, GapFraction, NoteSymbol};
pub use error::*;
pub use events::{EventKind, Song, Tick, TimedEvent};
pub use midi::{load_midi, parse_midi, reclock};
pub use validate::validate;

/// Convert a song to TJA text.
/// This is the main entry point for the library.
pub fn convert(song: &Song, options: &ChartOptions) -> Result<String, ChartError> {
    let chart = build_chart(song, options)?;
    Ok(to_tja(&chart))
}

/// Convert the bytes of a Standard MIDI File to TJA text.
pub fn convert_midi(bytes: &[u8], options: &ChartOptions) -> Result<String, ChartError> {
    let song = parse_midi(bytes)?;
    convert(&song, options)
}
