//! # Error Types
//!
//! This module defines all error types for the chart converter.
//!
//! Only configuration mistakes and malformed input surface as errors. Conditions
//! the engine can recover from (a measure length that rounds to zero, a note that
//! never receives its note-off) take a defined fallback and are logged instead.
//!
//! ## Error Types
//! - `UnknownNoteSymbol` - Requested note symbol is outside the supported alphabet
//! - `InvalidOption` - Bad gap fraction, options file or reclock parameter
//! - `MalformedInput` - Event stream that cannot be put in a total order, or carries invalid values
//! - `MidiError` - The source file could not be decoded
//! - `IoError` - A file could not be read or written
//!
//! ## Usage
//! ```rust
//! use mid2tja::{convert, ChartError, ChartOptions, Song};
//!
//! let song = Song::new(480);
//! match convert(&song, &ChartOptions::default()) {
//!     Ok(tja) => println!("{}", tja),
//!     Err(ChartError::MalformedInput { track, index, message }) => {
//!         eprintln!("Bad event {} in track {}: {}", index, track, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    /// Note symbol outside the fixed alphabet.
    ///
    /// Rejected while building the options, before any scan begins.
    ///
    /// # Example
    /// ```
    /// # use mid2tja::ChartError;
    /// let err = ChartError::UnknownNoteSymbol("X".to_string());
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Unknown note symbol 'X': expected one of 012345679ABCDFGHI"
    /// );
    /// ```
    #[error("Unknown note symbol '{0}': expected one of 012345679ABCDFGHI")]
    UnknownNoteSymbol(String),

    /// Invalid option value.
    ///
    /// # Example
    /// ```
    /// # use mid2tja::ChartError;
    /// let err = ChartError::InvalidOption("long gap must be positive".to_string());
    /// assert_eq!(err.to_string(), "Invalid option: long gap must be positive");
    /// ```
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Malformed input event stream.
    ///
    /// Aborts the whole conversion: a half-quantized chart is never produced.
    ///
    /// # Example
    /// ```
    /// # use mid2tja::ChartError;
    /// let err = ChartError::MalformedInput {
    ///     track: 1,
    ///     index: 7,
    ///     message: "tick 90 precedes previous tick 120".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Malformed input in track 1, event 7: tick 90 precedes previous tick 120"
    /// );
    /// ```
    #[error("Malformed input in track {track}, event {index}: {message}")]
    MalformedInput {
        track: usize,
        index: usize,
        message: String,
    },

    /// The source MIDI file could not be decoded.
    #[error("MIDI error: {0}")]
    MidiError(String),

    #[error("IO error: {0}")]
    IoError(String),
}
