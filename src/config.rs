//! # Conversion Options
//!
//! The engine is configured by one immutable `ChartOptions` value that is
//! threaded through lane assignment and scanning. Options come from the
//! command line, an optional YAML file, or code.
//!
//! ## Note symbols
//! ```text
//! 0                  timing only (no notes are read)
//! 1 2 3 4 A B C F G  hit notes
//! 5 6 H I            long notes (rolls)
//! 7 9 D              balloon notes (long notes with a hit count)
//! 8                  end of any long note (emitted, never requested)
//! ```
//!
//! ## Options file
//! ```yaml
//! title: My Song
//! note: 7
//! long-gap: 1/192
//! ```

use crate::chart::quantize::gcd;
use crate::error::ChartError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Symbols a chart may be converted into.
pub const KNOWN_NOTES: &str = "012345679ABCDFGHI";
const LONG_NOTES: &str = "5679DHI";
const BALLOON_NOTES: &str = "79D";

/// Symbol closing a long note.
pub const LONG_END_SYMBOL: char = '8';
/// Symbol of an empty cell.
pub const SILENCE_SYMBOL: char = '0';

/// Target note symbol, restricted to [`KNOWN_NOTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteSymbol(char);

impl NoteSymbol {
    pub fn new(symbol: char) -> Result<Self, ChartError> {
        if KNOWN_NOTES.contains(symbol) {
            Ok(Self(symbol))
        } else {
            Err(ChartError::UnknownNoteSymbol(symbol.to_string()))
        }
    }

    pub fn as_char(self) -> char {
        self.0
    }

    /// `0`: only timing directives and silent measures are produced.
    pub fn is_silent(self) -> bool {
        self.0 == SILENCE_SYMBOL
    }

    /// Long notes open with this symbol and close with [`LONG_END_SYMBOL`].
    pub fn is_long(self) -> bool {
        LONG_NOTES.contains(self.0)
    }

    pub fn is_balloon(self) -> bool {
        BALLOON_NOTES.contains(self.0)
    }
}

impl Default for NoteSymbol {
    fn default() -> Self {
        Self('7')
    }
}

impl FromStr for NoteSymbol {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::new(c),
            _ => Err(ChartError::UnknownNoteSymbol(s.to_string())),
        }
    }
}

impl fmt::Display for NoteSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Longest minimum gap accepted, in ticks.
pub const MAX_GAP_TICKS: u64 = u32::MAX as u64;

/// Minimum length and gap of long notes, as a fraction of four beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapFraction {
    numer: u64,
    denom: u64,
}

impl GapFraction {
    pub fn new(numer: u64, denom: u64) -> Result<Self, ChartError> {
        if numer == 0 || denom == 0 {
            return Err(ChartError::InvalidOption(format!(
                "long gap must be a positive fraction, got {}/{}",
                numer, denom
            )));
        }
        Ok(Self { numer, denom })
    }

    pub fn numer(&self) -> u64 {
        self.numer
    }

    pub fn denom(&self) -> u64 {
        self.denom
    }

    /// `floor(4 * ticks_per_beat * numer / denom)`, at most [`MAX_GAP_TICKS`].
    pub fn ticks(&self, ticks_per_beat: u32) -> Result<u64, ChartError> {
        let ticks =
            4 * u128::from(ticks_per_beat) * u128::from(self.numer) / u128::from(self.denom);
        if ticks > u128::from(MAX_GAP_TICKS) {
            return Err(ChartError::InvalidOption(format!(
                "long gap {} is {} ticks at {} ticks per beat; at most {} allowed",
                self, ticks, ticks_per_beat, MAX_GAP_TICKS
            )));
        }
        Ok(ticks as u64)
    }
}

impl Default for GapFraction {
    fn default() -> Self {
        Self { numer: 1, denom: 192 }
    }
}

impl FromStr for GapFraction {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChartError::InvalidOption(format!("Invalid long gap fraction: {}", s));

        let (numer, denom) = match s.trim().split_once('/') {
            Some((n, d)) => (
                n.trim().parse().map_err(|_| invalid())?,
                d.trim().parse().map_err(|_| invalid())?,
            ),
            None => parse_decimal(s.trim()).ok_or_else(invalid)?,
        };

        Self::new(numer, denom)
    }
}

/// `"0.005"` -> `(1, 200)`, `"2"` -> `(2, 1)`.
fn parse_decimal(s: &str) -> Option<(u64, u64)> {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !digits(whole) || !digits(frac) {
        return None;
    }

    let denom = 10u64.checked_pow(u32::try_from(frac.len()).ok()?)?;
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: u64 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
    let numer = whole.checked_mul(denom)?.checked_add(frac)?;

    let divisor = gcd(numer, denom).max(1);
    Some((numer / divisor, denom / divisor))
}

impl fmt::Display for GapFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

/// Everything the engine needs besides the song itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartOptions {
    pub title: Option<String>,
    pub note: NoteSymbol,
    pub long_gap: GapFraction,
}

impl ChartOptions {
    /// Load options from YAML. Missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ChartError> {
        let raw: RawOptions =
            serde_yaml::from_str(content).map_err(|e| ChartError::InvalidOption(e.to_string()))?;

        let note = match &raw.note {
            Some(n) => n.to_string().parse()?,
            None => NoteSymbol::default(),
        };
        let long_gap = match &raw.long_gap {
            Some(g) => g.to_string().parse()?,
            None => GapFraction::default(),
        };

        Ok(Self {
            title: raw.title,
            note,
            long_gap,
        })
    }

    /// Minimum long-note length and gap in ticks; zero for hit notes.
    pub fn min_gap_ticks(&self, ticks_per_beat: u32) -> Result<u64, ChartError> {
        if self.note.is_long() {
            self.long_gap.ticks(ticks_per_beat)
        } else {
            Ok(0)
        }
    }
}

/// Raw options for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct RawOptions {
    title: Option<String>,
    note: Option<RawScalar>,
    long_gap: Option<RawScalar>,
}

/// `note: 7`, `note: "7"` and `long-gap: 0.005` are all accepted.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawScalar {
    Number(u64),
    Decimal(f64),
    Text(String),
}

impl fmt::Display for RawScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawScalar::Number(n) => write!(f, "{}", n),
            RawScalar::Decimal(x) => write!(f, "{}", x),
            RawScalar::Text(s) => write!(f, "{}", s),
        }
    }
}
