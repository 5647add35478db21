use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest note selectable with the range bar.
pub const RANGE_MIN: i32 = 12;
/// Highest note selectable with the range bar.
pub const RANGE_MAX: i32 = 127;
/// Narrowest span the range bar allows, in semitones.
pub const WIDTH_MIN: i32 = 12;

const MIDI_NOTE_MAX: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid note range {low}..{high} (expected 0 <= low < high <= 127)")]
pub struct RangeError {
    pub low: i32,
    pub high: i32,
}

/// The notes spanned by the horizontal axis, as MIDI note numbers. The low note sounds at the
/// left edge and the high note at the right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNoteRange", into = "RawNoteRange")]
pub struct NoteRange {
    low: i32,
    high: i32,
}

#[derive(Serialize, Deserialize)]
struct RawNoteRange {
    low: i32,
    high: i32,
}

impl TryFrom<RawNoteRange> for NoteRange {
    type Error = RangeError;

    fn try_from(RawNoteRange { low, high }: RawNoteRange) -> Result<Self, Self::Error> {
        Self::new(low, high)
    }
}

impl From<NoteRange> for RawNoteRange {
    fn from(NoteRange { low, high }: NoteRange) -> Self {
        Self { low, high }
    }
}

impl NoteRange {
    pub fn new(low: i32, high: i32) -> Result<Self, RangeError> {
        if 0 <= low && low < high && high <= MIDI_NOTE_MAX {
            Ok(Self { low, high })
        } else {
            Err(RangeError { low, high })
        }
    }

    pub fn low(&self) -> i32 {
        self.low
    }

    pub fn high(&self) -> i32 {
        self.high
    }

    /// Span in semitones.
    pub fn width(&self) -> i32 {
        self.high - self.low
    }

    /// Move the low end the way the range bar does: no lower than `RANGE_MIN` and at least
    /// `WIDTH_MIN` below the high end. Returns the range unchanged if no such position exists.
    pub fn with_low(&self, note: i32) -> Self {
        let low = note.min(self.high - WIDTH_MIN).max(RANGE_MIN);
        Self::new(low, self.high).unwrap_or(*self)
    }

    /// Move the high end the way the range bar does: no higher than `RANGE_MAX` and at least
    /// `WIDTH_MIN` above the low end. Returns the range unchanged if no such position exists.
    pub fn with_high(&self, note: i32) -> Self {
        let high = note.max(self.low + WIDTH_MIN).min(RANGE_MAX);
        Self::new(self.low, high).unwrap_or(*self)
    }
}

impl Default for NoteRange {
    fn default() -> Self {
        Self { low: 48, high: 84 }
    }
}
