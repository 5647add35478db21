//! Pure functions from gesture coordinates and a note range to oscillator and gain settings.
//! Coordinates outside `[0, 1]` are passed through unclamped.

use crate::range::NoteRange;
use theremin_core::detuned_freq_hz;

const A4_NOTE: i32 = 69;
const A4_FREQ_HZ: f32 = 440.0;
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Level markers, in dB, drawn along the vertical axis.
pub const LEVEL_MARKERS_DB: [f32; 6] = [-36.0, -24.0, -18.0, -12.0, -6.0, 0.0];

/// Normalized pointer position over the playing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GesturePosition {
    pub x: f32,
    pub y: f32,
}

impl GesturePosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Equal-tempered frequency of a MIDI note. Octaves are applied as an exact power of two so
/// that the note 12 above always has exactly twice the frequency.
pub fn frequency_of(note: i32) -> f32 {
    let semitones = note - A4_NOTE;
    let octave = semitones.div_euclid(12);
    let semitone = semitones.rem_euclid(12);
    A4_FREQ_HZ * 2_f32.powf(semitone as f32 / 12.0) * 2_f32.powi(octave)
}

/// Cents above the low note of `range` for horizontal position `x`.
pub fn detune_cents(x: f32, range: NoteRange) -> f32 {
    100.0 * x * range.width() as f32
}

/// Gain for vertical position `y`. Squared to approximate perceived loudness.
pub fn gain_of(y: f32) -> f32 {
    y * y
}

pub fn sounding_frequency(base_freq_hz: f32, detune_cents: f32) -> f32 {
    detuned_freq_hz(base_freq_hz, detune_cents)
}

pub fn level_db(y: f32) -> f32 {
    20.0 * gain_of(y).log10()
}

/// Vertical position whose level is `db`. Inverse of `level_db` for `y >= 0`.
pub fn y_of_level_db(db: f32) -> f32 {
    10_f32.powf(db / 40.0)
}

/// Scientific pitch notation, e.g. 60 is "C4".
pub fn note_name(note: i32) -> String {
    let name = NOTE_NAMES[note.rem_euclid(12) as usize];
    let octave = note.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}
