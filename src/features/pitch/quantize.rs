//! Note quantization to a tempo grid

use serde::{Deserialize, Serialize};

use super::DetectedNote;

/// Grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuantizeGrid {
    /// No quantization
    #[default]
    Off,
    /// 1/4 notes
    Quarter,
    /// 1/8 notes
    Eighth,
    /// 1/16 notes
    Sixteenth,
    /// 1/32 notes
    ThirtySecond,
    /// 1/8 triplets
    EighthTriplet,
    /// 1/16 triplets
    SixteenthTriplet,
}

impl QuantizeGrid {
    /// Grid step as a fraction of one beat; `None` for `Off`
    pub fn beats(&self) -> Option<f32> {
        match self {
            QuantizeGrid::Off => None,
            QuantizeGrid::Quarter => Some(1.0),
            QuantizeGrid::Eighth => Some(0.5),
            QuantizeGrid::Sixteenth => Some(0.25),
            QuantizeGrid::ThirtySecond => Some(0.125),
            QuantizeGrid::EighthTriplet => Some(1.0 / 3.0),
            QuantizeGrid::SixteenthTriplet => Some(1.0 / 6.0),
        }
    }

    /// Grid step in seconds at `bpm`
    pub fn step_seconds(&self, bpm: f32) -> Option<f32> {
        if !(bpm > 0.0) || !bpm.is_finite() {
            return None;
        }
        self.beats().map(|b| 60.0 / bpm * b)
    }
}

/// How notes are pulled onto the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizeSettings {
    /// Grid resolution
    pub grid: QuantizeGrid,
    /// 0 leaves timing untouched, 1 snaps fully
    pub strength: f32,
    /// Also snap note ends
    pub quantize_duration: bool,
}

impl Default for QuantizeSettings {
    fn default() -> Self {
        Self {
            grid: QuantizeGrid::Off,
            strength: 1.0,
            quantize_duration: false,
        }
    }
}

fn snap(time: f32, step: f32) -> f32 {
    (time / step).round() * step
}

/// Quantize note timing
///
/// `QuantizeGrid::Off` (or a non-positive tempo) returns the notes unchanged.
///
/// # Example
///
/// ```
/// use sonic_dsp::features::pitch::DetectedNote;
/// use sonic_dsp::features::pitch::quantize::{quantize_notes, QuantizeGrid, QuantizeSettings};
///
/// let note = DetectedNote {
///     midi: 60,
///     name: "C4".to_string(),
///     frequency: 261.6,
///     start_time: 0.49,
///     duration: 0.2,
///     velocity: 100,
///     confidence: 0.9,
///     pitch_bend: None,
/// };
/// let settings = QuantizeSettings { grid: QuantizeGrid::Quarter, ..QuantizeSettings::default() };
/// let out = quantize_notes(&[note], 120.0, &settings);
/// assert!((out[0].start_time - 0.5).abs() < 1e-6);
/// ```
pub fn quantize_notes(notes: &[DetectedNote], bpm: f32, settings: &QuantizeSettings) -> Vec<DetectedNote> {
    let Some(step) = settings.grid.step_seconds(bpm) else {
        return notes.to_vec();
    };
    let strength = settings.strength.clamp(0.0, 1.0);

    notes
        .iter()
        .map(|note| {
            let mut out = note.clone();
            let start = note.start_time + (snap(note.start_time, step) - note.start_time) * strength;
            out.start_time = start.max(0.0);

            if settings.quantize_duration {
                let end = note.start_time + note.duration;
                let snapped_end = snap(end, step);
                let new_end = end + (snapped_end - end) * strength;
                let duration = new_end - out.start_time;
                out.duration = if duration > 0.0 { duration } else { step };
            }
            out
        })
        .collect()
}
