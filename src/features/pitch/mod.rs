//! Pitch tracking and note segmentation
//!
//! YIN per frame → runs of frames on the same MIDI note → [`DetectedNote`]s,
//! each carrying its per-frame deviation from equal temperament in cents.

pub mod quantize;
pub mod yin;

use serde::{Deserialize, Serialize};

use crate::analysis::result::NOTE_NAMES;
use crate::config::AnalysisConfig;
use crate::features::spectral::rms;
use yin::yin_pitch;

/// Pitch analysis frame in samples
pub const PITCH_FRAME_SIZE: usize = 1024;

/// Shortest note kept, in frames
const MIN_NOTE_FRAMES: usize = 2;

/// A note found in the signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedNote {
    /// MIDI note number (69 = A4)
    pub midi: u8,
    /// Note name with octave ("A4", "C#3")
    pub name: String,
    /// Mean detected frequency in Hz
    pub frequency: f32,
    /// Onset time in seconds
    pub start_time: f32,
    /// Duration in seconds
    pub duration: f32,
    /// MIDI velocity 1..=127 from the loudest frame
    pub velocity: u8,
    /// Mean YIN confidence in [0, 1]
    pub confidence: f32,
    /// Per-frame deviation from the nominal pitch, in cents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch_bend: Option<Vec<f32>>,
}

/// Pitch of one analysis frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    /// Frame start in seconds
    pub time: f32,
    /// Fundamental in Hz, `None` when unvoiced
    pub frequency: Option<f32>,
    /// YIN confidence (0 when unvoiced)
    pub confidence: f32,
    /// Frame RMS
    pub rms: f32,
}

/// Fractional MIDI number of a frequency
#[inline]
pub fn frequency_to_midi(frequency: f32) -> f32 {
    69.0 + 12.0 * (frequency / 440.0).log2()
}

/// Frequency of a MIDI note number
#[inline]
pub fn midi_to_frequency(midi: f32) -> f32 {
    440.0 * 2.0f32.powf((midi - 69.0) / 12.0)
}

/// Name of a MIDI note with octave ("C4" = 60)
pub fn midi_note_name(midi: u8) -> String {
    let octave = midi as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[midi as usize % 12], octave)
}

/// Track pitch frame by frame
///
/// Frames of [`PITCH_FRAME_SIZE`] at half-frame hop; on long inputs the hop
/// grows so that no more than `config.pitch_max_frames` frames are analysed.
pub fn track_pitch(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Vec<PitchFrame> {
    let frame = PITCH_FRAME_SIZE;
    if samples.len() < frame || sample_rate == 0 {
        return Vec::new();
    }
    let max_frames = config.pitch_max_frames.max(2);
    let span = samples.len() - frame;
    let hop = (frame / 2).max(span.div_ceil(max_frames - 1));
    let n_frames = span / hop + 1;

    log::debug!("Tracking pitch: {} frames, hop {}", n_frames, hop);

    (0..n_frames)
        .map(|i| {
            let start = i * hop;
            let slice = &samples[start..start + frame];
            let estimate = yin_pitch(slice, sample_rate);
            PitchFrame {
                time: start as f32 / sample_rate as f32,
                frequency: estimate.map(|e| e.frequency),
                confidence: estimate.map(|e| e.confidence).unwrap_or(0.0),
                rms: rms(slice),
            }
        })
        .collect()
}

fn velocity_from_rms(level: f32) -> u8 {
    // Full-scale sine (RMS 0.707) maps to 127
    ((level / std::f32::consts::FRAC_1_SQRT_2).clamp(0.0, 1.0) * 126.0).round() as u8 + 1
}

/// Group voiced frames into notes
///
/// Consecutive voiced frames rounding to the same MIDI number form one note;
/// runs shorter than two frames are dropped.
pub fn segment_notes(frames: &[PitchFrame]) -> Vec<DetectedNote> {
    let mut notes = Vec::new();
    let frame_step = if frames.len() > 1 {
        frames[1].time - frames[0].time
    } else {
        0.0
    };

    let mut i = 0;
    while i < frames.len() {
        let Some(freq) = frames[i].frequency else {
            i += 1;
            continue;
        };
        let midi = frequency_to_midi(freq).round();
        let mut j = i + 1;
        while j < frames.len() {
            match frames[j].frequency {
                Some(f) if frequency_to_midi(f).round() == midi => j += 1,
                _ => break,
            }
        }

        let run = &frames[i..j];
        if run.len() >= MIN_NOTE_FRAMES && (0.0..=127.0).contains(&midi) {
            let nominal = midi_to_frequency(midi);
            let freqs: Vec<f32> = run.iter().filter_map(|f| f.frequency).collect();
            let bends = freqs
                .iter()
                .map(|f| 1200.0 * (f / nominal).log2())
                .collect();
            let peak_rms = run.iter().fold(0.0f32, |m, f| m.max(f.rms));
            let midi = midi as u8;
            notes.push(DetectedNote {
                midi,
                name: midi_note_name(midi),
                frequency: freqs.iter().sum::<f32>() / freqs.len() as f32,
                start_time: run[0].time,
                duration: run.len() as f32 * frame_step,
                velocity: velocity_from_rms(peak_rms),
                confidence: run.iter().map(|f| f.confidence).sum::<f32>() / run.len() as f32,
                pitch_bend: Some(bends),
            });
        }
        i = j;
    }
    notes
}

/// Detect notes in a mono channel
pub fn detect_notes(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Vec<DetectedNote> {
    segment_notes(&track_pitch(samples, sample_rate, config))
}

/// All pitch-bend values of a note list, in cents
pub fn collect_pitch_bends(notes: &[DetectedNote]) -> Vec<f32> {
    notes
        .iter()
        .filter_map(|n| n.pitch_bend.as_ref())
        .flatten()
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(freq: f32, sr: u32, secs: f32) -> Vec<f32> {
        (0..(sr as f32 * secs) as usize)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_midi_helpers() {
        assert_eq!(midi_note_name(69), "A4");
        assert_eq!(midi_note_name(60), "C4");
        assert_eq!(midi_note_name(61), "C#4");
        assert!((frequency_to_midi(440.0) - 69.0).abs() < 1e-4);
        assert!((midi_to_frequency(57.0) - 220.0).abs() < 1e-3);
    }

    #[test]
    fn test_two_note_sequence() {
        let mut samples = tone(220.0, 44100, 0.5);
        samples.extend(vec![0.0; 11025]);
        samples.extend(tone(330.0, 44100, 0.5));
        // Frames straddling the gaps may produce short fragments
        let notes: Vec<DetectedNote> = detect_notes(&samples, 44100, &AnalysisConfig::default())
            .into_iter()
            .filter(|n| n.duration > 0.1)
            .collect();
        assert_eq!(notes.len(), 2, "notes: {:?}", notes.iter().map(|n| &n.name).collect::<Vec<_>>());
        assert_eq!(notes[0].name, "A3");
        assert_eq!(notes[1].midi, 64);
        assert!(notes[1].start_time > notes[0].start_time);
        let bends = notes[0].pitch_bend.as_ref().unwrap();
        assert!(bends.iter().all(|c| c.abs() < 20.0));
    }

    #[test]
    fn test_hop_grows_with_cap() {
        let config = AnalysisConfig {
            pitch_max_frames: 10,
            ..AnalysisConfig::default()
        };
        let frames = track_pitch(&tone(440.0, 44100, 3.0), 44100, &config);
        assert!(frames.len() <= 10);
        assert!(frames.len() >= 9);
    }

    #[test]
    fn test_velocity_range() {
        assert_eq!(velocity_from_rms(0.0), 1);
        assert_eq!(velocity_from_rms(1.0), 127);
    }
}
