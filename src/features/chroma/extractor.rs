//! Goertzel chroma extraction
//!
//! A bank of Goertzel resonators, one per equal-tempered pitch between
//! octaves 2 and 7, folded into 12 pitch classes. Frames are Hann-windowed,
//! non-overlapping, and evenly subsampled to bound the cost on long tracks.
//!
//! # Example
//!
//! ```
//! use sonic_dsp::features::chroma::extractor::extract_chroma;
//!
//! let sr = 44100;
//! let samples: Vec<f32> = (0..sr)
//!     .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sr as f32).sin())
//!     .collect();
//! let chroma = extract_chroma(&samples, sr, 4096, 180);
//! let peak = (0..12).max_by(|&a, &b| chroma[a].total_cmp(&chroma[b])).unwrap();
//! assert_eq!(peak, 9); // A
//! ```

use std::f32::consts::PI;

use crate::dsp::window::{frame_count, hann_window, sampled_frame_indices};

/// Lowest octave of the resonator bank
pub const MIN_OCTAVE: i32 = 2;

/// Highest octave of the resonator bank
pub const MAX_OCTAVE: i32 = 7;

/// Lowest resonator frequency in Hz
pub const MIN_FREQUENCY: f32 = 50.0;

/// One Goertzel resonator
#[derive(Debug, Clone, Copy)]
pub struct Resonator {
    /// `2·cos(2πf/sr)`
    pub coefficient: f32,
    /// Pitch class 0..12 (0 = C)
    pub pitch_class: usize,
    /// Centre frequency in Hz
    pub frequency: f32,
}

/// Frequency of a MIDI note number (A4 = 69 = 440 Hz)
#[inline]
pub fn midi_to_frequency(midi: i32) -> f32 {
    440.0 * 2.0f32.powf((midi - 69) as f32 / 12.0)
}

/// Build the resonator bank for `sample_rate`
///
/// Pitches below [`MIN_FREQUENCY`] or above Nyquist are skipped.
pub fn resonator_bank(sample_rate: u32) -> Vec<Resonator> {
    let nyquist = sample_rate as f32 / 2.0;
    let mut bank = Vec::with_capacity(72);
    for octave in MIN_OCTAVE..=MAX_OCTAVE {
        for pc in 0..12 {
            let midi = 12 * (octave + 1) + pc as i32;
            let frequency = midi_to_frequency(midi);
            if frequency < MIN_FREQUENCY || frequency > nyquist {
                continue;
            }
            let omega = 2.0 * PI * frequency / sample_rate as f32;
            bank.push(Resonator {
                coefficient: 2.0 * omega.cos(),
                pitch_class: pc,
                frequency,
            });
        }
    }
    bank
}

/// Power of one resonator over a windowed frame
#[inline]
pub fn goertzel_power(frame: &[f32], coefficient: f32) -> f32 {
    let mut s1 = 0.0f32;
    let mut s2 = 0.0f32;
    for &x in frame {
        let s = x + coefficient * s1 - s2;
        s2 = s1;
        s1 = s;
    }
    (s1 * s1 + s2 * s2 - coefficient * s1 * s2).max(0.0)
}

/// Accumulated 12-bin chroma of a mono channel, normalized by its maximum
///
/// Frames of `frame_size` samples without overlap, at most `max_frames` of
/// them. Input shorter than one frame is analysed as one zero-padded frame.
/// Silence returns all zeros.
pub fn extract_chroma(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    max_frames: usize,
) -> [f32; 12] {
    let mut chroma = [0.0f32; 12];
    if samples.is_empty() || frame_size == 0 || sample_rate == 0 {
        return chroma;
    }

    let bank = resonator_bank(sample_rate);
    let window = hann_window(frame_size);
    let total = frame_count(samples.len(), frame_size, frame_size).max(1);
    let indices = sampled_frame_indices(total, max_frames.max(1));

    log::debug!(
        "Extracting chroma: {} resonators, {} of {} frames",
        bank.len(),
        indices.len(),
        total
    );

    let mut buffer = vec![0.0f32; frame_size];
    for idx in indices {
        let start = idx * frame_size;
        let available = samples.len().saturating_sub(start).min(frame_size);
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = if i < available {
                samples[start + i] * window[i]
            } else {
                0.0
            };
        }
        for r in &bank {
            chroma[r.pitch_class] += goertzel_power(&buffer, r.coefficient).sqrt();
        }
    }

    let max = chroma.iter().copied().fold(0.0f32, f32::max);
    if max > 1e-10 && max.is_finite() {
        for c in chroma.iter_mut() {
            *c /= max;
        }
    } else {
        chroma = [0.0; 12];
    }
    chroma
}
