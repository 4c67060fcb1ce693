//! Band energy aggregation
//!
//! Seven named frequency bands, each reported as average and peak level in dB
//! over the analysed frames plus a coarse dominance label.

use serde::{Deserialize, Serialize};

use super::fft::frequency_bin;
use super::window::{frame_count, sampled_frame_indices, SpectralFrame};
use crate::error::AnalysisError;

/// Floor for every band level, in dB
pub const DB_FLOOR: f32 = -100.0;

/// Named band edges in Hz, low to high
pub const BAND_DEFINITIONS: [(&str, f32, f32); 7] = [
    ("Sub Bass", 20.0, 80.0),
    ("Bass", 80.0, 250.0),
    ("Low Mids", 250.0, 500.0),
    ("Mids", 500.0, 2000.0),
    ("Upper Mids", 2000.0, 5000.0),
    ("Presence", 5000.0, 10000.0),
    ("Brilliance", 10000.0, 20000.0),
];

/// Coarse presence label of a band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dominance {
    /// Average above -20 dB
    Dominant,
    /// Average above -35 dB
    Present,
    /// Average above -55 dB
    Weak,
    /// Anything quieter
    Absent,
}

impl Dominance {
    /// Label for an average level in dB
    pub fn from_db(avg_db: f32) -> Self {
        if avg_db > -20.0 {
            Dominance::Dominant
        } else if avg_db > -35.0 {
            Dominance::Present
        } else if avg_db > -55.0 {
            Dominance::Weak
        } else {
            Dominance::Absent
        }
    }
}

/// Energy summary of one frequency band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralBand {
    /// Band name ("Sub Bass", "Bass", ...)
    pub name: String,
    /// Lower edge in Hz
    pub low_hz: f32,
    /// Upper edge in Hz
    pub high_hz: f32,
    /// Mean level over frames, in dB
    pub avg_db: f32,
    /// Loudest frame level, in dB
    pub peak_db: f32,
    /// Label derived from `avg_db`
    pub dominance: Dominance,
}

fn to_db(level: f32) -> f32 {
    if level > 0.0 && level.is_finite() {
        (20.0 * level.log10()).max(DB_FLOOR)
    } else {
        DB_FLOOR
    }
}

/// Streaming accumulator over per-frame magnitude spectra
///
/// Feed it the `N/2 + 1` magnitudes of every analysed frame, then call
/// [`BandAccumulator::finish`].
#[derive(Debug, Clone)]
pub struct BandAccumulator {
    ranges: Vec<(usize, usize)>,
    sums: Vec<f64>,
    peaks: Vec<f32>,
    frames: usize,
}

impl BandAccumulator {
    /// Accumulator for `fft_size`-point frames at `sample_rate`
    pub fn new(fft_size: usize, sample_rate: u32) -> Self {
        let nyquist = sample_rate as f32 / 2.0;
        let ranges = BAND_DEFINITIONS
            .iter()
            .map(|&(_, low, high)| {
                let lo = frequency_bin(low, fft_size, sample_rate).max(1);
                let hi = frequency_bin(high.min(nyquist), fft_size, sample_rate);
                (lo, hi)
            })
            .collect();
        Self {
            ranges,
            sums: vec![0.0; BAND_DEFINITIONS.len()],
            peaks: vec![0.0; BAND_DEFINITIONS.len()],
            frames: 0,
        }
    }

    /// Add one frame of magnitudes
    pub fn accumulate(&mut self, magnitudes: &[f32]) {
        for (b, &(lo, hi)) in self.ranges.iter().enumerate() {
            if lo > hi || lo >= magnitudes.len() {
                continue;
            }
            let hi = hi.min(magnitudes.len() - 1);
            let energy: f32 = magnitudes[lo..=hi].iter().map(|m| m * m).sum();
            let level = energy.sqrt();
            self.sums[b] += level as f64;
            if level > self.peaks[b] {
                self.peaks[b] = level;
            }
        }
        self.frames += 1;
    }

    /// Number of frames accumulated so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Band summaries; an accumulator that saw no frames reports every band at the floor
    pub fn finish(&self) -> Vec<SpectralBand> {
        BAND_DEFINITIONS
            .iter()
            .enumerate()
            .map(|(b, &(name, low, high))| {
                let (avg_db, peak_db) = if self.frames == 0 {
                    (DB_FLOOR, DB_FLOOR)
                } else {
                    let mean = (self.sums[b] / self.frames as f64) as f32;
                    (to_db(mean), to_db(self.peaks[b]))
                };
                SpectralBand {
                    name: name.to_string(),
                    low_hz: low,
                    high_hz: high,
                    avg_db,
                    peak_db,
                    dominance: Dominance::from_db(avg_db),
                }
            })
            .collect()
    }
}

/// Compute the seven band summaries of a mono channel
///
/// Frames of `frame_size` at `hop_size`, evenly subsampled to at most
/// `max_frames`. Input shorter than one frame is analysed as a single
/// zero-padded frame.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_size` is not a power of two.
pub fn compute_band_energies(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    max_frames: usize,
) -> Result<Vec<SpectralBand>, AnalysisError> {
    log::debug!(
        "Computing band energies: {} samples, frame={}, hop={}",
        samples.len(),
        frame_size,
        hop_size
    );

    let mut frame = SpectralFrame::new(frame_size)?;
    let mut acc = BandAccumulator::new(frame_size, sample_rate);

    let total = frame_count(samples.len(), frame_size, hop_size).max(1);
    for idx in sampled_frame_indices(total, max_frames.max(1)) {
        let mags = frame.analyze(samples, idx * hop_size);
        acc.accumulate(mags);
    }

    Ok(acc.finish())
}

/// Band by name, if present
pub fn find_band<'a>(bands: &'a [SpectralBand], name: &str) -> Option<&'a SpectralBand> {
    bands.iter().find(|b| b.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sr: u32, secs: f32) -> Vec<f32> {
        let n = (sr as f32 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    #[test]
    fn test_dominance_thresholds() {
        assert_eq!(Dominance::from_db(-10.0), Dominance::Dominant);
        assert_eq!(Dominance::from_db(-20.0), Dominance::Present);
        assert_eq!(Dominance::from_db(-40.0), Dominance::Weak);
        assert_eq!(Dominance::from_db(-80.0), Dominance::Absent);
    }

    #[test]
    fn test_sub_bass_sine_dominates() {
        let samples = sine(50.0, 44100, 1.0);
        let bands = compute_band_energies(&samples, 44100, 2048, 512, 200).unwrap();
        assert_eq!(bands.len(), 7);

        let sub = find_band(&bands, "Sub Bass").unwrap();
        let mids = find_band(&bands, "Mids").unwrap();
        assert!(sub.avg_db > mids.avg_db + 20.0);
        assert_eq!(sub.dominance, Dominance::Dominant);
        assert!(sub.peak_db >= sub.avg_db);
    }

    #[test]
    fn test_silence_at_floor() {
        let bands = compute_band_energies(&vec![0.0; 8192], 44100, 2048, 512, 200).unwrap();
        for band in bands {
            assert_eq!(band.avg_db, DB_FLOOR);
            assert_eq!(band.dominance, Dominance::Absent);
        }
    }

    #[test]
    fn test_short_input_single_frame() {
        let bands = compute_band_energies(&sine(1000.0, 44100, 0.01), 44100, 2048, 512, 200).unwrap();
        assert!(bands.iter().all(|b| b.avg_db.is_finite()));
    }
}
