//! Mel-frequency cepstral coefficients
//!
//! Power spectrum → 26 triangular mel filters → log → DCT-II, keeping 13
//! coefficients. Per-frame coefficients are averaged over the analysed frames.
//!
//! Mel scale: `mel = 2595 * log10(1 + f / 700)`.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::dsp::fft::bin_frequency;
use crate::dsp::window::{frame_count, sampled_frame_indices, SpectralFrame};
use crate::error::AnalysisError;

/// Number of mel filters
pub const MEL_BANDS: usize = 26;

/// Number of cepstral coefficients kept
pub const MFCC_COEFFICIENTS: usize = 13;

const LOG_FLOOR: f32 = 1e-10;

/// Mean MFCCs of a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MfccFeatures {
    /// Mean of each coefficient, `c0` first
    pub coefficients: Vec<f32>,
    /// Per-coefficient standard deviation across frames
    pub std_dev: Vec<f32>,
    /// Frames averaged
    pub frames: usize,
}

/// Hz to mel
#[inline]
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz
#[inline]
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over `N/2 + 1` bins, filters equally spaced in mel
/// between 0 Hz and Nyquist
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    weights: Vec<Vec<(usize, f32)>>,
}

impl MelFilterbank {
    /// Filterbank for `fft_size`-point frames at `sample_rate`
    pub fn new(n_filters: usize, fft_size: usize, sample_rate: u32) -> Self {
        let bins = fft_size / 2 + 1;
        let mel_max = hz_to_mel(sample_rate as f32 / 2.0);
        let edges: Vec<f32> = (0..n_filters + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (n_filters + 1) as f32))
            .collect();

        let weights = (0..n_filters)
            .map(|m| {
                let (lo, centre, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                (0..bins)
                    .filter_map(|k| {
                        let f = bin_frequency(k, fft_size, sample_rate);
                        let w = if f > lo && f <= centre {
                            (f - lo) / (centre - lo).max(f32::EPSILON)
                        } else if f > centre && f < hi {
                            (hi - f) / (hi - centre).max(f32::EPSILON)
                        } else {
                            0.0
                        };
                        (w > 0.0).then_some((k, w))
                    })
                    .collect()
            })
            .collect();
        Self { weights }
    }

    /// Log filter energies of one magnitude spectrum
    pub fn log_energies(&self, magnitudes: &[f32], out: &mut [f32]) {
        for (slot, filter) in out.iter_mut().zip(&self.weights) {
            let energy: f32 = filter
                .iter()
                .filter(|(k, _)| *k < magnitudes.len())
                .map(|&(k, w)| w * magnitudes[k] * magnitudes[k])
                .sum();
            *slot = energy.max(LOG_FLOOR).ln();
        }
    }
}

/// DCT-II of `input`, first `out.len()` coefficients (orthonormal scaling)
pub fn dct_ii(input: &[f32], out: &mut [f32]) {
    let n = input.len();
    if n == 0 {
        out.fill(0.0);
        return;
    }
    for (k, slot) in out.iter_mut().enumerate() {
        let scale = if k == 0 {
            (1.0 / n as f32).sqrt()
        } else {
            (2.0 / n as f32).sqrt()
        };
        let sum: f32 = input
            .iter()
            .enumerate()
            .map(|(i, &x)| x * (PI * k as f32 * (i as f32 + 0.5) / n as f32).cos())
            .sum();
        *slot = scale * sum;
    }
}

/// Mean MFCCs of a mono channel
///
/// Frames of `frame_size` at `hop_size`, evenly subsampled to at most
/// `max_frames`. Silent frames are skipped; an all-silent input returns
/// zero coefficients with `frames == 0`.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `frame_size` is not a power of two.
pub fn compute_mfcc(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
    max_frames: usize,
) -> Result<MfccFeatures, AnalysisError> {
    let mut frame = SpectralFrame::new(frame_size)?;
    let bank = MelFilterbank::new(MEL_BANDS, frame_size, sample_rate);
    let total = frame_count(samples.len(), frame_size, hop_size).max(1);
    let indices = sampled_frame_indices(total, max_frames.max(1));

    log::debug!("Computing MFCC over {} frames", indices.len());

    let mut log_mel = [0.0f32; MEL_BANDS];
    let mut cepstrum = [0.0f32; MFCC_COEFFICIENTS];
    let mut sum = [0.0f64; MFCC_COEFFICIENTS];
    let mut sum_sq = [0.0f64; MFCC_COEFFICIENTS];
    let mut frames = 0usize;

    for idx in indices {
        let mags = frame.analyze(samples, idx * hop_size);
        if mags.iter().all(|&m| m <= LOG_FLOOR) {
            continue;
        }
        bank.log_energies(mags, &mut log_mel);
        dct_ii(&log_mel, &mut cepstrum);
        for (i, &c) in cepstrum.iter().enumerate() {
            sum[i] += c as f64;
            sum_sq[i] += (c as f64) * (c as f64);
        }
        frames += 1;
    }

    if frames == 0 {
        return Ok(MfccFeatures {
            coefficients: vec![0.0; MFCC_COEFFICIENTS],
            std_dev: vec![0.0; MFCC_COEFFICIENTS],
            frames: 0,
        });
    }

    let n = frames as f64;
    let coefficients = sum.iter().map(|s| (s / n) as f32).collect();
    let std_dev = sum
        .iter()
        .zip(&sum_sq)
        .map(|(s, sq)| {
            let mean = s / n;
            ((sq / n - mean * mean).max(0.0)).sqrt() as f32
        })
        .collect();

    Ok(MfccFeatures {
        coefficients,
        std_dev,
        frames,
    })
}
