//! Harmonic-percussive source separation (HPSS)
//!
//! Median filtering of the magnitude spectrogram (Fitzgerald 2010): harmonic
//! content is smooth along time, percussive content is smooth along frequency.
//!
//! 1. STFT with a Hann window, storing magnitude and unit phase per bin
//! 2. Harmonic estimate `H`: per-bin median across `hpss_harmonic_kernel` frames
//! 3. Percussive estimate `P`: per-frame median across `hpss_percussive_kernel` bins
//! 4. Soft masks `H²/(H²+P²)` and `P²/(H²+P²)` applied to the original magnitude
//! 5. Inverse FFT with the stored phase, Hann synthesis window, overlap-add
//!    normalized by the summed squared window
//!
//! # Reference
//!
//! Fitzgerald, D. (2010). Harmonic/Percussive Separation using Median Filtering.
//! *Proceedings of the International Conference on Digital Audio Effects (DAFx)*.

use crate::config::AnalysisConfig;
use crate::dsp::fft::{fft_in_place, ifft_in_place};
use crate::dsp::window::hann_window;
use crate::error::AnalysisError;
use crate::signal::AudioSignal;

const MASK_EPSILON: f32 = 1e-12;
const NORM_EPSILON: f32 = 1e-8;

/// Separated harmonic and percussive components
#[derive(Debug, Clone, PartialEq)]
pub struct HpssResult {
    /// Harmonic (sustained) component
    pub harmonic: Vec<f32>,
    /// Percussive (transient) component
    pub percussive: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl HpssResult {
    /// Harmonic component as a mono signal
    pub fn harmonic_signal(&self) -> Result<AudioSignal, AnalysisError> {
        AudioSignal::from_mono(self.harmonic.clone(), self.sample_rate)
    }

    /// Percussive component as a mono signal
    pub fn percussive_signal(&self) -> Result<AudioSignal, AnalysisError> {
        AudioSignal::from_mono(self.percussive.clone(), self.sample_rate)
    }
}

/// Magnitude spectrogram with unit phase, frames × (N/2 + 1) bins
struct Spectrogram {
    bins: usize,
    magnitude: Vec<f32>,
    phase_re: Vec<f32>,
    phase_im: Vec<f32>,
}

impl Spectrogram {
    fn frames(&self) -> usize {
        if self.bins == 0 {
            0
        } else {
            self.magnitude.len() / self.bins
        }
    }

    #[inline]
    fn mag(&self, frame: usize, bin: usize) -> f32 {
        self.magnitude[frame * self.bins + bin]
    }
}

fn median_in_place(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mid = values.len() / 2;
    let (_, m, _) = values.select_nth_unstable_by(mid, |a, b| {
        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
    });
    *m
}

fn stft(samples: &[f32], frame_size: usize, hop_size: usize, n_frames: usize) -> Spectrogram {
    let bins = frame_size / 2 + 1;
    let window = hann_window(frame_size);
    let mut re = vec![0.0f32; frame_size];
    let mut im = vec![0.0f32; frame_size];
    let mut spec = Spectrogram {
        bins,
        magnitude: Vec::with_capacity(n_frames * bins),
        phase_re: Vec::with_capacity(n_frames * bins),
        phase_im: Vec::with_capacity(n_frames * bins),
    };

    for t in 0..n_frames {
        let start = t * hop_size;
        for i in 0..frame_size {
            re[i] = samples.get(start + i).copied().unwrap_or(0.0) * window[i];
        }
        im.fill(0.0);
        fft_in_place(&mut re, &mut im);

        for k in 0..bins {
            let m = re[k].hypot(im[k]);
            spec.magnitude.push(m);
            if m > MASK_EPSILON {
                spec.phase_re.push(re[k] / m);
                spec.phase_im.push(im[k] / m);
            } else {
                spec.phase_re.push(1.0);
                spec.phase_im.push(0.0);
            }
        }
    }
    spec
}

/// Per-bin median across `kernel` frames
fn harmonic_estimate(spec: &Spectrogram, kernel: usize) -> Vec<f32> {
    let frames = spec.frames();
    let half = kernel / 2;
    let mut out = vec![0.0f32; spec.magnitude.len()];
    let mut scratch = Vec::with_capacity(kernel);
    for t in 0..frames {
        let lo = t.saturating_sub(half);
        let hi = (t + half).min(frames - 1);
        for k in 0..spec.bins {
            scratch.clear();
            scratch.extend((lo..=hi).map(|f| spec.mag(f, k)));
            out[t * spec.bins + k] = median_in_place(&mut scratch);
        }
    }
    out
}

/// Per-frame median across `kernel` bins
fn percussive_estimate(spec: &Spectrogram, kernel: usize) -> Vec<f32> {
    let frames = spec.frames();
    let bins = spec.bins;
    let half = kernel / 2;
    let mut out = vec![0.0f32; spec.magnitude.len()];
    let mut scratch = Vec::with_capacity(kernel);
    for t in 0..frames {
        let row = &spec.magnitude[t * bins..(t + 1) * bins];
        for k in 0..bins {
            let lo = k.saturating_sub(half);
            let hi = (k + half).min(bins - 1);
            scratch.clear();
            scratch.extend_from_slice(&row[lo..=hi]);
            out[t * bins + k] = median_in_place(&mut scratch);
        }
    }
    out
}

/// Separate a mono channel into harmonic and percussive components
///
/// Frame, hop, frame cap and median kernels come from `config`. Input
/// shorter than one frame is processed as a single zero-padded frame. The
/// outputs cover the analysed frames and are truncated to the input length;
/// when the frame cap cuts a long input, the outputs stop where the last frame
/// ends.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `hpss_frame_size` is not a power of
/// two or `hpss_hop_size` is zero.
pub fn separate_hpss(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
) -> Result<HpssResult, AnalysisError> {
    let frame_size = config.hpss_frame_size;
    let hop_size = config.hpss_hop_size;
    if frame_size < 2 || !frame_size.is_power_of_two() {
        return Err(AnalysisError::InvalidInput(format!(
            "HPSS frame size must be a power of two, got {}",
            frame_size
        )));
    }
    if hop_size == 0 {
        return Err(AnalysisError::InvalidInput(
            "HPSS hop size must be > 0".to_string(),
        ));
    }

    if samples.is_empty() {
        return Ok(HpssResult {
            harmonic: Vec::new(),
            percussive: Vec::new(),
            sample_rate,
        });
    }

    // The last frame is zero-padded past the end of the input
    let natural_frames = if samples.len() > frame_size {
        (samples.len() - frame_size).div_ceil(hop_size) + 1
    } else {
        1
    };
    let n_frames = natural_frames.min(config.hpss_max_frames.max(1));
    if n_frames < natural_frames {
        log::warn!(
            "HPSS capped at {} of {} frames",
            n_frames,
            natural_frames
        );
    }

    log::debug!(
        "HPSS: {} samples, {} frames (frame={}, hop={}, kernels {}x{})",
        samples.len(),
        n_frames,
        frame_size,
        hop_size,
        config.hpss_harmonic_kernel,
        config.hpss_percussive_kernel
    );

    let spec = stft(samples, frame_size, hop_size, n_frames);
    let harmonic_est = harmonic_estimate(&spec, config.hpss_harmonic_kernel.max(1));
    let percussive_est = percussive_estimate(&spec, config.hpss_percussive_kernel.max(1));

    let covered = samples.len().min((n_frames - 1) * hop_size + frame_size);
    let out_len = (n_frames - 1) * hop_size + frame_size;
    let window = hann_window(frame_size);
    let mut harmonic = vec![0.0f32; out_len];
    let mut percussive = vec![0.0f32; out_len];
    let mut norm = vec![0.0f32; out_len];

    let bins = spec.bins;
    let mut h_re = vec![0.0f32; frame_size];
    let mut h_im = vec![0.0f32; frame_size];
    let mut p_re = vec![0.0f32; frame_size];
    let mut p_im = vec![0.0f32; frame_size];

    for t in 0..n_frames {
        for k in 0..bins {
            let idx = t * bins + k;
            let h2 = harmonic_est[idx] * harmonic_est[idx];
            let p2 = percussive_est[idx] * percussive_est[idx];
            let total = h2 + p2;
            let (mask_h, mask_p) = if total > MASK_EPSILON {
                (h2 / total, p2 / total)
            } else {
                (0.5, 0.5)
            };
            let m = spec.magnitude[idx];
            let (cr, ci) = (spec.phase_re[idx], spec.phase_im[idx]);
            h_re[k] = m * mask_h * cr;
            h_im[k] = m * mask_h * ci;
            p_re[k] = m * mask_p * cr;
            p_im[k] = m * mask_p * ci;
        }
        // Conjugate-symmetric upper half
        for k in bins..frame_size {
            let mirror = frame_size - k;
            h_re[k] = h_re[mirror];
            h_im[k] = -h_im[mirror];
            p_re[k] = p_re[mirror];
            p_im[k] = -p_im[mirror];
        }
        ifft_in_place(&mut h_re, &mut h_im);
        ifft_in_place(&mut p_re, &mut p_im);

        let start = t * hop_size;
        for i in 0..frame_size {
            let w = window[i];
            harmonic[start + i] += h_re[i] * w;
            percussive[start + i] += p_re[i] * w;
            norm[start + i] += w * w;
        }
    }

    for ((h, p), &n) in harmonic.iter_mut().zip(percussive.iter_mut()).zip(&norm) {
        if n > NORM_EPSILON {
            *h /= n;
            *p /= n;
        } else {
            *h = 0.0;
            *p = 0.0;
        }
    }
    harmonic.truncate(covered);
    percussive.truncate(covered);

    Ok(HpssResult {
        harmonic,
        percussive,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn rms(x: &[f32]) -> f32 {
        if x.is_empty() {
            return 0.0;
        }
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn test_tone_is_harmonic() {
        let sr = 44100;
        let tone: Vec<f32> = (0..sr * 2)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / sr as f32).sin())
            .collect();
        let result = separate_hpss(&tone, sr, &AnalysisConfig::default()).unwrap();
        assert!(rms(&result.harmonic) > 2.0 * rms(&result.percussive));

        let recon: Vec<f32> = result
            .harmonic
            .iter()
            .zip(&result.percussive)
            .map(|(h, p)| h + p)
            .collect();
        let ratio = rms(&recon) / rms(&tone);
        assert!((0.3..=1.5).contains(&ratio), "ratio {}", ratio);
    }

    #[test]
    fn test_clicks_are_percussive() {
        let sr = 44100;
        let mut clicks = vec![0.0f32; sr as usize * 2];
        for start in (0..clicks.len()).step_by(11025) {
            clicks[start] = 1.0;
            if start + 1 < clicks.len() {
                clicks[start + 1] = -0.8;
            }
        }
        let result = separate_hpss(&clicks, sr, &AnalysisConfig::default()).unwrap();
        assert!(rms(&result.percussive) > 1.5 * rms(&result.harmonic));
    }

    #[test]
    fn test_short_and_empty_input() {
        let config = AnalysisConfig::default();
        let short = separate_hpss(&[0.1; 500], 44100, &config).unwrap();
        assert_eq!(short.harmonic.len(), 500);
        assert_eq!(short.percussive.len(), 500);

        let empty = separate_hpss(&[], 44100, &config).unwrap();
        assert!(empty.harmonic.is_empty());
    }

    #[test]
    fn test_unaligned_length_fully_covered() {
        let config = AnalysisConfig::default();
        // 300 samples past the last full hop
        let len = 2048 + 40 * 512 + 300;
        let tone: Vec<f32> = (0..len)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let result = separate_hpss(&tone, 44100, &config).unwrap();
        assert_eq!(result.harmonic.len(), len);
        assert_eq!(result.percussive.len(), len);

        let tail = &result.harmonic[len - 300..];
        assert!(tail.iter().all(|v| v.is_finite()));
        assert!(rms(tail) > 0.1, "tail rms {}", rms(tail));
    }

    #[test]
    fn test_frame_cap_truncates() {
        let config = AnalysisConfig {
            hpss_max_frames: 4,
            ..AnalysisConfig::default()
        };
        let result = separate_hpss(&vec![0.1; 44100], 44100, &config).unwrap();
        assert_eq!(result.harmonic.len(), 3 * 512 + 2048);
        assert!(result.harmonic_signal().is_ok());
    }

    #[test]
    fn test_median() {
        let mut v = vec![5.0, 1.0, 3.0];
        assert_eq!(median_in_place(&mut v), 3.0);
        assert_eq!(median_in_place(&mut []), 0.0);
    }
}
