//! Autocorrelation-based tempo estimation
//!
//! Finds periodicity in the onset envelope using FFT-accelerated
//! autocorrelation, then ranks the strongest lags with a harmonic-consistency
//! bonus and a tempo prior.
//!
//! # Algorithm
//!
//! 1. Remove the envelope mean and compute `ACF = IFFT(|FFT(signal)|²)`
//! 2. Normalize each lag by its overlap `n - lag`, then by `ACF[0]`
//! 3. Take the 8 strongest local maxima between the lags of `max_bpm` and `min_bpm`
//! 4. Rescore: +25% of the peak height when another ACF peak sits within
//!    ±2 lags of half or double the candidate lag; ×1.1 inside 90-150 BPM,
//!    ×0.8 outside 70-180 BPM
//! 5. Refine the winning lag with a parabola and convert:
//!    `BPM = 60 * sample_rate / (lag * hop_size)`
//!
//! # Reference
//!
//! Ellis, D. P. W., & Pikrakis, A. (2006). Real-time Beat Induction.
//! *Proceedings of the International Conference on Music Information Retrieval*.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::peak_picking::{local_maxima, parabolic_offset};
use super::BpmCandidate;

const EPSILON: f32 = 1e-10;

/// Number of ACF peaks rescored as tempo candidates
const MAX_CANDIDATES: usize = 8;

/// Lag tolerance when looking for a peak at half or double a candidate lag
const HARMONIC_TOLERANCE: usize = 2;

/// Bonus fraction of the candidate's own ACF height for a harmonic match
const HARMONIC_BONUS: f32 = 0.25;

/// Normalized autocorrelation of `signal`
///
/// The mean is removed first; lag `l` is divided by `n - l` and the whole
/// function by its lag-0 value, so `acf[0] == 1` for any non-constant input.
/// A constant or empty input yields all zeros.
pub fn autocorrelation(signal: &[f32]) -> Vec<f32> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mean = signal.iter().sum::<f32>() / n as f32;

    // FFT size: next power of 2 >= 2*n (zero-padding avoids circular wrap)
    let fft_size = (2 * n).next_power_of_two();
    let mut buffer: Vec<Complex<f32>> = signal
        .iter()
        .map(|&x| Complex::new(x - mean, 0.0))
        .collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(fft_size).process(&mut buffer);
    for x in buffer.iter_mut() {
        *x = Complex::new(x.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(fft_size).process(&mut buffer);

    let scale = 1.0 / fft_size as f32;
    let mut acf: Vec<f32> = buffer[..n]
        .iter()
        .enumerate()
        .map(|(lag, x)| x.re * scale / (n - lag) as f32)
        .collect();

    let zero_lag = acf[0];
    if zero_lag <= EPSILON || !zero_lag.is_finite() {
        acf.fill(0.0);
        return acf;
    }
    for v in acf.iter_mut() {
        *v /= zero_lag;
    }
    acf
}

/// Convert a lag in frames to BPM
#[inline]
pub fn lag_to_bpm(lag: f32, sample_rate: u32, hop_size: usize) -> f32 {
    60.0 * sample_rate as f32 / (lag * hop_size as f32)
}

/// Convert BPM to a lag in frames
#[inline]
pub fn bpm_to_lag(bpm: f32, sample_rate: u32, hop_size: usize) -> f32 {
    60.0 * sample_rate as f32 / (bpm * hop_size as f32)
}

fn tempo_prior(bpm: f32) -> f32 {
    if (90.0..=150.0).contains(&bpm) {
        1.1
    } else if !(70.0..=180.0).contains(&bpm) {
        0.8
    } else {
        1.0
    }
}

fn has_peak_near(peaks: &[(usize, f32)], target: usize) -> bool {
    target > 0
        && peaks
            .iter()
            .any(|&(lag, v)| v > EPSILON && lag.abs_diff(target) <= HARMONIC_TOLERANCE)
}

/// Ranked tempo candidates from an onset envelope
///
/// Returns an empty list when the lag range collapses or the ACF has no local
/// maximum inside it. `confidence` of each candidate is its raw ACF height
/// clamped to [0, 1]; candidates are sorted by rescored value, best first.
pub fn estimate_bpm_candidates(
    envelope: &[f32],
    sample_rate: u32,
    hop_size: usize,
    min_bpm: f32,
    max_bpm: f32,
) -> Vec<BpmCandidate> {
    if envelope.len() < 2 || sample_rate == 0 || hop_size == 0 || min_bpm <= 0.0 {
        return Vec::new();
    }

    let acf = autocorrelation(envelope);
    let n = acf.len();

    let lag_min = bpm_to_lag(max_bpm, sample_rate, hop_size).floor().max(1.0) as usize;
    let lag_max = (bpm_to_lag(min_bpm, sample_rate, hop_size).ceil() as usize).min(n / 2);

    if lag_min >= lag_max {
        log::warn!(
            "Collapsed lag range [{}, {}] for envelope of {} frames",
            lag_min,
            lag_max,
            n
        );
        return Vec::new();
    }

    let mut in_range = local_maxima(&acf, lag_min, lag_max);
    if in_range.is_empty() {
        log::warn!("No autocorrelation peaks in lag range [{}, {}]", lag_min, lag_max);
        return Vec::new();
    }
    in_range.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    in_range.truncate(MAX_CANDIDATES);

    // Harmonic partners may lie outside the tempo range
    let all_peaks = local_maxima(&acf, 1, n);

    let mut candidates: Vec<(BpmCandidate, f32)> = in_range
        .into_iter()
        .map(|(lag, value)| {
            let mut score = value;
            if has_peak_near(&all_peaks, lag / 2) || has_peak_near(&all_peaks, lag * 2) {
                score += HARMONIC_BONUS * value;
            }

            let offset = if lag + 1 < n {
                parabolic_offset(acf[lag - 1], acf[lag], acf[lag + 1])
            } else {
                0.0
            };
            let bpm = lag_to_bpm(lag as f32 + offset, sample_rate, hop_size);
            score *= tempo_prior(bpm);

            (
                BpmCandidate {
                    bpm,
                    confidence: value.clamp(0.0, 1.0),
                },
                score,
            )
        })
        .collect();

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    log::debug!(
        "Autocorrelation found {} BPM candidates in lags [{}, {}]",
        candidates.len(),
        lag_min,
        lag_max
    );

    candidates.into_iter().map(|(c, _)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse_envelope(period: usize, len: usize) -> Vec<f32> {
        (0..len).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_autocorrelation_periodic() {
        let acf = autocorrelation(&pulse_envelope(4, 64));
        assert!((acf[0] - 1.0).abs() < 1e-5);
        assert!(acf[4] > acf[2]);
        assert!(acf[8] > acf[6]);
    }

    #[test]
    fn test_autocorrelation_constant_is_zero() {
        assert!(autocorrelation(&[0.5; 32]).iter().all(|&v| v == 0.0));
        assert!(autocorrelation(&[]).is_empty());
    }

    #[test]
    fn test_candidates_120bpm() {
        // 120 BPM at 44.1 kHz / 512 hop: 43.07 frames per beat
        let env = pulse_envelope(43, 800);
        let candidates = estimate_bpm_candidates(&env, 44100, 512, 60.0, 200.0);
        assert!(!candidates.is_empty());
        assert!(
            (candidates[0].bpm - 120.0).abs() < 3.0,
            "got {:.2}",
            candidates[0].bpm
        );
        assert!((0.0..=1.0).contains(&candidates[0].confidence));
    }

    #[test]
    fn test_candidates_collapsed_range() {
        // Lag for 60 BPM is 86 frames; a 40-frame envelope cannot hold it
        assert!(estimate_bpm_candidates(&pulse_envelope(4, 40), 44100, 512, 60.0, 200.0).is_empty());
    }

    #[test]
    fn test_tempo_prior() {
        assert_eq!(tempo_prior(120.0), 1.1);
        assert_eq!(tempo_prior(160.0), 1.0);
        assert_eq!(tempo_prior(60.0), 0.8);
    }
}
