//! Kick drum distortion
//!
//! Kicks are located on a 30–120 Hz envelope. For each one a long FFT finds
//! the fundamental; total harmonic distortion compares the energy at its first
//! ten harmonics with the fundamental, and the harmonic ratio compares energy
//! on the harmonic series with everything between the harmonics.

use serde::{Deserialize, Serialize};

use super::{band_envelope, envelope_peaks};
use crate::dsp::fft::frequency_bin;
use crate::dsp::filter::Biquad;
use crate::dsp::window::SpectralFrame;
use crate::features::period::peak_picking::parabolic_offset;

const KICK_LOW_HZ: f32 = 30.0;
const KICK_HIGH_HZ: f32 = 120.0;
const ENVELOPE_WINDOW_MS: f32 = 20.0;

/// Kicks closer than this are merged, in seconds
const MIN_KICK_SPACING: f32 = 0.2;

const PEAK_THRESHOLD: f32 = 0.3;

/// Kicks analysed at most
const MAX_KICKS: usize = 16;

/// FFT length per kick
const KICK_FFT_SIZE: usize = 8192;

/// Harmonics above the fundamental considered
const HARMONICS: usize = 10;

/// Bins on each side of a harmonic counted towards it
const HARMONIC_HALF_WIDTH: usize = 2;

/// THD above which a kick is called distorted
pub const THD_THRESHOLD: f32 = 0.15;

/// Harmonic ratio below which a kick is called distorted
pub const HARMONIC_RATIO_THRESHOLD: f32 = 0.5;

/// Harmonic ratio reported when there is no inharmonic energy
pub const HARMONIC_RATIO_CEILING: f32 = 100.0;

/// Kick distortion analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickDistortionResult {
    /// `thd > 0.15 || harmonic_ratio < 0.5`
    pub is_distorted: bool,
    /// Mean total harmonic distortion
    pub thd: f32,
    /// Mean harmonic / inharmonic energy ratio, at most [`HARMONIC_RATIO_CEILING`]
    pub harmonic_ratio: f32,
    /// Mean kick fundamental in Hz
    pub fundamental_hz: f32,
    /// Kicks analysed
    pub kick_count: usize,
}

impl Default for KickDistortionResult {
    fn default() -> Self {
        Self {
            is_distorted: false,
            thd: 0.0,
            harmonic_ratio: HARMONIC_RATIO_CEILING,
            fundamental_hz: 0.0,
            kick_count: 0,
        }
    }
}

struct KickSpectrum {
    thd: f32,
    harmonic_ratio: f32,
    fundamental_hz: f32,
}

fn band_power(power: &[f32], centre: usize) -> f32 {
    let lo = centre.saturating_sub(HARMONIC_HALF_WIDTH);
    let hi = (centre + HARMONIC_HALF_WIDTH).min(power.len() - 1);
    power[lo..=hi].iter().sum()
}

fn analyse_kick(magnitudes: &[f32], sample_rate: u32) -> Option<KickSpectrum> {
    let power: Vec<f32> = magnitudes.iter().map(|m| m * m).collect();
    let lo = frequency_bin(KICK_LOW_HZ, KICK_FFT_SIZE, sample_rate).max(1);
    let hi = frequency_bin(KICK_HIGH_HZ, KICK_FFT_SIZE, sample_rate);
    if hi <= lo {
        return None;
    }

    let f0_bin = (lo..=hi).max_by(|&a, &b| power[a].total_cmp(&power[b]))?;
    let fundamental = band_power(&power, f0_bin);
    if !(fundamental > 1e-12) {
        return None;
    }

    // Upper harmonics drift off integer multiples of the peak bin
    let f0_exact = if f0_bin > 0 && f0_bin + 1 < magnitudes.len() {
        f0_bin as f32
            + parabolic_offset(magnitudes[f0_bin - 1], magnitudes[f0_bin], magnitudes[f0_bin + 1])
    } else {
        f0_bin as f32
    };

    let last_bin = power.len() - 1;
    let mut harmonic = 0.0f32;
    let mut covered = vec![false; power.len()];
    for h in 1..=HARMONICS + 1 {
        let centre = (f0_exact * h as f32).round() as usize;
        if centre + HARMONIC_HALF_WIDTH > last_bin {
            break;
        }
        let p = band_power(&power, centre);
        if h > 1 {
            harmonic += p;
        }
        for slot in &mut covered[centre - HARMONIC_HALF_WIDTH.min(centre)..=centre + HARMONIC_HALF_WIDTH] {
            *slot = true;
        }
    }

    // Region spanned by the series: half the fundamental up to past the last harmonic
    let region_lo = f0_bin / 2;
    let region_hi = ((f0_exact * (HARMONICS as f32 + 1.5)) as usize).min(last_bin);
    let (on, off) = (region_lo..=region_hi).fold((0.0f32, 0.0f32), |(on, off), k| {
        if covered[k] {
            (on + power[k], off)
        } else {
            (on, off + power[k])
        }
    });

    Some(KickSpectrum {
        thd: harmonic.sqrt() / fundamental.sqrt(),
        harmonic_ratio: harmonic_ratio(on, off),
        fundamental_hz: f0_exact * sample_rate as f32 / KICK_FFT_SIZE as f32,
    })
}

/// Harmonic over inharmonic energy, capped at [`HARMONIC_RATIO_CEILING`]
fn harmonic_ratio(harmonic: f32, inharmonic: f32) -> f32 {
    if inharmonic <= harmonic / HARMONIC_RATIO_CEILING || inharmonic <= 0.0 {
        HARMONIC_RATIO_CEILING
    } else {
        harmonic / inharmonic
    }
}

fn kick_is_distorted(thd: f32, harmonic_ratio: f32) -> bool {
    thd > THD_THRESHOLD || harmonic_ratio < HARMONIC_RATIO_THRESHOLD
}

/// Measure harmonic distortion of the kick drum
pub fn detect_kick_distortion(samples: &[f32], sample_rate: u32) -> KickDistortionResult {
    if samples.is_empty() || sample_rate == 0 {
        return KickDistortionResult::default();
    }
    let Ok(mut frame) = SpectralFrame::new(KICK_FFT_SIZE) else {
        return KickDistortionResult::default();
    };

    let mut sections = [
        Biquad::highpass(sample_rate, KICK_LOW_HZ, 0.707),
        Biquad::lowpass(sample_rate, KICK_HIGH_HZ, 0.707),
    ];
    let (envelope, rate) = band_envelope(samples, sample_rate, &mut sections, ENVELOPE_WINDOW_MS);
    let radius = (MIN_KICK_SPACING * rate / 2.0) as usize;
    let peaks = envelope_peaks(&envelope, radius, PEAK_THRESHOLD);
    let hop = (sample_rate as f32 / rate).round() as usize;
    log::debug!("Kick distortion: {} kicks found", peaks.len());

    let mut kicks = Vec::new();
    for &peak in peaks.iter().take(MAX_KICKS) {
        let start = peak * hop;
        let magnitudes = frame.analyze(samples, start);
        if let Some(kick) = analyse_kick(magnitudes, sample_rate) {
            kicks.push(kick);
        }
    }
    if kicks.is_empty() {
        return KickDistortionResult::default();
    }

    let n = kicks.len() as f32;
    let thd = kicks.iter().map(|k| k.thd).sum::<f32>() / n;
    let harmonic_ratio = kicks.iter().map(|k| k.harmonic_ratio).sum::<f32>() / n;
    let fundamental_hz = kicks.iter().map(|k| k.fundamental_hz).sum::<f32>() / n;

    KickDistortionResult {
        is_distorted: kick_is_distorted(thd, harmonic_ratio),
        thd,
        harmonic_ratio,
        fundamental_hz,
        kick_count: kicks.len(),
    }
}
