//! Stereo image metrics
//!
//! Phase correlation, mid/side width, left/right balance and low-frequency
//! mono compatibility of a stereo pair.

use serde::{Deserialize, Serialize};

use crate::dsp::filter::Biquad;
use crate::signal::AudioSignal;

/// Crossover for the low-frequency correlation, in Hz
pub const LOW_FREQUENCY_CUTOFF: f32 = 150.0;

const ENERGY_EPSILON: f64 = 1e-12;

/// Stereo image of a signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoMetrics {
    /// Normalized L/R correlation in [-1, 1]; 1 = mono, -1 = phase-inverted
    pub correlation: f32,
    /// Side energy over mid + side energy, in [0, 1]
    pub width: f32,
    /// (R - L) / (R + L) energy, in [-1, 1]; positive leans right
    pub balance: f32,
    /// Correlation of the channels below 150 Hz, in [-1, 1]
    pub low_frequency_correlation: f32,
}

impl StereoMetrics {
    /// Metrics of a mono (or silent) signal
    pub const MONO: StereoMetrics = StereoMetrics {
        correlation: 1.0,
        width: 0.0,
        balance: 0.0,
        low_frequency_correlation: 1.0,
    };

    /// True when summing to mono would cancel audible bass
    pub fn has_mono_compatibility_issue(&self) -> bool {
        self.low_frequency_correlation < 0.0
    }
}

fn correlation(left: &[f32], right: &[f32]) -> Option<f32> {
    let mut lr = 0.0f64;
    let mut ll = 0.0f64;
    let mut rr = 0.0f64;
    for (&l, &r) in left.iter().zip(right) {
        lr += l as f64 * r as f64;
        ll += l as f64 * l as f64;
        rr += r as f64 * r as f64;
    }
    let denom = (ll * rr).sqrt();
    if denom <= ENERGY_EPSILON {
        return None;
    }
    Some(((lr / denom) as f32).clamp(-1.0, 1.0))
}

/// Metrics of a left/right pair
///
/// Zero total energy returns [`StereoMetrics::MONO`]; one silent channel
/// reports correlation 0.
pub fn stereo_metrics(left: &[f32], right: &[f32], sample_rate: u32) -> StereoMetrics {
    let mut ll = 0.0f64;
    let mut rr = 0.0f64;
    let mut mid = 0.0f64;
    let mut side = 0.0f64;
    for (&l, &r) in left.iter().zip(right) {
        let (l, r) = (l as f64, r as f64);
        ll += l * l;
        rr += r * r;
        let m = 0.5 * (l + r);
        let s = 0.5 * (l - r);
        mid += m * m;
        side += s * s;
    }
    if ll + rr <= ENERGY_EPSILON {
        return StereoMetrics::MONO;
    }

    let corr = correlation(left, right).unwrap_or(0.0);
    let width = if mid + side > ENERGY_EPSILON {
        (side / (mid + side)) as f32
    } else {
        0.0
    };
    let balance = ((rr - ll) / (rr + ll)) as f32;

    let low_left = Biquad::lowpass(sample_rate, LOW_FREQUENCY_CUTOFF, 0.707).apply(left);
    let low_right = Biquad::lowpass(sample_rate, LOW_FREQUENCY_CUTOFF, 0.707).apply(right);
    let low_corr = correlation(&low_left, &low_right).unwrap_or(corr);

    log::debug!(
        "Stereo metrics: corr={:.3}, width={:.3}, balance={:.3}",
        corr,
        width,
        balance
    );

    StereoMetrics {
        correlation: corr,
        width: width.clamp(0.0, 1.0),
        balance: balance.clamp(-1.0, 1.0),
        low_frequency_correlation: low_corr,
    }
}

/// Metrics of a signal; mono signals return exactly [`StereoMetrics::MONO`]
pub fn analyze_stereo(signal: &AudioSignal) -> StereoMetrics {
    match signal.stereo_pair() {
        Some((left, right)) => stereo_metrics(left, right, signal.sample_rate()),
        None => StereoMetrics::MONO,
    }
}
