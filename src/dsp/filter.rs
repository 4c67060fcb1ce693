//! Biquad filters and block envelopes
//!
//! RBJ cookbook second-order sections in transposed direct form II, used by the
//! specialized detectors to isolate sub-bass and kick regions before envelope
//! following.

use std::f32::consts::PI;

/// Second-order IIR section
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    fn from_normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn omega(sample_rate: u32, cutoff_hz: f32) -> (f32, f32) {
        let nyquist = sample_rate as f32 / 2.0;
        let fc = cutoff_hz.clamp(1.0, nyquist * 0.99);
        let w0 = 2.0 * PI * fc / sample_rate.max(1) as f32;
        w0.sin_cos()
    }

    /// Low-pass with quality `q` (0.707 for Butterworth)
    pub fn lowpass(sample_rate: u32, cutoff_hz: f32, q: f32) -> Self {
        let (sin, cos) = Self::omega(sample_rate, cutoff_hz);
        let alpha = sin / (2.0 * q.max(1e-3));
        Self::from_normalized(
            (1.0 - cos) / 2.0,
            1.0 - cos,
            (1.0 - cos) / 2.0,
            1.0 + alpha,
            -2.0 * cos,
            1.0 - alpha,
        )
    }

    /// High-pass with quality `q`
    pub fn highpass(sample_rate: u32, cutoff_hz: f32, q: f32) -> Self {
        let (sin, cos) = Self::omega(sample_rate, cutoff_hz);
        let alpha = sin / (2.0 * q.max(1e-3));
        Self::from_normalized(
            (1.0 + cos) / 2.0,
            -(1.0 + cos),
            (1.0 + cos) / 2.0,
            1.0 + alpha,
            -2.0 * cos,
            1.0 - alpha,
        )
    }

    /// Filter one sample
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    /// Filter a whole buffer into a new vector
    pub fn apply(&mut self, samples: &[f32]) -> Vec<f32> {
        samples.iter().map(|&x| self.process(x)).collect()
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Run `samples` through a cascade of sections
pub fn filter_cascade(samples: &[f32], sections: &mut [Biquad]) -> Vec<f32> {
    let mut out = samples.to_vec();
    for section in sections.iter_mut() {
        for v in out.iter_mut() {
            *v = section.process(*v);
        }
    }
    out
}

/// RMS of consecutive non-overlapping blocks of `block_size` samples
///
/// A trailing partial block is included.
pub fn block_rms(samples: &[f32], block_size: usize) -> Vec<f32> {
    if block_size == 0 {
        return Vec::new();
    }
    samples
        .chunks(block_size)
        .map(|block| {
            let energy: f32 = block.iter().map(|x| x * x).sum();
            (energy / block.len() as f32).sqrt()
        })
        .collect()
}

/// Block size giving an envelope rate of roughly `rate_hz`
pub fn envelope_block_size(sample_rate: u32, rate_hz: f32) -> usize {
    ((sample_rate as f32 / rate_hz.max(1.0)).round() as usize).max(1)
}

/// Linear level to dB with a floor
#[inline]
pub fn amplitude_to_db(level: f32, floor_db: f32) -> f32 {
    if level > 0.0 {
        (20.0 * level.log10()).max(floor_db)
    } else {
        floor_db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sr: u32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sr as f32).sin())
            .collect()
    }

    fn rms(x: &[f32]) -> f32 {
        (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt()
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let sr = 44100;
        let low = Biquad::lowpass(sr, 120.0, 0.707).apply(&sine(60.0, sr, 44100));
        let high = Biquad::lowpass(sr, 120.0, 0.707).apply(&sine(4000.0, sr, 44100));
        assert!(rms(&low[4410..]) > 0.6);
        assert!(rms(&high[4410..]) < 0.01);
    }

    #[test]
    fn test_highpass_attenuates_lows() {
        let sr = 44100;
        let out = Biquad::highpass(sr, 1000.0, 0.707).apply(&sine(50.0, sr, 44100));
        assert!(rms(&out[4410..]) < 0.01);
    }

    #[test]
    fn test_block_rms() {
        let env = block_rms(&[1.0, -1.0, 1.0, -1.0, 0.5], 2);
        assert_eq!(env.len(), 3);
        assert!((env[0] - 1.0).abs() < 1e-6);
        assert!((env[2] - 0.5).abs() < 1e-6);
        assert!(block_rms(&[1.0], 0).is_empty());
    }

    #[test]
    fn test_envelope_block_size() {
        assert_eq!(envelope_block_size(44100, 1000.0), 44);
        assert_eq!(envelope_block_size(100, 1000.0), 1);
    }
}
