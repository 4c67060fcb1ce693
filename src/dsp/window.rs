//! Framing and windowing
//!
//! Slices a mono channel into overlapping Hann-windowed frames at a fixed hop.
//! `SpectralFrame` owns the FFT scratch buffers so that a whole pass over a
//! track performs no per-frame heap allocation.

use std::f32::consts::PI;

use super::fft::{fft_in_place, magnitudes_into};
use crate::error::AnalysisError;

/// Periodic Hann window of `size` points
///
/// The periodic form (denominator `size`, not `size - 1`) sums to a constant
/// under overlap-add at hops of `size / 4`, which the HPSS resynthesis relies on.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size == 0 {
        return Vec::new();
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Number of complete frames of `frame_size` at `hop_size` that fit in `len` samples
pub fn frame_count(len: usize, frame_size: usize, hop_size: usize) -> usize {
    if frame_size == 0 || hop_size == 0 || len < frame_size {
        return 0;
    }
    (len - frame_size) / hop_size + 1
}

/// Evenly spaced subset of `0..total` with at most `max` entries
///
/// Returns every index when `total <= max`.
pub fn sampled_frame_indices(total: usize, max: usize) -> Vec<usize> {
    if total == 0 || max == 0 {
        return Vec::new();
    }
    if total <= max {
        return (0..total).collect();
    }
    let step = total as f64 / max as f64;
    (0..max).map(|i| ((i as f64 * step) as usize).min(total - 1)).collect()
}

/// Iterator over frame start offsets
///
/// # Example
///
/// ```
/// use sonic_dsp::dsp::window::FrameIterator;
///
/// let starts: Vec<usize> = FrameIterator::new(4096, 1024, 512).collect();
/// assert_eq!(starts, vec![0, 512, 1024, 1536, 2048, 2560, 3072]);
/// ```
#[derive(Debug, Clone)]
pub struct FrameIterator {
    hop_size: usize,
    next: usize,
    total: usize,
}

impl FrameIterator {
    /// Frames over a buffer of `len` samples
    pub fn new(len: usize, frame_size: usize, hop_size: usize) -> Self {
        Self {
            hop_size,
            next: 0,
            total: frame_count(len, frame_size, hop_size),
        }
    }

    /// Total number of frames this iterator yields
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for FrameIterator {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.total {
            return None;
        }
        let start = self.next * self.hop_size;
        self.next += 1;
        Some(start)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

/// Pre-allocated spectral frame: window, FFT buffers and magnitudes
#[derive(Debug, Clone)]
pub struct SpectralFrame {
    window: Vec<f32>,
    real: Vec<f32>,
    imag: Vec<f32>,
    magnitudes: Vec<f32>,
}

impl SpectralFrame {
    /// Allocate buffers for `frame_size`-point transforms
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidInput` if `frame_size` is not a power of two.
    pub fn new(frame_size: usize) -> Result<Self, AnalysisError> {
        if frame_size < 2 || !frame_size.is_power_of_two() {
            return Err(AnalysisError::InvalidInput(format!(
                "Frame size must be a power of two >= 2, got {}",
                frame_size
            )));
        }
        Ok(Self {
            window: hann_window(frame_size),
            real: vec![0.0; frame_size],
            imag: vec![0.0; frame_size],
            magnitudes: vec![0.0; frame_size / 2 + 1],
        })
    }

    /// Frame size in samples
    pub fn frame_size(&self) -> usize {
        self.real.len()
    }

    /// Number of magnitude bins (`N/2 + 1`)
    pub fn bins(&self) -> usize {
        self.magnitudes.len()
    }

    /// Analysis window
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Copy `samples[start..start + N]` through the window into the FFT buffers,
    /// zero-padding past the end of `samples`
    pub fn load(&mut self, samples: &[f32], start: usize) {
        let n = self.real.len();
        let available = samples.len().saturating_sub(start).min(n);
        for i in 0..available {
            self.real[i] = samples[start + i] * self.window[i];
        }
        for v in self.real[available..].iter_mut() {
            *v = 0.0;
        }
        self.imag.fill(0.0);
    }

    /// Transform the loaded frame and return normalized magnitudes (`N/2 + 1` bins)
    pub fn transform(&mut self) -> &[f32] {
        fft_in_place(&mut self.real, &mut self.imag);
        magnitudes_into(&self.real, &self.imag, &mut self.magnitudes);
        &self.magnitudes
    }

    /// `load` followed by `transform`
    pub fn analyze(&mut self, samples: &[f32], start: usize) -> &[f32] {
        self.load(samples, start);
        self.transform()
    }

    /// Real part of the last transform
    pub fn real(&self) -> &[f32] {
        &self.real
    }

    /// Imaginary part of the last transform
    pub fn imag(&self) -> &[f32] {
        &self.imag
    }

    /// Magnitudes of the last transform
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_endpoints() {
        let w = hann_window(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!(hann_window(0).is_empty());
    }

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(1000, 1024, 512), 0);
        assert_eq!(frame_count(1024, 1024, 512), 1);
        assert_eq!(frame_count(2048, 1024, 512), 3);
        assert_eq!(frame_count(2048, 0, 512), 0);
    }

    #[test]
    fn test_sampled_indices_cap() {
        let idx = sampled_frame_indices(1000, 180);
        assert_eq!(idx.len(), 180);
        assert_eq!(idx[0], 0);
        assert!(idx.windows(2).all(|w| w[1] > w[0]));
        assert!(*idx.last().unwrap() < 1000);

        assert_eq!(sampled_frame_indices(5, 180), vec![0, 1, 2, 3, 4]);
        assert!(sampled_frame_indices(0, 10).is_empty());
    }

    #[test]
    fn test_spectral_frame_zero_pads() {
        let mut frame = SpectralFrame::new(64).unwrap();
        let samples = vec![1.0f32; 10];
        let mags = frame.analyze(&samples, 0);
        assert_eq!(mags.len(), 33);
        assert!(mags.iter().all(|m| m.is_finite()));

        // Past the end of the buffer: all zeros
        let mags = frame.analyze(&samples, 100);
        assert!(mags.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_spectral_frame_rejects_bad_size() {
        assert!(SpectralFrame::new(100).is_err());
    }
}
