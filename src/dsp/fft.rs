//! In-place radix-2 FFT
//!
//! Iterative Cooley-Tukey: bit-reversal permutation followed by
//! Danielson-Lanczos butterflies. The transform never allocates; callers own
//! the real/imaginary buffers and reuse them across frames.
//!
//! The inverse transform is the forward one applied to the conjugated input,
//! with the output conjugated again and scaled by `1/N`.
//!
//! # Example
//!
//! ```
//! use sonic_dsp::dsp::fft::{fft, magnitude};
//!
//! let n = 64;
//! let mut re: Vec<f32> = (0..n)
//!     .map(|i| (2.0 * std::f32::consts::PI * 4.0 * i as f32 / n as f32).sin())
//!     .collect();
//! let mut im = vec![0.0f32; n];
//! fft(&mut re, &mut im)?;
//!
//! // A full-scale sine lands at ~1.0 in its bin
//! assert!((magnitude(&re, &im, 4) - 1.0).abs() < 1e-3);
//! # Ok::<(), sonic_dsp::AnalysisError>(())
//! ```

use std::f32::consts::PI;

use crate::error::AnalysisError;

fn check_buffers(real: &[f32], imag: &[f32]) -> Result<usize, AnalysisError> {
    let n = real.len();
    if n != imag.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "FFT buffer length mismatch: real={}, imag={}",
            n,
            imag.len()
        )));
    }
    if n == 0 || !n.is_power_of_two() {
        return Err(AnalysisError::InvalidInput(format!(
            "FFT size must be a non-zero power of two, got {}",
            n
        )));
    }
    Ok(n)
}

/// Forward FFT in place
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if the buffers differ in length or the
/// length is not a power of two.
pub fn fft(real: &mut [f32], imag: &mut [f32]) -> Result<(), AnalysisError> {
    check_buffers(real, imag)?;
    fft_in_place(real, imag);
    Ok(())
}

/// Forward FFT on buffers already known to be equal-length powers of two
pub(crate) fn fft_in_place(real: &mut [f32], imag: &mut [f32]) {
    let n = real.len();
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            real.swap(i, j);
            imag.swap(i, j);
        }
    }

    // Butterflies
    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f32;
        let (w_im, w_re) = angle.sin_cos();
        let half = len / 2;
        let mut start = 0;
        while start < n {
            let mut cur_re = 1.0f32;
            let mut cur_im = 0.0f32;
            for k in 0..half {
                let a = start + k;
                let b = a + half;
                let t_re = real[b] * cur_re - imag[b] * cur_im;
                let t_im = real[b] * cur_im + imag[b] * cur_re;
                real[b] = real[a] - t_re;
                imag[b] = imag[a] - t_im;
                real[a] += t_re;
                imag[a] += t_im;

                let next_re = cur_re * w_re - cur_im * w_im;
                cur_im = cur_re * w_im + cur_im * w_re;
                cur_re = next_re;
            }
            start += len;
        }
        len <<= 1;
    }
}

/// Inverse FFT in place (conjugate trick), scaled by `1/N`
pub fn ifft(real: &mut [f32], imag: &mut [f32]) -> Result<(), AnalysisError> {
    check_buffers(real, imag)?;
    ifft_in_place(real, imag);
    Ok(())
}

pub(crate) fn ifft_in_place(real: &mut [f32], imag: &mut [f32]) {
    let n = real.len();
    for v in imag.iter_mut() {
        *v = -*v;
    }
    fft_in_place(real, imag);

    let scale = 1.0 / n.max(1) as f32;
    for (re, im) in real.iter_mut().zip(imag.iter_mut()) {
        *re *= scale;
        *im = -*im * scale;
    }
}

/// Magnitude of bin `k`, normalized by `N/2`
#[inline]
pub fn magnitude(real: &[f32], imag: &[f32], k: usize) -> f32 {
    let half = (real.len() / 2).max(1) as f32;
    real[k].hypot(imag[k]) / half
}

/// Write normalized magnitudes of bins `0..=N/2` into `out`
///
/// `out` must hold at least `N/2 + 1` values; extra entries are left untouched.
pub fn magnitudes_into(real: &[f32], imag: &[f32], out: &mut [f32]) {
    let bins = (real.len() / 2 + 1).min(out.len());
    for (k, slot) in out.iter_mut().enumerate().take(bins) {
        *slot = magnitude(real, imag, k);
    }
}

/// Centre frequency of bin `k` for an `fft_size`-point transform
#[inline]
pub fn bin_frequency(k: usize, fft_size: usize, sample_rate: u32) -> f32 {
    k as f32 * sample_rate as f32 / fft_size as f32
}

/// Nearest bin index for `freq_hz`, clamped to `0..=fft_size/2`
#[inline]
pub fn frequency_bin(freq_hz: f32, fft_size: usize, sample_rate: u32) -> usize {
    if sample_rate == 0 {
        return 0;
    }
    let bin = (freq_hz.max(0.0) * fft_size as f32 / sample_rate as f32).round() as usize;
    bin.min(fft_size / 2)
}
