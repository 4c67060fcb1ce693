//! Spectral flux onset function
//!
//! Half-wave-rectified frame-to-frame magnitude increase:
//! `SF[n] = Σ_k max(0, |X_n[k]| - |X_{n-1}[k]|)`.
//!
//! # Reference
//!
//! Bello, J. P., et al. (2005). A Tutorial on Onset Detection in Music Signals.
//! *IEEE Transactions on Speech and Audio Processing*, 13(5), 1035-1047.

/// Flux between two magnitude spectra of equal length
///
/// Extra bins of the longer slice are ignored.
///
/// # Example
///
/// ```
/// use sonic_dsp::features::onset::spectral_flux::spectral_flux;
///
/// let prev = [0.2, 0.5, 0.1];
/// let cur = [0.4, 0.3, 0.1];
/// assert!((spectral_flux(&prev, &cur) - 0.2).abs() < 1e-6);
/// ```
#[inline]
pub fn spectral_flux(previous: &[f32], current: &[f32]) -> f32 {
    previous
        .iter()
        .zip(current)
        .map(|(&p, &c)| (c - p).max(0.0))
        .sum()
}
