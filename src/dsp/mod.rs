//! Spectral and filtering primitives shared by every feature extractor

pub mod bands;
pub mod fft;
pub mod filter;
pub mod window;

pub use bands::{compute_band_energies, BandAccumulator, Dominance, SpectralBand};
pub use fft::{fft, ifft};
pub use filter::Biquad;
pub use window::{hann_window, FrameIterator, SpectralFrame};
