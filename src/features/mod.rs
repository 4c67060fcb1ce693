//! Feature extraction modules
//!
//! - Onset functions (spectral flux, percussive energy flux)
//! - Period estimation (BPM detection)
//! - Beat tracking (dynamic programming)
//! - Chroma extraction and key detection
//! - Harmonic-percussive separation
//! - Spectral summary, timbre, MFCC and stereo metrics
//! - Pitch tracking and note quantization

pub mod beat_tracking;
pub mod chroma;
pub mod hpss;
pub mod key;
pub mod mfcc;
pub mod onset;
pub mod period;
pub mod pitch;
pub mod spectral;
pub mod stereo;
