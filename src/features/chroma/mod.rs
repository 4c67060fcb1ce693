//! Chroma extraction
//!
//! Pitch-class distribution (12 semitones) from a Goertzel resonator bank.

pub mod extractor;

pub use extractor::extract_chroma;
