//! Audio preprocessing modules
//!
//! Channel mixing (multi-channel to mono) ahead of the mono feature extractors.

pub mod channel_mixer;
