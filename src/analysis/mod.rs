//! Analysis result records and confidence aggregation
//!
//! - Result types (`AudioFeatures`, `Key`, `BeatGrid`, ...)
//! - Confidence scoring

pub mod confidence;
pub mod result;
