//! Krumhansl-Kessler key templates
//!
//! Probe-tone profiles for the tonic of C, rotated to all 24 keys.
//!
//! # Reference
//!
//! Krumhansl, C. L., & Kessler, E. J. (1982). Tracing the Dynamic Changes in Perceived
//! Tonal Organization in a Spatial Representation of Musical Keys. *Psychological Review*,
//! 89(4), 334-368.

/// C major probe-tone profile
pub const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// C minor probe-tone profile
pub const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Key templates for all 24 keys
#[derive(Debug, Clone)]
pub struct KeyTemplates {
    /// Major key templates (C, C#, D, ..., B)
    pub major: [[f32; 12]; 12],

    /// Minor key templates (C, C#, D, ..., B)
    pub minor: [[f32; 12]; 12],
}

fn rotate(profile: &[f32; 12], root: usize) -> [f32; 12] {
    let mut out = [0.0f32; 12];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = profile[(i + 12 - root) % 12];
    }
    out
}

impl KeyTemplates {
    /// Templates with the Krumhansl-Kessler profiles
    pub fn new() -> Self {
        let mut major = [[0.0f32; 12]; 12];
        let mut minor = [[0.0f32; 12]; 12];
        for root in 0..12 {
            major[root] = rotate(&MAJOR_PROFILE, root);
            minor[root] = rotate(&MINOR_PROFILE, root);
        }
        Self { major, minor }
    }

    /// Template of the major key on `root` (0 = C)
    pub fn get_major_template(&self, root: u32) -> &[f32; 12] {
        &self.major[root as usize % 12]
    }

    /// Template of the minor key on `root` (0 = C)
    pub fn get_minor_template(&self, root: u32) -> &[f32; 12] {
        &self.minor[root as usize % 12]
    }
}

impl Default for KeyTemplates {
    fn default() -> Self {
        Self::new()
    }
}
