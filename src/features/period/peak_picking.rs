//! Peak detection utilities
//!
//! Local-maximum search over 1D signals, used on autocorrelation functions
//! and on detector envelopes.

/// Interior local maxima of `signal` whose index lies in `lo..=hi`
///
/// A point is a maximum when it is strictly greater than its left neighbour
/// and not smaller than its right one, so plateaus report their first sample.
/// Indices without both neighbours are never reported. Result is in index order.
pub fn local_maxima(signal: &[f32], lo: usize, hi: usize) -> Vec<(usize, f32)> {
    if signal.len() < 3 {
        return Vec::new();
    }
    let start = lo.max(1);
    let end = hi.min(signal.len() - 2);
    if start > end {
        return Vec::new();
    }
    (start..=end)
        .filter(|&i| signal[i] > signal[i - 1] && signal[i] >= signal[i + 1])
        .map(|i| (i, signal[i]))
        .collect()
}

/// Sub-sample offset of a peak from three samples around it, in [-0.5, 0.5]
///
/// Fits a parabola through `(-1, left)`, `(0, centre)`, `(1, right)`.
#[inline]
pub fn parabolic_offset(left: f32, centre: f32, right: f32) -> f32 {
    let denom = left - 2.0 * centre + right;
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_maxima_range() {
        let signal = vec![0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        assert_eq!(local_maxima(&signal, 0, 10).len(), 3);
        assert_eq!(local_maxima(&signal, 2, 4), vec![(3, 2.0)]);
        assert!(local_maxima(&[1.0, 2.0], 0, 1).is_empty());
    }

    #[test]
    fn test_parabolic_offset() {
        assert_eq!(parabolic_offset(1.0, 2.0, 1.0), 0.0);
        assert!(parabolic_offset(1.0, 2.0, 1.5) > 0.0);
        assert_eq!(parabolic_offset(1.0, 1.0, 1.0), 0.0);
    }
}
