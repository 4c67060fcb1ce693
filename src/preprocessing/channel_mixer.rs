//! Channel mixing utilities (multi-channel to mono conversion)

/// Channel mixing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelMixMode {
    /// Simple average of all channels
    #[default]
    Mono,
    /// Mid signal of the first two channels: (L + R) / 2
    MidSide,
    /// Keep the channel with the most energy
    Dominant,
}

/// Mix any number of equal-length channels down to one
///
/// A single channel is returned unchanged in every mode. `MidSide` on more
/// than two channels uses the first two.
pub fn mix_channels(channels: &[Vec<f32>], mode: ChannelMixMode) -> Vec<f32> {
    match channels {
        [] => Vec::new(),
        [only] => only.clone(),
        [left, right, ..] if mode == ChannelMixMode::MidSide => {
            left.iter().zip(right).map(|(l, r)| 0.5 * (l + r)).collect()
        }
        _ if mode == ChannelMixMode::Dominant => {
            let loudest = channels
                .iter()
                .map(|c| c.iter().map(|x| x * x).sum::<f32>())
                .enumerate()
                .fold((0, f32::MIN), |best, (i, e)| if e > best.1 { (i, e) } else { best });
            channels[loudest.0].clone()
        }
        _ => {
            let len = channels[0].len();
            let scale = 1.0 / channels.len() as f32;
            (0..len)
                .map(|i| channels.iter().map(|c| c.get(i).copied().unwrap_or(0.0)).sum::<f32>() * scale)
                .collect()
        }
    }
}

/// Convert a stereo pair to mono
pub fn stereo_to_mono(left: &[f32], right: &[f32], mode: ChannelMixMode) -> Vec<f32> {
    log::debug!("Converting stereo to mono using {:?}", mode);
    mix_channels(&[left.to_vec(), right.to_vec()], mode)
}

/// Side signal (L - R) / 2 of a stereo pair
pub fn side_signal(left: &[f32], right: &[f32]) -> Vec<f32> {
    left.iter().zip(right).map(|(l, r)| 0.5 * (l - r)).collect()
}
