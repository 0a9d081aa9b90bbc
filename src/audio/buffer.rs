use std::borrow::Cow;

use crate::error::InvalidInput;

/// Decoded PCM audio, one `Vec` per channel.
///
/// Construction validates the buffer once, so every analyzer can rely on
/// 1 or 2 channels of equal, non-zero length and a positive sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, InvalidInput> {
        if sample_rate == 0 {
            return Err(InvalidInput::ZeroSampleRate);
        }
        match channels.len() {
            1 => {}
            2 => {
                let (left, right) = (channels[0].len(), channels[1].len());
                if left != right {
                    return Err(InvalidInput::ChannelLengthMismatch { left, right });
                }
            }
            n => return Err(InvalidInput::UnsupportedChannelCount(n)),
        }
        if channels[0].is_empty() {
            return Err(InvalidInput::Empty);
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self, InvalidInput> {
        Self::new(vec![samples], sample_rate)
    }

    pub fn stereo(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Result<Self, InvalidInput> {
        Self::new(vec![left, right], sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Left/right pair for two-channel buffers.
    pub fn stereo_pair(&self) -> Option<(&[f32], &[f32])> {
        match self.channels.as_slice() {
            [left, right] => Some((left, right)),
            _ => None,
        }
    }

    /// Arithmetic mean of all channels; borrows when there is only one.
    pub fn mixdown(&self) -> Cow<'_, [f32]> {
        match self.channels.as_slice() {
            [mono] => Cow::Borrowed(mono),
            channels => {
                let scale = 1.0 / channels.len() as f32;
                let mixed = (0..self.len())
                    .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
                    .collect();
                Cow::Owned(mixed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sample_rate() {
        assert_eq!(
            SampleBuffer::mono(vec![0.0; 4], 0),
            Err(InvalidInput::ZeroSampleRate)
        );
    }

    #[test]
    fn rejects_mismatched_channels() {
        assert_eq!(
            SampleBuffer::stereo(vec![0.0; 4], vec![0.0; 3], 44100),
            Err(InvalidInput::ChannelLengthMismatch { left: 4, right: 3 })
        );
    }

    #[test]
    fn rejects_unsupported_channel_counts() {
        assert_eq!(
            SampleBuffer::new(vec![vec![0.0; 4]; 3], 44100),
            Err(InvalidInput::UnsupportedChannelCount(3))
        );
        assert_eq!(
            SampleBuffer::new(Vec::new(), 44100),
            Err(InvalidInput::UnsupportedChannelCount(0))
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(SampleBuffer::mono(Vec::new(), 44100), Err(InvalidInput::Empty));
    }

    #[test]
    fn mixdown_averages_channels() {
        let buffer = SampleBuffer::stereo(vec![1.0, 0.5], vec![0.0, 0.5], 8000).unwrap();
        assert_eq!(&*buffer.mixdown(), &[0.5, 0.5]);
        assert!((buffer.duration_secs() - 2.0 / 8000.0).abs() < 1e-12);
    }
}
