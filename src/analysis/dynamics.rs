use serde::Serialize;

use crate::audio::buffer::SampleBuffer;

pub const CREST_EPS: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dynamics {
    pub crest_factor: f64,
    pub peak_level: f64,
    pub rms_level: f64,
}

impl Dynamics {
    /// Peak-to-RMS ratio in dB.
    pub fn dynamic_range_db(&self) -> f64 {
        20.0 * self.crest_factor.max(CREST_EPS).log10()
    }
}

/// Peak over every raw sample of every channel; RMS as the mean of
/// non-overlapping `frame_len` frames of the channel mixdown.
pub fn dynamics(buffer: &SampleBuffer, frame_len: usize) -> Dynamics {
    let peak_level = buffer
        .channels()
        .iter()
        .flatten()
        .map(|s| s.abs())
        .fold(0.0f32, f32::max) as f64;

    let mono = buffer.mixdown();
    let frame_rms: Vec<f64> = mono
        .chunks(frame_len.max(1))
        .map(|chunk| {
            let energy: f64 = chunk.iter().map(|&s| s as f64 * s as f64).sum();
            (energy / chunk.len() as f64).sqrt()
        })
        .collect();
    let rms_level = frame_rms.iter().sum::<f64>() / frame_rms.len().max(1) as f64;

    Dynamics {
        crest_factor: peak_level / (rms_level + CREST_EPS),
        peak_level,
        rms_level,
    }
}
