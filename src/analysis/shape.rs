use serde::Serialize;

use super::transform::Spectrogram;

const FLATNESS_EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralShape {
    /// Time-averaged geometric/arithmetic mean ratio, in (0, 1]
    pub flatness: f64,
    /// Time-averaged magnitude-weighted mean frequency, Hz
    pub centroid: f64,
}

pub fn spectral_shape(spec: &Spectrogram) -> SpectralShape {
    let freqs = spec.frequencies_hz();
    let frames = spec.frames();

    let (centroid_sum, flatness_sum) = frames.iter().fold((0.0f64, 0.0f64), |(c, f), frame| {
        (c + frame_centroid(frame, freqs), f + frame_flatness(frame))
    });

    let n = frames.len().max(1) as f64;
    SpectralShape {
        flatness: flatness_sum / n,
        centroid: centroid_sum / n,
    }
}

fn frame_centroid(frame: &[f32], freqs: &[f32]) -> f64 {
    let total: f64 = frame.iter().map(|&m| m as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = frame
        .iter()
        .zip(freqs)
        .map(|(&m, &hz)| m as f64 * hz as f64)
        .sum();
    weighted / total
}

/// Silent frames count as perfectly flat.
fn frame_flatness(frame: &[f32]) -> f64 {
    let n = frame.len() as f64;
    let arithmetic = frame.iter().map(|&m| m as f64).sum::<f64>() / n;
    if arithmetic <= 0.0 {
        return 1.0;
    }
    let log_mean = frame.iter().map(|&m| (m as f64 + FLATNESS_EPS).ln()).sum::<f64>() / n;
    let geometric = log_mean.exp();
    (geometric / (arithmetic + FLATNESS_EPS)).clamp(f64::MIN_POSITIVE, 1.0)
}
