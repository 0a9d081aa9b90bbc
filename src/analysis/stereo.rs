use serde::Serialize;

use crate::audio::buffer::SampleBuffer;

pub const WIDTH_EPS: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StereoImage {
    /// Pearson correlation of left and right, in [-1, 1]
    pub correlation: f64,
    /// std(L - R) / std(L + R)
    pub width_ratio: f64,
}

impl StereoImage {
    /// Value reported for single-channel input.
    pub const MONO: StereoImage = StereoImage {
        correlation: 1.0,
        width_ratio: 1.0,
    };
}

pub fn stereo_image(buffer: &SampleBuffer) -> StereoImage {
    match buffer.stereo_pair() {
        Some((left, right)) => analyze_pair(left, right),
        None => StereoImage::MONO,
    }
}

fn analyze_pair(left: &[f32], right: &[f32]) -> StereoImage {
    let n = left.len().min(right.len()) as f64;
    if n == 0.0 {
        return StereoImage::MONO;
    }

    let mean_l = left.iter().map(|&s| s as f64).sum::<f64>() / n;
    let mean_r = right.iter().map(|&s| s as f64).sum::<f64>() / n;
    let mean_side = mean_l - mean_r;
    let mean_mid = mean_l + mean_r;

    let (mut var_l, mut var_r, mut cov) = (0.0f64, 0.0f64, 0.0f64);
    let (mut var_side, mut var_mid) = (0.0f64, 0.0f64);
    for (&l, &r) in left.iter().zip(right) {
        let (l, r) = (l as f64, r as f64);
        let (dl, dr) = (l - mean_l, r - mean_r);
        var_l += dl * dl;
        var_r += dr * dr;
        cov += dl * dr;
        let side = l - r - mean_side;
        let mid = l + r - mean_mid;
        var_side += side * side;
        var_mid += mid * mid;
    }

    let correlation = if var_l > 0.0 && var_r > 0.0 {
        (cov / (var_l.sqrt() * var_r.sqrt())).clamp(-1.0, 1.0)
    } else {
        1.0
    };

    let std_side = (var_side / n).sqrt();
    let std_mid = (var_mid / n).sqrt();

    StereoImage {
        correlation,
        width_ratio: std_side / (std_mid + WIDTH_EPS),
    }
}
