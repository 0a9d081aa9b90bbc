use serde::Serialize;

use super::transform::Spectrogram;
use crate::config::RhythmConfig;

const DURATION_EPS: f64 = 1e-8;
const FALLBACK_BPM: f32 = 120.0;
/// Fraction of the mean frame magnitude sum below which flux is ignored.
const FLUX_FLOOR_RATIO: f32 = 0.05;
/// A lag at `best / k` replaces the best lag when it scores at least this
/// fraction of the best score.
const HARMONIC_TOLERANCE: f32 = 0.75;
const MAX_HARMONIC: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rhythm {
    #[serde(rename = "tempoBPM")]
    pub tempo_bpm: f64,
    /// Detected onsets per second
    pub transient_density: f64,
}

pub fn rhythm(spec: &Spectrogram, duration_secs: f64, config: &RhythmConfig) -> Rhythm {
    let envelope = onset_envelope(spec);
    let frame_period = spec.frame_period_secs();

    let onsets = detect_onsets(&envelope, frame_period, config);
    let tempo_bpm = estimate_tempo(&envelope, frame_period, config);

    log::debug!(
        "Rhythm: {} envelope frames, {} onsets, tempo={:.1} BPM",
        envelope.len(),
        onsets.len(),
        tempo_bpm
    );

    Rhythm {
        tempo_bpm: tempo_bpm as f64,
        transient_density: onsets.len() as f64 / duration_secs.max(DURATION_EPS),
    }
}

/// Half-wave rectified spectral flux, scaled so its maximum is 1.
///
/// Flux at or below `FLUX_FLOOR_RATIO` of the mean per-frame magnitude sum
/// is zeroed first, so stationary material yields no envelope. The first
/// frame has no predecessor and is 0, and zero-padded tail frames are 0 so
/// the cut at the end of the signal never reads as an onset.
pub fn onset_envelope(spec: &Spectrogram) -> Vec<f32> {
    let frames = spec.frames();
    let mean_frame_sum = frames.iter().map(|f| f.iter().sum::<f32>()).sum::<f32>()
        / frames.len().max(1) as f32;
    let floor = FLUX_FLOOR_RATIO * mean_frame_sum;

    let mut envelope = vec![0.0f32; frames.len()];
    for i in 1..frames.len() {
        if spec.is_padded(i) {
            continue;
        }
        let flux: f32 = frames[i]
            .iter()
            .zip(frames[i - 1].iter())
            .map(|(cur, prev)| (cur - prev).max(0.0))
            .sum();
        if flux > floor {
            envelope[i] = flux;
        }
    }

    let peak = envelope.iter().copied().fold(0.0f32, f32::max);
    if peak > 0.0 {
        for v in &mut envelope {
            *v /= peak;
        }
    }
    envelope
}

/// Frame indices of local envelope peaks above an adaptive threshold.
pub fn detect_onsets(envelope: &[f32], frame_period: f32, config: &RhythmConfig) -> Vec<usize> {
    let mut onsets: Vec<usize> = Vec::new();
    let window = config.onset_window;

    for i in 0..envelope.len() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(envelope.len());
        let local_mean = envelope[start..end].iter().sum::<f32>() / (end - start) as f32;
        let threshold = local_mean * config.onset_threshold_scale + config.onset_threshold_offset;

        if envelope[i] <= threshold {
            continue;
        }

        let is_peak = (i == 0 || envelope[i] >= envelope[i - 1])
            && (i == envelope.len() - 1 || envelope[i] >= envelope[i + 1]);

        let far_enough = onsets
            .last()
            .map_or(true, |&last| (i - last) as f32 * frame_period > config.min_onset_gap_secs);

        if is_peak && far_enough {
            onsets.push(i);
        }
    }

    onsets
}

/// Autocorrelation tempo over lags spanning `min_bpm..=max_bpm`.
///
/// The envelope is max-filtered by one frame on each side first, so a beat
/// whose period falls between two hops still lines up with its neighbours.
/// Among the best lag and its integer fractions, the shortest lag scoring
/// within `HARMONIC_TOLERANCE` of the best wins.
///
/// Falls back to 120 BPM when the envelope is flat or too short to hold a
/// single candidate period; the result is always inside the configured range.
pub fn estimate_tempo(envelope: &[f32], frame_period: f32, config: &RhythmConfig) -> f32 {
    let clamp = |bpm: f32| bpm.clamp(config.min_bpm, config.max_bpm);
    let frames_per_minute = 60.0 / frame_period;

    let min_lag = ((frames_per_minute / config.max_bpm).ceil() as usize).max(1);
    let max_lag = ((frames_per_minute / config.min_bpm).floor() as usize)
        .min(envelope.len().saturating_sub(1));
    if min_lag > max_lag {
        return clamp(FALLBACK_BPM);
    }

    let smoothed = max_filter(envelope, 1);
    let mean = smoothed.iter().sum::<f32>() / smoothed.len() as f32;
    let centered: Vec<f32> = smoothed.iter().map(|v| v - mean).collect();
    if centered.iter().all(|v| v.abs() < f32::EPSILON) {
        return clamp(FALLBACK_BPM);
    }

    let autocorr = |lag: usize| -> f32 {
        centered[lag..]
            .iter()
            .zip(&centered)
            .map(|(a, b)| a * b)
            .sum()
    };

    let scores: Vec<f32> = (min_lag..=max_lag).map(autocorr).collect();
    let mut best = 0usize;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = i;
        }
    }
    if scores[best] <= 0.0 {
        return clamp(FALLBACK_BPM);
    }

    let chosen = shortest_harmonic(&scores, min_lag, best);

    // Parabolic refinement between neighbouring lags.
    let mut lag = (min_lag + chosen) as f32;
    if chosen > 0 && chosen + 1 < scores.len() {
        let (a, b, c) = (scores[chosen - 1], scores[chosen], scores[chosen + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() > f32::EPSILON {
            lag += (0.5 * (a - c) / denom).clamp(-0.5, 0.5);
        }
    }

    clamp(frames_per_minute / lag)
}

/// Index into `scores` of the shortest lag `best_lag / k` (k = MAX_HARMONIC..2)
/// that scores within tolerance of `best`; `best` itself otherwise.
fn shortest_harmonic(scores: &[f32], min_lag: usize, best: usize) -> usize {
    let best_lag = (min_lag + best) as f32;
    let threshold = HARMONIC_TOLERANCE * scores[best];

    for k in (2..=MAX_HARMONIC).rev() {
        let target = best_lag / k as f32;
        let lo = ((target.floor() as usize).saturating_sub(1)).max(min_lag);
        let hi = (target.ceil() as usize + 1).min(min_lag + scores.len() - 1);
        if lo > hi {
            continue;
        }
        let candidate = (lo..=hi)
            .map(|lag| lag - min_lag)
            .max_by(|&a, &b| scores[a].total_cmp(&scores[b]));
        if let Some(idx) = candidate {
            if scores[idx] >= threshold {
                return idx;
            }
        }
    }
    best
}

/// Running maximum over `i - radius..=i + radius`.
fn max_filter(values: &[f32], radius: usize) -> Vec<f32> {
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(radius);
            let end = (i + radius + 1).min(values.len());
            values[start..end].iter().copied().fold(0.0f32, f32::max)
        })
        .collect()
}
