use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

/// Short-time magnitude spectrum of one channel.
///
/// Stored frame-major: `magnitudes[frame][bin]`, `bins = window_size / 2 + 1`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub sample_rate: u32,
    pub window_size: usize,
    pub hop_size: usize,
    /// Samples in the analyzed signal, before tail padding
    pub signal_len: usize,
    magnitudes: Vec<Vec<f32>>,
    db: Vec<Vec<f32>>,
    frequencies_hz: Vec<f32>,
}

impl Spectrogram {
    pub fn num_frames(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn num_bins(&self) -> usize {
        self.frequencies_hz.len()
    }

    pub fn frames(&self) -> &[Vec<f32>] {
        &self.magnitudes
    }

    /// Decibels relative to the loudest bin of the whole spectrogram.
    pub fn db(&self, bin: usize, frame: usize) -> f32 {
        self.db[frame][bin]
    }

    /// Whether `frame` reaches past the end of the signal into zero padding.
    pub fn is_padded(&self, frame: usize) -> bool {
        frame * self.hop_size + self.window_size > self.signal_len
    }

    pub fn frequencies_hz(&self) -> &[f32] {
        &self.frequencies_hz
    }

    /// Width of one frequency bin in Hz.
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate as f32 / self.window_size as f32
    }

    /// Seconds between consecutive frames.
    pub fn frame_period_secs(&self) -> f32 {
        self.hop_size as f32 / self.sample_rate as f32
    }

    pub fn mean_db(&self) -> f32 {
        let count = self.num_frames() * self.num_bins();
        let sum: f64 = self.db.iter().flatten().map(|&v| v as f64).sum();
        (sum / count as f64) as f32
    }
}

/// Hann-windowed STFT with hop `hop_size`.
///
/// Frames start at sample 0; the last frame is zero-padded, so a buffer
/// shorter than the window still yields exactly one frame.
pub fn stft(
    samples: &[f32],
    sample_rate: u32,
    window_size: usize,
    hop_size: usize,
    db_floor: f32,
) -> Spectrogram {
    let num_frames = frame_count(samples.len(), window_size, hop_size);
    let num_bins = window_size / 2 + 1;
    let hann = hann_window(window_size);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(window_size);

    let magnitudes: Vec<Vec<f32>> = (0..num_frames)
        .into_par_iter()
        .map(|frame_idx| {
            let start = frame_idx * hop_size;
            let end = (start + window_size).min(samples.len());

            let mut buffer = vec![Complex::new(0.0f32, 0.0); window_size];
            for (i, &s) in samples[start..end].iter().enumerate() {
                buffer[i] = Complex::new(s * hann[i], 0.0);
            }
            fft.process(&mut buffer);

            buffer[..num_bins].iter().map(|c| c.norm()).collect()
        })
        .collect();

    let db = amplitude_to_db(&magnitudes, db_floor);

    let bin_width = sample_rate as f32 / window_size as f32;
    let frequencies_hz = (0..num_bins).map(|k| k as f32 * bin_width).collect();

    Spectrogram {
        sample_rate,
        window_size,
        hop_size,
        signal_len: samples.len(),
        magnitudes,
        db,
        frequencies_hz,
    }
}

fn frame_count(len: usize, window_size: usize, hop_size: usize) -> usize {
    if len <= window_size {
        1
    } else {
        1 + (len - window_size).div_ceil(hop_size)
    }
}

/// `20·log10(m / max)`, floored. All-zero input maps every bin to the floor.
fn amplitude_to_db(magnitudes: &[Vec<f32>], floor: f32) -> Vec<Vec<f32>> {
    let reference = magnitudes.iter().flatten().copied().fold(0.0f32, f32::max);
    magnitudes
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|&m| {
                    if reference > 0.0 && m > 0.0 {
                        (20.0 * (m / reference).log10()).max(floor)
                    } else {
                        floor
                    }
                })
                .collect()
        })
        .collect()
}

/// Periodic Hann window.
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn frame_count_covers_buffer() {
        assert_eq!(frame_count(1, 2048, 512), 1);
        assert_eq!(frame_count(2048, 2048, 512), 1);
        assert_eq!(frame_count(2049, 2048, 512), 2);
        assert_eq!(frame_count(2048 + 1024, 2048, 512), 3);
    }

    #[test]
    fn short_buffer_yields_one_frame() {
        let spec = stft(&[0.5; 100], 44100, 2048, 512, -120.0);
        assert_eq!(spec.num_frames(), 1);
        assert_eq!(spec.num_bins(), 1025);
    }

    #[test]
    fn only_tail_frames_are_padded() {
        let spec = stft(&[0.1; 4096], 44100, 2048, 512, -120.0);
        assert_eq!(spec.num_frames(), 5);
        assert!(!spec.is_padded(0));
        assert!(!spec.is_padded(4));

        let spec = stft(&[0.1; 4000], 44100, 2048, 512, -120.0);
        assert!(!spec.is_padded(3));
        assert!(spec.is_padded(4));
    }

    #[test]
    fn bin_frequencies() {
        let spec = stft(&[0.0; 10], 48000, 1024, 256, -120.0);
        assert_eq!(spec.frequencies_hz()[0], 0.0);
        assert!((spec.frequencies_hz()[1] - 46.875).abs() < 1e-4);
        assert!((spec.frequencies_hz()[512] - 24000.0).abs() < 1e-2);
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let sr = 44100;
        let spec = stft(&sine(1000.0, sr, 8192), sr, 2048, 512, -120.0);
        let frame = &spec.frames()[2];
        let (peak_bin, _) = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        let peak_hz = spec.frequencies_hz()[peak_bin];
        assert!((peak_hz - 1000.0).abs() <= spec.bin_width_hz());
    }

    #[test]
    fn silence_db_is_floor() {
        let spec = stft(&[0.0; 4096], 44100, 2048, 512, -120.0);
        for frame in 0..spec.num_frames() {
            for bin in 0..spec.num_bins() {
                assert_eq!(spec.db(bin, frame), -120.0);
            }
        }
        assert_eq!(spec.mean_db(), -120.0);
    }

    #[test]
    fn db_reference_is_global_max() {
        let sr = 44100;
        let spec = stft(&sine(440.0, sr, 8192), sr, 2048, 512, -120.0);
        let max_db = (0..spec.num_frames())
            .flat_map(|f| (0..spec.num_bins()).map(move |b| (b, f)))
            .map(|(b, f)| spec.db(b, f))
            .fold(f32::MIN, f32::max);
        assert!(max_db.abs() < 1e-5);
        assert!(spec.mean_db().is_finite());
    }
}
