//! Feature extraction and issue detection.
//!
//! The analyzers run as a three-stage fork-join graph:
//!
//! ```text
//! stage 1:  transform(mixdown) | dynamics(buffer) | stereo(buffer)
//! stage 2:  bands(spec)        | shape(spec)      | rhythm(spec)
//! stage 3:  issues(bands, dynamics, stereo)
//! ```
//!
//! Every analyzer reads shared inputs by reference and owns its output, so
//! the branches of a stage need no synchronization beyond `rayon::join`.

pub mod bands;
pub mod dynamics;
pub mod issues;
pub mod rhythm;
pub mod shape;
pub mod stereo;
pub mod transform;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::audio::buffer::SampleBuffer;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};

use bands::BandEnergies;
use dynamics::Dynamics;
use issues::IssueFlags;
use rhythm::Rhythm;
use shape::SpectralShape;
use stereo::StereoImage;

/// Shared flag checked between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            log::info!("Analysis cancelled before {}", stage);
            return Err(AnalysisError::Cancelled { stage });
        }
        Ok(())
    }
}

/// Everything the analyzers measured for one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    pub bands: BandEnergies,
    pub shape: SpectralShape,
    pub dynamics: Dynamics,
    pub stereo: StereoImage,
    pub rhythm: Rhythm,
    pub issues: IssueFlags,
}

pub fn extract_features(
    buffer: &SampleBuffer,
    config: &AnalysisConfig,
    cancel: &CancelFlag,
) -> Result<Features> {
    config.validate()?;
    cancel.check("transform")?;

    let mono = buffer.mixdown();
    let (spectrogram, (dynamics, stereo)) = rayon::join(
        || {
            transform::stft(
                &mono,
                buffer.sample_rate(),
                config.window_size,
                config.hop_size,
                config.db_floor,
            )
        },
        || {
            rayon::join(
                || dynamics::dynamics(buffer, config.window_size),
                || stereo::stereo_image(buffer),
            )
        },
    );

    log::debug!(
        "Spectrogram: {} frames x {} bins, mean level {:.1} dB",
        spectrogram.num_frames(),
        spectrogram.num_bins(),
        spectrogram.mean_db()
    );

    cancel.check("spectral analysis")?;

    let duration = buffer.duration_secs();
    let (bands, (shape, rhythm)) = rayon::join(
        || bands::band_energies(&spectrogram, &config.bands),
        || {
            rayon::join(
                || shape::spectral_shape(&spectrogram),
                || rhythm::rhythm(&spectrogram, duration, &config.rhythm),
            )
        },
    );

    for (name, band) in bands.iter() {
        log::debug!(
            "Band {:<10} energy={:.4} peak={:.0}Hz",
            name,
            band.energy,
            band.peak_frequency_hz
        );
    }

    cancel.check("issue detection")?;

    let issues = issues::detect_issues(&bands, &dynamics, &stereo, &config.thresholds);

    Ok(Features {
        bands,
        shape,
        dynamics,
        stereo,
        rhythm,
        issues,
    })
}
