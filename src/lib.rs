//! Objective mix diagnostics for decoded audio.
//!
//! `mixscope` turns a [`SampleBuffer`] into an [`AnalysisReport`]: per-band
//! spectral energy, spectral shape, dynamics, stereo image and rhythm, plus
//! heuristic flags for common production issues (muddiness, harshness,
//! phase cancellation, excessive width, clipping).
//!
//! ```no_run
//! use mixscope::{analyze, AnalysisConfig, SampleBuffer};
//!
//! let samples: Vec<f32> = vec![0.0; 44100];
//! let buffer = SampleBuffer::mono(samples, 44100)?;
//! let report = analyze(&buffer, &AnalysisConfig::default())?;
//! println!("{}", report.to_json(true)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod report;

use std::path::Path;

pub use analysis::{CancelFlag, Features};
pub use audio::buffer::SampleBuffer;
pub use config::{AnalysisConfig, FrequencyBand};
pub use error::{AnalysisError, InvalidInput};
pub use report::AnalysisReport;

/// Runs the full pipeline over `buffer`.
pub fn analyze(buffer: &SampleBuffer, config: &AnalysisConfig) -> error::Result<AnalysisReport> {
    analyze_with_cancel(buffer, config, &CancelFlag::new())
}

/// Like [`analyze`], but stops between stages once `cancel` is set.
pub fn analyze_with_cancel(
    buffer: &SampleBuffer,
    config: &AnalysisConfig,
    cancel: &CancelFlag,
) -> error::Result<AnalysisReport> {
    let features = analysis::extract_features(buffer, config, cancel)?;
    let report = AnalysisReport::assemble(buffer, features);

    log::info!(
        "Analysis: {:.1}s, peak={:.3}, rms={:.3}, tempo={:.1} BPM, issues={:?}",
        report.info.duration_seconds,
        report.dynamics.peak_level,
        report.dynamics.rms_level,
        report.rhythm.tempo_bpm,
        report.issues.raised()
    );

    Ok(report)
}

/// Decodes `path` and analyzes it.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> anyhow::Result<AnalysisReport> {
    let buffer = audio::decode::decode_audio(path)?;
    Ok(analyze(&buffer, config)?)
}
