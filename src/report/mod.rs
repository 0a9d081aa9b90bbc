pub mod summary;

use serde::Serialize;

use crate::analysis::bands::BandEnergies;
use crate::analysis::dynamics::Dynamics;
use crate::analysis::issues::IssueFlags;
use crate::analysis::rhythm::Rhythm;
use crate::analysis::shape::SpectralShape;
use crate::analysis::stereo::StereoImage;
use crate::analysis::Features;
use crate::audio::buffer::SampleBuffer;

/// Final result of one analysis run. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub issues: IssueFlags,
    pub frequency: FrequencyReport,
    pub dynamics: Dynamics,
    pub stereo: StereoImage,
    pub rhythm: Rhythm,
    pub info: InputInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyReport {
    pub bands: BandEnergies,
    pub spectral_features: SpectralShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputInfo {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: usize,
}

impl AnalysisReport {
    pub fn assemble(buffer: &SampleBuffer, features: Features) -> Self {
        let Features {
            bands,
            shape,
            dynamics,
            stereo,
            rhythm,
            issues,
        } = features;

        Self {
            issues,
            frequency: FrequencyReport {
                bands,
                spectral_features: shape,
            },
            dynamics,
            stereo,
            rhythm,
            info: InputInfo {
                duration_seconds: buffer.duration_secs(),
                sample_rate: buffer.sample_rate(),
                channels: buffer.channel_count(),
            },
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
