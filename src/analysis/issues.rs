use serde::{Deserialize, Serialize};

use super::bands::BandEnergies;
use super::dynamics::Dynamics;
use super::stereo::StereoImage;

/// `lowMids` energy above this multiple of `presence` energy reads as muddy.
pub const MUDDY_RATIO: f64 = 3.0;
/// `presence` energy above this multiple of `mids` energy reads as harsh.
pub const HARSH_RATIO: f64 = 2.0;
/// Inter-channel correlation below this suggests phase cancellation.
pub const PHASE_CORRELATION_MIN: f64 = 0.2;
/// Side/mid spread above this reads as an over-wide stereo image.
pub const STEREO_WIDTH_MAX: f64 = 2.5;
/// Linear peak level treated as clipped.
pub const CLIPPING_PEAK: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct IssueThresholds {
    #[serde(default = "default_muddy_ratio")]
    pub muddy_ratio: f64,
    #[serde(default = "default_harsh_ratio")]
    pub harsh_ratio: f64,
    #[serde(default = "default_phase_correlation")]
    pub phase_correlation: f64,
    #[serde(default = "default_stereo_width")]
    pub stereo_width: f64,
    #[serde(default = "default_clipping_peak")]
    pub clipping_peak: f64,
}

impl Default for IssueThresholds {
    fn default() -> Self {
        Self {
            muddy_ratio: MUDDY_RATIO,
            harsh_ratio: HARSH_RATIO,
            phase_correlation: PHASE_CORRELATION_MIN,
            stereo_width: STEREO_WIDTH_MAX,
            clipping_peak: CLIPPING_PEAK,
        }
    }
}

fn default_muddy_ratio() -> f64 { MUDDY_RATIO }
fn default_harsh_ratio() -> f64 { HARSH_RATIO }
fn default_phase_correlation() -> f64 { PHASE_CORRELATION_MIN }
fn default_stereo_width() -> f64 { STEREO_WIDTH_MAX }
fn default_clipping_peak() -> f64 { CLIPPING_PEAK }

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueFlags {
    pub muddy: bool,
    pub harsh: bool,
    pub phase_cancellation: bool,
    pub excessive_stereo_width: bool,
    pub clipping: bool,
}

impl IssueFlags {
    /// Names of the raised flags, in report order.
    pub fn raised(&self) -> Vec<&'static str> {
        [
            ("muddy", self.muddy),
            ("harsh", self.harsh),
            ("phaseCancellation", self.phase_cancellation),
            ("excessiveStereoWidth", self.excessive_stereo_width),
            ("clipping", self.clipping),
        ]
        .into_iter()
        .filter_map(|(name, raised)| raised.then_some(name))
        .collect()
    }

    pub fn any(&self) -> bool {
        !self.raised().is_empty()
    }
}

/// Evaluates every rule independently. Bands absent from the table count as 0.
pub fn detect_issues(
    bands: &BandEnergies,
    dynamics: &Dynamics,
    stereo: &StereoImage,
    t: &IssueThresholds,
) -> IssueFlags {
    IssueFlags {
        muddy: bands.energy("lowMids") > t.muddy_ratio * bands.energy("presence"),
        harsh: bands.energy("presence") > t.harsh_ratio * bands.energy("mids"),
        phase_cancellation: stereo.correlation < t.phase_correlation,
        excessive_stereo_width: stereo.width_ratio > t.stereo_width,
        clipping: dynamics.peak_level > t.clipping_peak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::bands::BandEnergy;

    fn bands(low_mids: f64, mids: f64, presence: f64) -> BandEnergies {
        let band = |energy| BandEnergy {
            energy,
            peak_frequency_hz: 0.0,
        };
        BandEnergies::from(vec![
            ("lowMids".to_string(), band(low_mids)),
            ("mids".to_string(), band(mids)),
            ("presence".to_string(), band(presence)),
        ])
    }

    fn dynamics(peak_level: f64) -> Dynamics {
        Dynamics {
            crest_factor: 1.0,
            peak_level,
            rms_level: 0.1,
        }
    }

    fn check(b: &BandEnergies, peak: f64, stereo: StereoImage) -> IssueFlags {
        detect_issues(b, &dynamics(peak), &stereo, &IssueThresholds::default())
    }

    #[test]
    fn neutral_material_raises_nothing() {
        let flags = check(&bands(1.0, 1.0, 1.0), 0.5, StereoImage::MONO);
        assert_eq!(flags, IssueFlags::default());
        assert!(!flags.any());
    }

    #[test]
    fn muddy_boundary_is_strict() {
        assert!(!check(&bands(3.0, 1.0, 1.0), 0.5, StereoImage::MONO).muddy);
        assert!(check(&bands(3.01, 1.0, 1.0), 0.5, StereoImage::MONO).muddy);
    }

    #[test]
    fn harsh_boundary_is_strict() {
        assert!(!check(&bands(0.0, 1.0, 2.0), 0.5, StereoImage::MONO).harsh);
        assert!(check(&bands(0.0, 1.0, 2.01), 0.5, StereoImage::MONO).harsh);
    }

    #[test]
    fn clipping_threshold() {
        assert!(!check(&bands(1.0, 1.0, 1.0), 0.99, StereoImage::MONO).clipping);
        assert!(check(&bands(1.0, 1.0, 1.0), 0.991, StereoImage::MONO).clipping);
    }

    #[test]
    fn stereo_rules() {
        let wide = StereoImage {
            correlation: 0.1,
            width_ratio: 3.0,
        };
        let flags = check(&bands(1.0, 1.0, 1.0), 0.5, wide);
        assert!(flags.phase_cancellation);
        assert!(flags.excessive_stereo_width);
        assert_eq!(flags.raised(), vec!["phaseCancellation", "excessiveStereoWidth"]);

        let edge = StereoImage {
            correlation: 0.2,
            width_ratio: 2.5,
        };
        let flags = check(&bands(1.0, 1.0, 1.0), 0.5, edge);
        assert!(!flags.phase_cancellation && !flags.excessive_stereo_width);
    }

    #[test]
    fn mono_fallback_never_flags_stereo() {
        let flags = check(&bands(1.0, 1.0, 1.0), 0.5, StereoImage::MONO);
        assert!(!flags.phase_cancellation);
        assert!(!flags.excessive_stereo_width);
    }

    #[test]
    fn missing_bands_count_as_silent() {
        let flags = check(&BandEnergies::default(), 0.5, StereoImage::MONO);
        assert!(!flags.muddy && !flags.harsh);
    }

    #[test]
    fn custom_thresholds_apply() {
        let t = IssueThresholds {
            clipping_peak: 0.5,
            ..Default::default()
        };
        let flags = detect_issues(&bands(1.0, 1.0, 1.0), &dynamics(0.6), &StereoImage::MONO, &t);
        assert!(flags.clipping);
    }
}
