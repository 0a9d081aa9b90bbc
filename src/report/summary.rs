use std::fmt;

use super::AnalysisReport;

/// Linear amplitude to dBFS, floored at -120 dB for silence.
fn to_db(level: f64) -> f64 {
    if level > 0.0 {
        (20.0 * level.log10()).max(-120.0)
    } else {
        -120.0
    }
}

/// Human-readable report for terminal output.
pub fn render(report: &AnalysisReport, title: &str) -> String {
    Summary { report, title }.to_string()
}

pub struct Summary<'a> {
    pub report: &'a AnalysisReport,
    pub title: &'a str,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Summary { report, title } = *self;
        writeln!(out, "=== Analysis Summary for {} ===", title)?;

        let info = &report.info;
        writeln!(out, "\nFormat:")?;
        writeln!(out, "- Sample Rate: {} Hz", info.sample_rate)?;
        writeln!(out, "- Duration: {:.2} seconds", info.duration_seconds)?;
        writeln!(out, "- Channels: {}", info.channels)?;

        let dynamics = &report.dynamics;
        writeln!(out, "\nDynamics:")?;
        writeln!(out, "- Peak Level: {:.1} dB", to_db(dynamics.peak_level))?;
        writeln!(out, "- RMS Level: {:.1} dB", to_db(dynamics.rms_level))?;
        writeln!(out, "- Dynamic Range: {:.1} dB", dynamics.dynamic_range_db())?;
        writeln!(out, "- Clipping: {}", if report.issues.clipping { "Yes" } else { "No" })?;

        writeln!(out, "\nFrequency Balance:")?;
        for (name, band) in report.frequency.bands.iter() {
            writeln!(
                out,
                "- {}: Energy = {:.3}, Peak = {:.0} Hz",
                name, band.energy, band.peak_frequency_hz
            )?;
        }
        let shape = &report.frequency.spectral_features;
        writeln!(out, "- Spectral Centroid: {:.0} Hz", shape.centroid)?;
        writeln!(out, "- Spectral Flatness: {:.3}", shape.flatness)?;

        writeln!(out, "\nStereo:")?;
        writeln!(out, "- Correlation: {:.2}", report.stereo.correlation)?;
        writeln!(out, "- Width Ratio: {:.2}", report.stereo.width_ratio)?;

        writeln!(out, "\nIssues Detected:")?;
        let raised = report.issues.raised();
        if raised.is_empty() {
            writeln!(out, "- none")?;
        }
        for issue in raised {
            writeln!(out, "- {}", issue)?;
        }

        writeln!(out, "\nMusical Characteristics:")?;
        writeln!(out, "- Tempo: {:.0} BPM", report.rhythm.tempo_bpm)?;
        writeln!(out, "- Transient Density: {:.3}", report.rhythm.transient_density)?;
        Ok(())
    }
}
