use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::analysis::issues::IssueThresholds;
use crate::error::AnalysisError;

/// Tunable parameters for one analysis run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    /// dB value reported for every bin of an all-silent spectrogram
    #[serde(default = "default_db_floor")]
    pub db_floor: f32,
    #[serde(default = "default_bands")]
    pub bands: Vec<FrequencyBand>,
    #[serde(default)]
    pub thresholds: IssueThresholds,
    #[serde(default)]
    pub rhythm: RhythmConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrequencyBand {
    pub name: String,
    pub low_hz: f32,
    pub high_hz: f32,
}

impl FrequencyBand {
    pub fn new(name: &str, low_hz: f32, high_hz: f32) -> Self {
        Self {
            name: name.to_string(),
            low_hz,
            high_hz,
        }
    }

    pub fn contains(&self, freq_hz: f32) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RhythmConfig {
    #[serde(default = "default_min_bpm")]
    pub min_bpm: f32,
    #[serde(default = "default_max_bpm")]
    pub max_bpm: f32,
    /// Half-width of the sliding mean used for the onset threshold, in frames
    #[serde(default = "default_onset_window")]
    pub onset_window: usize,
    #[serde(default = "default_onset_threshold_scale")]
    pub onset_threshold_scale: f32,
    #[serde(default = "default_onset_threshold_offset")]
    pub onset_threshold_offset: f32,
    #[serde(default = "default_min_onset_gap_secs")]
    pub min_onset_gap_secs: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            hop_size: default_hop_size(),
            db_floor: default_db_floor(),
            bands: default_bands(),
            thresholds: IssueThresholds::default(),
            rhythm: RhythmConfig::default(),
        }
    }
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
            onset_window: default_onset_window(),
            onset_threshold_scale: default_onset_threshold_scale(),
            onset_threshold_offset: default_onset_threshold_offset(),
            min_onset_gap_secs: default_min_onset_gap_secs(),
        }
    }
}

impl AnalysisConfig {
    /// Rejects parameter combinations the analyzers cannot work with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.window_size < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(AnalysisError::InvalidConfig(format!(
                "hop_size must be in 1..={}, got {}",
                self.window_size, self.hop_size
            )));
        }
        if self.bands.is_empty() {
            return Err(AnalysisError::InvalidConfig("band table is empty".into()));
        }
        if let Some(band) = self.bands.iter().find(|b| !(b.low_hz <= b.high_hz)) {
            return Err(AnalysisError::InvalidConfig(format!(
                "band '{}' has low bound {} above high bound {}",
                band.name, band.low_hz, band.high_hz
            )));
        }
        let rhythm = &self.rhythm;
        if !(rhythm.min_bpm > 0.0 && rhythm.min_bpm <= rhythm.max_bpm) {
            return Err(AnalysisError::InvalidConfig(format!(
                "tempo range {}..{} BPM is not valid",
                rhythm.min_bpm, rhythm.max_bpm
            )));
        }
        Ok(())
    }
}

fn default_window_size() -> usize { 2048 }
fn default_hop_size() -> usize { 512 }
fn default_db_floor() -> f32 { -120.0 }
fn default_min_bpm() -> f32 { 30.0 }
fn default_max_bpm() -> f32 { 300.0 }
fn default_onset_window() -> usize { 20 }
fn default_onset_threshold_scale() -> f32 { 1.5 }
fn default_onset_threshold_offset() -> f32 { 0.01 }
fn default_min_onset_gap_secs() -> f32 { 0.1 }

pub fn default_bands() -> Vec<FrequencyBand> {
    vec![
        FrequencyBand::new("sub", 20.0, 60.0),
        FrequencyBand::new("bass", 60.0, 250.0),
        FrequencyBand::new("lowMids", 250.0, 500.0),
        FrequencyBand::new("mids", 500.0, 2000.0),
        FrequencyBand::new("presence", 2000.0, 4000.0),
        FrequencyBand::new("highs", 4000.0, 20000.0),
    ]
}

pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// `mixscope.toml` in the working directory, then the per-user config file.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("mixscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("mixscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("mixscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
