use thiserror::Error;

/// Which input constraint a [`SampleBuffer`](crate::SampleBuffer) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("unsupported channel count {0} (expected 1 or 2)")]
    UnsupportedChannelCount(usize),
    #[error("channel lengths differ (left {left}, right {right})")]
    ChannelLengthMismatch { left: usize, right: usize },
    #[error("buffer contains no samples")]
    Empty,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("analysis cancelled before {stage}")]
    Cancelled { stage: &'static str },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
