use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mixscope",
    about = "Spectral, dynamics, stereo and rhythm diagnostics for audio files"
)]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Indent JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Analysis config file (TOML). Defaults to ./mixscope.toml or the user config dir.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// STFT window size in samples
    #[arg(long)]
    pub window_size: Option<usize>,

    /// STFT hop size in samples
    #[arg(long)]
    pub hop_size: Option<usize>,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Summary,
}
