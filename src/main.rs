mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, OutputFormat};
use mixscope::config::{self, AnalysisConfig};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut analysis_config = resolve_config(cli)?;
    if let Some(window_size) = cli.window_size {
        analysis_config.window_size = window_size;
    }
    if let Some(hop_size) = cli.hop_size {
        analysis_config.hop_size = hop_size;
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("Input: {}", cli.input.display());
    log::info!(
        "Window: {} samples, hop: {} samples",
        analysis_config.window_size,
        analysis_config.hop_size
    );

    let report = mixscope::analyze_file(&cli.input, &analysis_config)
        .with_context(|| format!("Failed to analyze {}", cli.input.display()))?;

    let output = match cli.format {
        OutputFormat::Json => report.to_json(cli.pretty).context("Failed to serialize report")?,
        OutputFormat::Summary => {
            let title = cli
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| cli.input.display().to_string());
            mixscope::report::summary::render(&report, &title)
        }
    };
    println!("{}", output.trim_end());

    Ok(())
}

/// Explicit `--config` must load; an auto-detected file only warns on failure.
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig> {
    if let Some(ref path) = cli.config {
        let cfg = config::load_config(path)?;
        log::info!("Loaded config from {}", path.display());
        return Ok(cfg);
    }

    if let Some(path) = config::find_config() {
        match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                return Ok(cfg);
            }
            Err(err) => log::warn!("Ignoring config {}: {:#}", path.display(), err),
        }
    }

    Ok(AnalysisConfig::default())
}
