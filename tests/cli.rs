use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const SR: u32 = 44100;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mixscope"));
    cmd.current_dir(dir).env("RUST_LOG", "warn");
    cmd
}

fn write_wav(dir: &Path, name: &str, channels: &[Vec<f32>]) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate: SR,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
    for i in 0..channels[0].len() {
        for channel in channels {
            let s = (channel[i].clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(s).expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
    path
}

fn sine(freq: f32, secs: f32, amplitude: f32) -> Vec<f32> {
    (0..(secs * SR as f32) as usize)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
        .collect()
}

fn report_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout UTF-8");
    serde_json::from_str(stdout.trim()).expect("report JSON payload")
}

#[test]
fn analyzes_mono_wav() {
    let dir = TempDir::new().unwrap();
    let wav = write_wav(dir.path(), "tone.wav", &[sine(1000.0, 1.0, 0.5)]);

    let output = cli(dir.path()).arg(&wav).output().expect("run mixscope");
    let json = report_json(&output);

    assert_eq!(json["info"]["sampleRate"], SR);
    assert_eq!(json["info"]["channels"], 1);
    assert!((json["info"]["durationSeconds"].as_f64().unwrap() - 1.0).abs() < 1e-3);
    assert_eq!(json["issues"]["clipping"], false);
    assert_eq!(json["stereo"]["correlation"], 1.0);
    let peak = json["frequency"]["bands"]["mids"]["peakFrequencyHz"].as_f64().unwrap();
    assert!((peak - 1000.0).abs() <= SR as f64 / 2048.0);
    assert!(json["rhythm"]["tempoBPM"].is_number());
}

#[test]
fn flags_inverted_stereo_and_clipping() {
    let dir = TempDir::new().unwrap();
    let left = sine(200.0, 0.5, 1.0);
    let right: Vec<f32> = left.iter().map(|s| -s).collect();
    let wav = write_wav(dir.path(), "inverted.wav", &[left, right]);

    let json = report_json(&cli(dir.path()).arg(&wav).output().unwrap());
    assert_eq!(json["info"]["channels"], 2);
    assert_eq!(json["issues"]["phaseCancellation"], true);
    assert_eq!(json["issues"]["clipping"], true);
    assert!(json["stereo"]["correlation"].as_f64().unwrap() < -0.99);
}

#[test]
fn summary_format() {
    let dir = TempDir::new().unwrap();
    let wav = write_wav(dir.path(), "tone.wav", &[sine(440.0, 0.5, 0.3)]);

    let output = cli(dir.path())
        .args(["--format", "summary"])
        .arg(&wav)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("=== Analysis Summary for tone.wav ==="));
    assert!(stdout.contains("Frequency Balance:"));
}

#[test]
fn explicit_config_is_applied() {
    let dir = TempDir::new().unwrap();
    let wav = write_wav(dir.path(), "tone.wav", &[sine(440.0, 0.5, 0.6)]);
    let config = dir.path().join("strict.toml");
    std::fs::write(&config, "[thresholds]\nclipping_peak = 0.5\n").unwrap();

    let output = cli(dir.path())
        .arg("--config")
        .arg(&config)
        .arg(&wav)
        .output()
        .unwrap();
    assert_eq!(report_json(&output)["issues"]["clipping"], true);
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = cli(dir.path()).arg("does-not-exist.wav").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "stderr: {}", stderr);
}

#[test]
fn undecodable_file_fails() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("notes.wav");
    std::fs::write(&bogus, b"this is not audio").unwrap();

    let output = cli(dir.path()).arg(&bogus).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn invalid_window_fails() {
    let dir = TempDir::new().unwrap();
    let wav = write_wav(dir.path(), "tone.wav", &[sine(440.0, 0.2, 0.3)]);

    let output = cli(dir.path())
        .args(["--window-size", "1024", "--hop-size", "2048"])
        .arg(&wav)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("hop_size"));
}

#[test]
fn requires_input_argument() {
    let dir = TempDir::new().unwrap();
    let output = cli(dir.path()).output().unwrap();
    assert!(!output.status.success());
}
