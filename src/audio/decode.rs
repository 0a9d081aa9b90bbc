use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::SampleBuffer;

/// Decodes the first audio track of `path`, keeping channels separate.
///
/// Material with more than two channels is folded to stereo: even-indexed
/// channels average into left, odd-indexed into right.
pub fn decode_audio(path: &Path) -> Result<SampleBuffer> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let declared_channels = track.codec_params.channels.map(|c| c.count());
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    // Sized on the first decoded packet.
    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut source_channels = 0usize;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(err)) => {
                log::debug!("Skipping undecodable packet: {}", err);
                skipped_packets += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        let packet_channels = spec.channels.count().max(1);

        if channels.is_empty() {
            source_channels = declared_channels.unwrap_or(packet_channels);
            channels = vec![Vec::new(); output_channels(declared_channels, packet_channels)];
        }

        let mut sample_buf = InterleavedBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        fold_into(&mut channels, sample_buf.samples(), packet_channels);
    }

    if skipped_packets > 0 {
        log::warn!("Skipped {} undecodable packets", skipped_packets);
    }
    if source_channels > 2 {
        log::info!("Folded {} channels down to stereo", source_channels);
    }
    if channels.first().map_or(true, |c| c.is_empty()) {
        anyhow::bail!("No audio samples decoded from {}", path.display());
    }

    log::info!(
        "Decoded audio: {} samples x {} channel(s), {}Hz, {:.1}s",
        channels[0].len(),
        channels.len(),
        sample_rate,
        channels[0].len() as f32 / sample_rate as f32
    );

    SampleBuffer::new(channels, sample_rate)
        .with_context(|| format!("Decoder produced an unusable buffer for {}", path.display()))
}

/// Channels kept for the analysis buffer: the track's declared count when
/// present, else the first packet's, capped at stereo.
fn output_channels(declared: Option<usize>, packet_channels: usize) -> usize {
    declared.unwrap_or(packet_channels).clamp(1, 2)
}

/// Appends interleaved frames with `source_channels` channels onto `channels`.
fn fold_into(channels: &mut [Vec<f32>], interleaved: &[f32], source_channels: usize) {
    let targets = channels.len();
    for frame in interleaved.chunks_exact(source_channels) {
        if source_channels == targets {
            for (ch, &s) in frame.iter().enumerate() {
                channels[ch].push(s);
            }
            continue;
        }
        for (target, out) in channels.iter_mut().enumerate() {
            let (sum, count) = frame
                .iter()
                .enumerate()
                .filter(|(ch, _)| targets == 1 || ch % targets == target)
                .fold((0.0f32, 0usize), |(sum, n), (_, &s)| (sum + s, n + 1));
            out.push(if count == 0 { 0.0 } else { sum / count as f32 });
        }
    }
}
