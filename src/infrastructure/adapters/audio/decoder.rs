//! Audio Decoder - 基于 symphonia 的音频解码
//!
//! 支持：
//! - 编码音频（WAV / MP3）→ 交错 f32 PCM
//! - 仅测量时长（优先读取容器元数据，缺失时逐包计数）

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioBuffer, MediaError};

/// 时长测量结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

struct OpenedMedia {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track: Track,
}

fn open(data: &[u8], extension: Option<&str>) -> Result<OpenedMedia, MediaError> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| MediaError::DecodingError(format!("Probe failed: {}", e)))?;

    let format = probed.format;
    let track = format
        .default_track()
        .cloned()
        .ok_or_else(|| MediaError::DecodingError("No audio track found".to_string()))?;

    let decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| MediaError::DecodingError(format!("Decoder creation failed: {}", e)))?;

    Ok(OpenedMedia {
        format,
        decoder,
        track,
    })
}

/// 逐包解码，对每个解码结果调用 `on_packet`
fn for_each_packet<F>(media: &mut OpenedMedia, mut on_packet: F) -> Result<(), MediaError>
where
    F: FnMut(symphonia::core::audio::AudioBufferRef<'_>),
{
    let track_id = media.track.id;
    loop {
        let packet = match media.format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(MediaError::DecodingError(format!(
                    "Packet read error: {}",
                    e
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match media.decoder.decode(&packet) {
            Ok(decoded) => on_packet(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "Decode error (skipping packet)");
            }
        }
    }
    Ok(())
}

/// 解码为内存音频
pub fn decode_audio(data: &[u8], extension: Option<&str>) -> Result<AudioBuffer, MediaError> {
    let mut media = open(data, extension)?;

    let mut sample_rate = media.track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = media
        .track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);
    let mut samples: Vec<f32> = Vec::new();

    for_each_packet(&mut media, |decoded| {
        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    })?;

    if sample_rate == 0 || channels == 0 {
        return Err(MediaError::DecodingError(
            "Unknown sample rate or channel count".to_string(),
        ));
    }

    tracing::trace!(
        samples = samples.len(),
        sample_rate = sample_rate,
        channels = channels,
        "Audio decoded"
    );

    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

/// 测量时长
pub fn measure_duration(data: &[u8], extension: Option<&str>) -> Result<MediaInfo, MediaError> {
    let mut media = open(data, extension)?;
    let params = media.track.codec_params.clone();

    let channels = params.channels.map(|c| c.count() as u16).unwrap_or(1);
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| MediaError::DecodingError("Unknown sample rate".to_string()))?;

    // 容器声明了帧数时直接换算
    if let Some(n_frames) = params.n_frames {
        return Ok(MediaInfo {
            duration_secs: n_frames as f64 / sample_rate as f64,
            sample_rate,
            channels,
        });
    }

    let mut frames: u64 = 0;
    for_each_packet(&mut media, |decoded| {
        frames += decoded.frames() as u64;
    })?;

    Ok(MediaInfo {
        duration_secs: frames as f64 / sample_rate as f64,
        sample_rate,
        channels,
    })
}
