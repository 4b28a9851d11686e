//! Media Source Port - 可寻址音频加载
//!
//! 流式播放后端通过该端口按 URL 取回编码音频并获取时长

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// 媒体加载错误
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// 解码后的内存音频（交错 f32 样本）
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// 指定时长的静音
    pub fn silence(duration_secs: f64, sample_rate: u32, channels: u16) -> Self {
        let frames = (duration_secs.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// 时长（秒）
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// 已加载的媒体
#[derive(Debug, Clone)]
pub struct LoadedMedia {
    pub url: String,
    /// 编码后的音频数据，交给输出设备解码播放
    pub data: Arc<[u8]>,
    /// 解码提示（扩展名）
    pub format_hint: Option<String>,
    /// 时长（秒）
    pub duration_secs: f64,
    pub sample_rate: Option<u32>,
}

impl LoadedMedia {
    /// 编码后的字节数
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Media Source Port
#[async_trait]
pub trait MediaSourcePort: Send + Sync {
    async fn load(&self, url: &str) -> Result<LoadedMedia, MediaError>;
}
