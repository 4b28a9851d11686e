//! Audio Output - 音频输出
//!
//! 播放后端把音频交给 `AudioOutput` 打开一个 `OutputSink`，
//! 之后的暂停、恢复、改速以及进度与结束都以 sink 为准：
//! - device: rodio 默认输出设备（feature `audio-output`）
//! - headless: 无设备环境，按时钟推进的虚拟 sink

use std::sync::Arc;

use crate::application::ports::{AudioBuffer, PlaybackError};

#[cfg(feature = "audio-output")]
mod device;
mod headless;

#[cfg(feature = "audio-output")]
pub use device::DeviceOutput;
pub use headless::{HeadlessOutput, HeadlessSink};

/// 待播放的音频
#[derive(Debug, Clone)]
pub enum AudioClip {
    /// 编码音频（预渲染文件、远程朗诵），由输出端解码
    Encoded {
        data: Arc<[u8]>,
        format_hint: Option<String>,
        /// 加载时测得的时长（秒）
        duration_secs: f64,
    },
    /// 合成得到的 PCM
    Pcm(AudioBuffer),
}

impl AudioClip {
    /// 预期时长（秒）
    pub fn duration_secs(&self) -> f64 {
        match self {
            AudioClip::Encoded { duration_secs, .. } => *duration_secs,
            AudioClip::Pcm(buffer) => buffer.duration_secs(),
        }
    }
}

/// 正在输出的一段音频
///
/// 位置以媒体时间计（已考虑速率），`is_finished` 表示队列已排空
pub trait OutputSink: Send + Sync {
    fn pause(&self);

    fn play(&self);

    fn is_paused(&self) -> bool;

    fn set_speed(&self, rate: f32);

    /// 当前播放位置（秒）
    fn position(&self) -> f64;

    fn is_finished(&self) -> bool;

    fn stop(&self);
}

/// 输出设备
pub trait AudioOutput: Send + Sync {
    /// 输出名称（用于日志）
    fn name(&self) -> &'static str;

    /// 以给定速率开始输出
    fn open(&self, clip: AudioClip, rate: f32) -> Result<Box<dyn OutputSink>, PlaybackError>;
}
