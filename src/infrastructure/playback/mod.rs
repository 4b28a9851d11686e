//! Playback Backends - 播放后端
//!
//! - streaming: URL 寻址音频（预渲染文件、远程朗诵）
//! - buffered: 合成得到的内存音频
//!
//! 两者都把音频交给 `output::AudioOutput`，由 sink 决定进度与结束。

mod buffered;
mod monitor;
pub mod output;
mod streaming;

pub use buffered::BufferedPlayback;
#[cfg(feature = "audio-output")]
pub use output::DeviceOutput;
pub use output::{AudioOutput, HeadlessOutput};
pub use streaming::StreamingPlayback;
