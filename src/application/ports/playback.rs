//! Playback Port - 播放后端抽象
//!
//! 流式（URL）与缓冲（内存音频）两种后端实现同一接口，
//! 状态机按 `accepts` 选择后端，不直接区分后端类型

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::AudioBuffer;

/// 播放错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Failed to load media: {0}")]
    LoadFailed(String),

    #[error("Unsupported source for {backend} backend")]
    UnsupportedSource { backend: &'static str },

    #[error("Playback superseded by a newer request")]
    Superseded,

    #[error("Audio output error: {0}")]
    Output(String),
}

/// 播放票据
///
/// 每次启动播放都携带一个票据，后端发出的事件带回该票据，
/// 状态机据此丢弃已释放资源的迟到事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackTicket(pub u64);

impl std::fmt::Display for PlaybackTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 播放来源
#[derive(Debug, Clone)]
pub enum PlaybackSource {
    /// URL 寻址的音频（预渲染文件、远程朗诵）
    Stream { url: String },
    /// 合成得到的内存音频
    Buffer(AudioBuffer),
}

impl PlaybackSource {
    pub fn describe(&self) -> String {
        match self {
            PlaybackSource::Stream { url } => url.clone(),
            PlaybackSource::Buffer(buffer) => format!("buffer({:.2}s)", buffer.duration_secs()),
        }
    }
}

/// 后端事件
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEventKind {
    /// 已开始播放（加载完成）
    Started { duration: f64 },
    /// 进度更新（秒）
    Progress { current_time: f64, duration: f64 },
    /// 自然结束
    Ended,
    /// 播放中途失败
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    pub ticket: PlaybackTicket,
    pub kind: PlaybackEventKind,
}

impl PlaybackEvent {
    pub fn new(ticket: PlaybackTicket, kind: PlaybackEventKind) -> Self {
        Self { ticket, kind }
    }
}

pub type PlaybackEventSender = mpsc::UnboundedSender<PlaybackEvent>;
pub type PlaybackEventReceiver = mpsc::UnboundedReceiver<PlaybackEvent>;

/// Playback Port
///
/// 每个后端同一时刻最多持有一个资源；`start` 会先释放旧资源
#[async_trait]
pub trait PlaybackPort: Send + Sync {
    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;

    /// 是否能播放该来源
    fn accepts(&self, source: &PlaybackSource) -> bool;

    /// 开始播放
    ///
    /// 加载完成后发出 `Started`，之后周期性发出 `Progress`，最终 `Ended` 或 `Error`
    async fn start(
        &self,
        ticket: PlaybackTicket,
        source: PlaybackSource,
        rate: f32,
        events: PlaybackEventSender,
    ) -> Result<(), PlaybackError>;

    /// 暂停，返回是否有资源被暂停
    fn pause(&self) -> bool;

    /// 恢复，返回是否有资源被恢复
    fn resume(&self) -> bool;

    /// 释放当前资源
    fn stop(&self);

    /// 调整当前资源的播放速率
    fn set_rate(&self, rate: f32);

    /// 当前是否在出声
    fn is_playing(&self) -> bool;
}
