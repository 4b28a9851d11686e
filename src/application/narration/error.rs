//! Narration Errors - 非致命播放错误分类
//!
//! 这些错误只会写入 `NarrationState.error`，不会返回给调用方

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NarrationError {
    /// 预渲染音频缺失（可由原文合成替代）
    #[error("Narration audio not found: {url}")]
    AssetNotFound { url: String },

    /// 语音合成服务无结果或失败
    #[error("Speech synthesis unavailable: {0}")]
    SynthesisUnavailable(String),

    /// 播放后端报告失败
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

impl NarrationError {
    pub fn asset_not_found(url: impl Into<String>) -> Self {
        Self::AssetNotFound { url: url.into() }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::SynthesisUnavailable(message.into())
    }

    pub fn playback(message: impl Into<String>) -> Self {
        Self::PlaybackFailed(message.into())
    }
}
