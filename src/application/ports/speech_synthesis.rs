//! Speech Synthesis Port - 语音合成抽象
//!
//! 定义文本转语音的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use super::AudioBuffer;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),
}

/// 语音合成请求
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    /// 要合成的文本（已完成填充/截断）
    pub text: String,
    /// 音色提示（由条目用途映射而来）
    pub voice: String,
}

/// Speech Synthesis Port
///
/// 外部 TTS 服务的抽象接口。服务可能很慢，也可能失败；
/// `Ok(None)` 表示服务正常响应但没有给出音频
#[async_trait]
pub trait SpeechSynthesisPort: Send + Sync {
    /// 合成语音，返回解码后的内存音频
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Option<AudioBuffer>, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
