//! 应用层错误定义
//!
//! 装配/配置阶段的错误；播放过程中的失败不会以错误形式返回给调用方

use thiserror::Error;

use crate::application::ports::{MediaError, PlaybackError, ProbeError, TtsError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 外部服务（TTS、资源服务器）客户端无法建立
    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        Self::ExternalServiceError(format!("speech synthesis: {}", err))
    }
}

impl From<ProbeError> for ApplicationError {
    fn from(err: ProbeError) -> Self {
        Self::ExternalServiceError(format!("asset probe: {}", err))
    }
}

impl From<MediaError> for ApplicationError {
    fn from(err: MediaError) -> Self {
        Self::ExternalServiceError(format!("media source: {}", err))
    }
}

impl From<PlaybackError> for ApplicationError {
    fn from(err: PlaybackError) -> Self {
        Self::ExternalServiceError(format!("audio output: {}", err))
    }
}
