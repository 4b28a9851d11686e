//! Asset Probe Port - 预渲染音频存在性探测

use async_trait::async_trait;
use thiserror::Error;

/// 探测错误
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Probe timeout")]
    Timeout,
}

/// Asset Probe Port
///
/// 在提交播放前确认资源可访问
#[async_trait]
pub trait AssetProbePort: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), ProbeError>;
}
