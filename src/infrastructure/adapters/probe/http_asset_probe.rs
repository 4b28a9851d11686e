//! HTTP Asset Probe - 通过 HEAD 请求确认预渲染音频存在

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::application::ports::{AssetProbePort, ProbeError};

/// HTTP 资源探测器
pub struct HttpAssetProbe {
    client: Client,
}

impl HttpAssetProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::NetworkError(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AssetProbePort for HttpAssetProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        let response = self.client.head(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout
            } else {
                ProbeError::NetworkError(e.to_string())
            }
        })?;

        match response.status() {
            status if status.is_success() => {
                tracing::trace!(url = %url, "Asset available");
                Ok(())
            }
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(ProbeError::NotFound(url.to_string())),
            status => Err(ProbeError::NetworkError(format!("HTTP {}", status))),
        }
    }
}
