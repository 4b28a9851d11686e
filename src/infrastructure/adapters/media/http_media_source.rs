//! HTTP Media Source - 下载可寻址音频并测量时长
//!
//! 下载的字节原样保留，由播放输出解码

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{LoadedMedia, MediaError, MediaSourcePort};
use crate::infrastructure::adapters::audio::measure_duration;

/// 从 URL 路径推断扩展名，作为解码提示
pub fn extension_hint(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// HTTP 媒体源
pub struct HttpMediaSource {
    client: Client,
}

impl HttpMediaSource {
    pub fn new(timeout: Duration) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::NetworkError(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl MediaSourcePort for HttpMediaSource {
    async fn load(&self, url: &str) -> Result<LoadedMedia, MediaError> {
        tracing::debug!(url = %url, "Loading media");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MediaError::Timeout
            } else {
                MediaError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MediaError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(MediaError::NetworkError(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::NetworkError(format!("Failed to read body: {}", e)))?;
        let data: Arc<[u8]> = Arc::from(bytes.as_ref());

        let format_hint = extension_hint(url);
        let info = {
            let data = data.clone();
            let hint = format_hint.clone();
            tokio::task::spawn_blocking(move || measure_duration(&data, hint.as_deref()))
                .await
                .map_err(|e| MediaError::DecodingError(e.to_string()))??
        };

        tracing::debug!(
            url = %url,
            duration_secs = info.duration_secs,
            size_bytes = data.len(),
            "Media loaded"
        );

        Ok(LoadedMedia {
            url: url.to_string(),
            data,
            format_hint,
            duration_secs: info.duration_secs,
            sample_rate: Some(info.sample_rate),
        })
    }
}
