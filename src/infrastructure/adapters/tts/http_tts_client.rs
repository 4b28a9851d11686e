//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 SpeechSynthesisPort trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! POST http://localhost:8000/api/tts/infer
//! Request: {"text": "...", "voice": "narrator"}  (JSON)
//! Response: audio/wav binary（空响应体表示没有音频），metadata in headers

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{AudioBuffer, SpeechSynthesisPort, SynthesisRequest, TtsError};
use crate::infrastructure::adapters::audio::decode_audio;

/// TTS 推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    /// 要合成的文本
    text: &'a str,
    /// 音色标识
    voice: &'a str,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取推理 URL
    fn infer_url(&self) -> String {
        format!("{}/api/tts/infer", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesisPort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Option<AudioBuffer>, TtsError> {
        let http_request = TtsHttpRequest {
            text: &request.text,
            voice: &request.voice,
        };

        tracing::debug!(
            url = %self.infer_url(),
            text_len = request.text.len(),
            voice = %request.voice,
            "Sending TTS infer request"
        );

        let response = self
            .client
            .post(self.infer_url())
            .json(&http_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TtsError::VoiceNotFound(request.voice));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let session_id = response
            .headers()
            .get("X-TTS-Session-Id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        if audio_data.is_empty() {
            tracing::info!(session_id = %session_id, "TTS service returned no audio");
            return Ok(None);
        }

        let buffer = decode_audio(&audio_data, Some("wav"))
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            session_id = %session_id,
            duration_secs = buffer.duration_secs(),
            sample_rate = buffer.sample_rate,
            audio_size = audio_data.len(),
            "TTS inference completed"
        );

        Ok(Some(buffer))
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
