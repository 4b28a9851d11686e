//! Fake TTS Client - 不依赖外部服务的 TTS 客户端
//!
//! 按文本长度生成静音音频，用于本地运行与测试

use async_trait::async_trait;
use std::time::Duration;

use crate::application::ports::{AudioBuffer, SpeechSynthesisPort, SynthesisRequest, TtsError};

/// Fake TTS 的响应方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FakeTtsMode {
    /// 返回静音音频
    #[default]
    Silence,
    /// 正常响应但没有音频
    NoAudio,
    /// 服务不可用
    Unavailable,
}

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    pub mode: FakeTtsMode,
    /// 每个字符对应的音频时长（秒）
    pub secs_per_char: f64,
    /// 采样率
    pub sample_rate: u32,
    /// 模拟推理延迟
    pub latency: Duration,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            mode: FakeTtsMode::Silence,
            secs_per_char: 0.06,
            sample_rate: 8000,
            latency: Duration::from_millis(200),
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            mode = ?config.mode,
            sample_rate = config.sample_rate,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }
}

#[async_trait]
impl SpeechSynthesisPort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Option<AudioBuffer>, TtsError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice = %request.voice,
            "FakeTtsClient: synthesizing silence"
        );

        // 模拟推理延迟
        tokio::time::sleep(self.config.latency).await;

        match self.config.mode {
            FakeTtsMode::Silence => {
                let secs = request.text.chars().count() as f64 * self.config.secs_per_char;
                Ok(Some(AudioBuffer::silence(secs, self.config.sample_rate, 1)))
            }
            FakeTtsMode::NoAudio => Ok(None),
            FakeTtsMode::Unavailable => Err(TtsError::ServiceError(
                "fake service unavailable".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> bool {
        self.config.mode != FakeTtsMode::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            voice: "narrator".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_scales_with_text() {
        let client = FakeTtsClient::with_defaults();
        let buffer = client.synthesize(request("0123456789")).await.unwrap().unwrap();

        assert_eq!(buffer.sample_rate, 8000);
        assert!((buffer.duration_secs() - 0.6).abs() < 1e-3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_modes() {
        let no_audio = FakeTtsClient::new(FakeTtsClientConfig {
            mode: FakeTtsMode::NoAudio,
            ..Default::default()
        });
        assert!(no_audio.synthesize(request("text")).await.unwrap().is_none());

        let unavailable = FakeTtsClient::new(FakeTtsClientConfig {
            mode: FakeTtsMode::Unavailable,
            ..Default::default()
        });
        assert!(unavailable.synthesize(request("text")).await.is_err());
        assert!(!unavailable.health_check().await);
    }
}
