//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::application::narration::{EngineConfig, ResolverConfig, VoiceMap};
use crate::application::ApplicationError;
use crate::domain::reciter::ReciterCatalog;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 语音合成配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 预渲染音频配置
    #[serde(default)]
    pub assets: AssetsConfig,

    /// 远程朗诵配置
    #[serde(default)]
    pub recitation: RecitationConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 转换为引擎配置
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            transition_delay: Duration::from_millis(self.playback.transition_delay_ms),
            default_speed: self.playback.default_speed,
            recitation_base_url: self.recitation.base_url.clone(),
            assets_base_url: self.assets.base_url.clone(),
            prebaked_template: self.assets.prebaked_template.clone(),
            resolver: self.synthesis.resolver_config(),
        }
    }

    /// 以配置的默认朗诵者构建目录
    pub fn reciter_catalog(&self) -> Result<ReciterCatalog, ApplicationError> {
        ReciterCatalog::default()
            .with_default(&self.recitation.default_reciter)
            .ok_or_else(|| ApplicationError::not_found("Reciter", &self.recitation.default_reciter))
    }
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 每次调用前的固定延迟（毫秒）
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// 最短文本（字符），不足时追加 filler
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,

    /// 最长文本（字符），超出时截断
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_filler")]
    pub filler: String,

    #[serde(default)]
    pub voices: VoicesConfig,

    /// 使用本地静音合成代替 TTS 服务
    #[serde(default)]
    pub offline: bool,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    30
}

fn default_delay_ms() -> u64 {
    300
}

fn default_min_chars() -> usize {
    20
}

fn default_max_chars() -> usize {
    4500
}

fn default_filler() -> String {
    " Let us reflect on this.".to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            delay_ms: default_delay_ms(),
            min_chars: default_min_chars(),
            max_chars: default_max_chars(),
            filler: default_filler(),
            voices: VoicesConfig::default(),
            offline: false,
        }
    }
}

impl SynthesisConfig {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            synthesis_delay: Duration::from_millis(self.delay_ms),
            min_chars: self.min_chars,
            max_chars: self.max_chars,
            filler: self.filler.clone(),
            voices: VoiceMap {
                narrator: self.voices.narrator.clone(),
                translation: self.voices.translation.clone(),
                hadith: self.voices.hadith.clone(),
            },
        }
    }
}

/// 各用途音色
#[derive(Debug, Clone, Deserialize)]
pub struct VoicesConfig {
    #[serde(default = "default_narrator_voice")]
    pub narrator: String,

    #[serde(default = "default_translation_voice")]
    pub translation: String,

    #[serde(default = "default_hadith_voice")]
    pub hadith: String,
}

fn default_narrator_voice() -> String {
    "narrator".to_string()
}

fn default_translation_voice() -> String {
    "translation".to_string()
}

fn default_hadith_voice() -> String {
    "hadith".to_string()
}

impl Default for VoicesConfig {
    fn default() -> Self {
        Self {
            narrator: default_narrator_voice(),
            translation: default_translation_voice(),
            hadith: default_hadith_voice(),
        }
    }
}

/// 预渲染音频配置
#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// 静态资源基础 URL
    #[serde(default = "default_assets_url")]
    pub base_url: String,

    /// 路径模板，含 `{story_id}` 与 `{section_id}`
    #[serde(default = "default_prebaked_template")]
    pub prebaked_template: String,

    /// 存在性探测超时（秒）
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_assets_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_prebaked_template() -> String {
    "/assets/adult/audio/{story_id}-{section_id}.mp3".to_string()
}

fn default_probe_timeout() -> u64 {
    10
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_url: default_assets_url(),
            prebaked_template: default_prebaked_template(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

/// 远程朗诵配置
#[derive(Debug, Clone, Deserialize)]
pub struct RecitationConfig {
    #[serde(default = "default_recitation_url")]
    pub base_url: String,

    /// 默认朗诵者标识
    #[serde(default = "default_reciter")]
    pub default_reciter: String,
}

fn default_recitation_url() -> String {
    "https://cdn.islamic.network/quran/audio".to_string()
}

fn default_reciter() -> String {
    "ar.alafasy".to_string()
}

impl Default for RecitationConfig {
    fn default() -> Self {
        Self {
            base_url: default_recitation_url(),
            default_reciter: default_reciter(),
        }
    }
}

/// 音频输出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// 系统默认音频设备
    #[default]
    Device,
    /// 不出声，按时钟推进
    Headless,
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputKind::Device => write!(f, "device"),
            OutputKind::Headless => write!(f, "headless"),
        }
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 音频输出
    #[serde(default)]
    pub output: OutputKind,

    /// 自然结束后的过渡延迟（毫秒）
    #[serde(default = "default_transition_delay")]
    pub transition_delay_ms: u64,

    #[serde(default = "default_speed")]
    pub default_speed: f32,

    /// 流式后端进度 tick（毫秒）
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,

    /// 缓冲后端帧间隔（毫秒）
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// 流式后端加载超时（秒）
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
}

fn default_transition_delay() -> u64 {
    500
}

fn default_speed() -> f32 {
    1.0
}

fn default_progress_interval() -> u64 {
    250
}

fn default_frame_interval() -> u64 {
    16
}

fn default_load_timeout() -> u64 {
    60
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            output: OutputKind::default(),
            transition_delay_ms: default_transition_delay(),
            default_speed: default_speed(),
            progress_interval_ms: default_progress_interval(),
            frame_interval_ms: default_frame_interval(),
            load_timeout_secs: default_load_timeout(),
        }
    }
}

impl PlaybackConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.synthesis.url, "http://localhost:8000");
        assert_eq!(config.recitation.default_reciter, "ar.alafasy");
        assert_eq!(config.playback.transition_delay_ms, 500);
        assert_eq!(config.playback.output, OutputKind::Device);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_engine_config() {
        let config = AppConfig::default();
        let engine = config.engine_config();

        assert_eq!(engine.transition_delay, Duration::from_millis(500));
        assert_eq!(engine.resolver.synthesis_delay, Duration::from_millis(300));
        assert_eq!(engine.resolver.min_chars, 20);
        assert_eq!(engine.resolver.max_chars, 4500);
        assert_eq!(engine.resolver.voices, VoiceMap::default());
        assert_eq!(
            engine.prebaked_template,
            "/assets/adult/audio/{story_id}-{section_id}.mp3"
        );
    }

    #[test]
    fn test_reciter_catalog() {
        let mut config = AppConfig::default();
        config.recitation.default_reciter = "ar.husary".to_string();
        let catalog = config.reciter_catalog().unwrap();
        assert_eq!(catalog.default_reciter().identifier, "ar.husary");

        config.recitation.default_reciter = "ar.nobody".to_string();
        assert!(matches!(
            config.reciter_catalog(),
            Err(ApplicationError::NotFound { .. })
        ));
    }
}
