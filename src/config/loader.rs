//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, OutputKind};
use crate::application::narration::{MAX_SPEED, MIN_SPEED};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NARRATOR_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NARRATOR_SYNTHESIS__URL=http://tts-server:8000`
/// - `NARRATOR_ASSETS__BASE_URL=https://stories.example.com`
/// - `NARRATOR_RECITATION__DEFAULT_RECITER=ar.husary`
/// - `NARRATOR_PLAYBACK__DEFAULT_SPEED=1.25`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("synthesis.url", "http://localhost:8000")?
        .set_default("synthesis.timeout_secs", 30)?
        .set_default("synthesis.delay_ms", 300)?
        .set_default("synthesis.min_chars", 20)?
        .set_default("synthesis.max_chars", 4500)?
        .set_default("synthesis.filler", " Let us reflect on this.")?
        .set_default("synthesis.offline", false)?
        .set_default("assets.base_url", "http://localhost:3000")?
        .set_default(
            "assets.prebaked_template",
            "/assets/adult/audio/{story_id}-{section_id}.mp3",
        )?
        .set_default("assets.probe_timeout_secs", 10)?
        .set_default("recitation.base_url", "https://cdn.islamic.network/quran/audio")?
        .set_default("recitation.default_reciter", "ar.alafasy")?
        .set_default("playback.output", "device")?
        .set_default("playback.transition_delay_ms", 500)?
        .set_default("playback.default_speed", 1.0)?
        .set_default("playback.progress_interval_ms", 250)?
        .set_default("playback.frame_interval_ms", 16)?
        .set_default("playback.load_timeout_secs", 60)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: NARRATOR_SYNTHESIS__URL=http://tts-server:8000
    builder = builder.add_source(
        Environment::with_prefix("NARRATOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let urls = [
        ("synthesis.url", &config.synthesis.url),
        ("assets.base_url", &config.assets.base_url),
        ("recitation.base_url", &config.recitation.base_url),
    ];
    for (key, url) in urls {
        if url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                key
            )));
        }
    }

    if config.synthesis.min_chars >= config.synthesis.max_chars {
        return Err(ConfigError::ValidationError(format!(
            "synthesis.min_chars ({}) must be less than synthesis.max_chars ({})",
            config.synthesis.min_chars, config.synthesis.max_chars
        )));
    }

    if config.playback.progress_interval_ms == 0 || config.playback.frame_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Playback tick intervals cannot be 0".to_string(),
        ));
    }

    if config.playback.output == OutputKind::Device && !cfg!(feature = "audio-output") {
        return Err(ConfigError::ValidationError(
            "playback.output = \"device\" requires the audio-output feature".to_string(),
        ));
    }

    let speed = config.playback.default_speed;
    if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(ConfigError::ValidationError(format!(
            "playback.default_speed must be within [{}, {}], got {}",
            MIN_SPEED, MAX_SPEED, speed
        )));
    }

    config
        .reciter_catalog()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Narrator Configuration ===");
    tracing::info!("TTS URL: {}", config.synthesis.url);
    tracing::info!("TTS Timeout: {}s", config.synthesis.timeout_secs);
    tracing::info!("Offline Synthesis: {}", config.synthesis.offline);
    tracing::info!("Synthesis Delay: {}ms", config.synthesis.delay_ms);
    tracing::info!("Assets Base URL: {}", config.assets.base_url);
    tracing::info!("Prebaked Template: {}", config.assets.prebaked_template);
    tracing::info!("Recitation Base URL: {}", config.recitation.base_url);
    tracing::info!("Default Reciter: {}", config.recitation.default_reciter);
    tracing::info!("Audio Output: {}", config.playback.output);
    tracing::info!("Transition Delay: {}ms", config.playback.transition_delay_ms);
    tracing::info!("Default Speed: {}x", config.playback.default_speed);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("==============================");
}
