//! Narrator - 多来源叙述播放引擎
//!
//! 用法: `narrator <story.json> [section-index]`
//!
//! 无界面运行：加载故事、构建播放队列、按顺序播放，并在日志中输出状态变化

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use narrator::application::{
    ApplicationError, ClockPort, NarrationEngine, NarrationPorts, PlaybackPort,
    SpeechSynthesisPort,
};
use narrator::config::{load_config, print_config, AppConfig, OutputKind};
use narrator::domain::narration::NarrationPhase;
use narrator::domain::story::Story;
use narrator::infrastructure::adapters::{
    FakeTtsClient, HttpAssetProbe, HttpMediaSource, HttpTtsClient, HttpTtsClientConfig,
};
use narrator::infrastructure::playback::{AudioOutput, HeadlessOutput};
use narrator::infrastructure::{BufferedPlayback, StreamingPlayback, TokioClock};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},narrator={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn open_output(
    kind: OutputKind,
    clock: Arc<dyn ClockPort>,
) -> Result<Arc<dyn AudioOutput>, ApplicationError> {
    match kind {
        #[cfg(feature = "audio-output")]
        OutputKind::Device => Ok(Arc::new(
            narrator::infrastructure::playback::DeviceOutput::open_default()?,
        )),
        #[cfg(not(feature = "audio-output"))]
        OutputKind::Device => Err(ApplicationError::validation(
            "device output requires the audio-output feature",
        )),
        OutputKind::Headless => Ok(Arc::new(HeadlessOutput::new(clock))),
    }
}

fn build_ports(config: &AppConfig) -> Result<NarrationPorts, ApplicationError> {
    let clock: Arc<dyn ClockPort> = Arc::new(TokioClock::new());
    let output = open_output(config.playback.output, clock.clone())?;

    let speech: Arc<dyn SpeechSynthesisPort> = if config.synthesis.offline {
        Arc::new(FakeTtsClient::with_defaults())
    } else {
        let tts_config = HttpTtsClientConfig::new(&config.synthesis.url)
            .with_timeout(config.synthesis.timeout_secs);
        Arc::new(HttpTtsClient::new(tts_config)?)
    };

    let probe = Arc::new(HttpAssetProbe::new(Duration::from_secs(
        config.assets.probe_timeout_secs,
    ))?);
    let media = Arc::new(HttpMediaSource::new(Duration::from_secs(
        config.playback.load_timeout_secs,
    ))?);

    let backends: Vec<Arc<dyn PlaybackPort>> = vec![
        Arc::new(StreamingPlayback::new(
            media,
            output.clone(),
            clock.clone(),
            config.playback.progress_interval(),
        )),
        Arc::new(BufferedPlayback::new(
            output,
            clock.clone(),
            config.playback.frame_interval(),
        )),
    ];

    Ok(NarrationPorts {
        speech,
        probe,
        backends,
        clock,
    })
}

async fn load_story(path: &Path) -> anyhow::Result<Story> {
    let json = tokio::fs::read_to_string(path).await?;
    let story: Story = serde_json::from_str(&json)?;
    Ok(story)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    init_tracing(&config);

    let mut args = std::env::args().skip(1);
    let story_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("Usage: narrator <story.json> [section-index]"))?;
    let start_section = args
        .next()
        .map(|s| s.parse::<usize>())
        .transpose()
        .map_err(|e| ApplicationError::validation(format!("Invalid section index: {}", e)))?;

    tracing::info!("Narrator - 多来源叙述播放引擎");
    print_config(&config);

    let story = load_story(&story_path).await?;
    if let Some(index) = start_section {
        if index >= story.sections.len() {
            return Err(ApplicationError::not_found("Section", index.to_string()).into());
        }
    }

    tracing::info!(
        story_id = %story.id,
        prophet = %story.prophet_name,
        sections = story.sections.len(),
        estimate = %NarrationEngine::format_duration(NarrationEngine::estimate_story_duration(&story)),
        "Story loaded"
    );

    let ports = build_ports(&config)?;
    if !ports.speech.health_check().await {
        tracing::warn!(
            url = %config.synthesis.url,
            "Speech synthesis service unreachable, synthesized items will be skipped"
        );
    }

    let engine = NarrationEngine::new(config.engine_config(), config.reciter_catalog()?, ports);
    let mut states = engine.watch();

    match start_section {
        Some(index) => engine.narrate_from_section(&story, index),
        None => engine.narrate_full_story(&story),
    }

    let mut last_index = usize::MAX;
    loop {
        let state = states.borrow_and_update().clone();
        if state.current_index != last_index {
            last_index = state.current_index;
            tracing::info!(
                index = state.current_index,
                total = state.total_items,
                kind = ?state.current_item.as_ref().map(|item| item.kind()),
                section_id = ?state.current_section_id,
                error = ?state.error,
                "Now narrating"
            );
        }

        match state.phase() {
            NarrationPhase::Completed => {
                tracing::info!(total = state.total_items, "Story narration finished");
                break;
            }
            NarrationPhase::Idle => {
                tracing::warn!("Nothing to narrate");
                break;
            }
            _ => {}
        }

        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                engine.stop();
                break;
            }
        }
    }

    Ok(())
}
