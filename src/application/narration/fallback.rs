//! Fallback Resolver - 条目来源决策
//!
//! 每个条目只有三种结局：使用原始来源、改用合成语音、跳过。
//! 策略是"回退一次，然后跳过"，不做自动重试

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    AssetProbePort, AudioBuffer, ClockPort, PlaybackSource, SpeechSynthesisPort,
    SynthesisRequest,
};
use crate::domain::narration::{NarrationPayload, NarrationQueueItem, PrebakedItem, SpeechRole};

use super::NarrationError;

/// 各用途使用的音色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceMap {
    pub narrator: String,
    pub translation: String,
    pub hadith: String,
}

impl VoiceMap {
    pub fn for_role(&self, role: SpeechRole) -> &str {
        match role {
            SpeechRole::Translation => &self.translation,
            SpeechRole::Hadith => &self.hadith,
            SpeechRole::StoryIntro
            | SpeechRole::VerseIntro
            | SpeechRole::KeyLessons
            | SpeechRole::Fallback => &self.narrator,
        }
    }
}

impl Default for VoiceMap {
    fn default() -> Self {
        Self {
            narrator: "narrator".to_string(),
            translation: "translation".to_string(),
            hadith: "hadith".to_string(),
        }
    }
}

/// Resolver 配置
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// 每次调用合成服务前的固定延迟
    pub synthesis_delay: Duration,
    /// 低于该字符数时追加填充句
    pub min_chars: usize,
    /// 超过该字符数时截断
    pub max_chars: usize,
    /// 填充句
    pub filler: String,
    pub voices: VoiceMap,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            synthesis_delay: Duration::from_millis(300),
            min_chars: 20,
            max_chars: 4500,
            filler: " Let us reflect on this.".to_string(),
            voices: VoiceMap::default(),
        }
    }
}

/// 决策结果
#[derive(Debug, Clone)]
pub enum Resolution {
    /// 交给播放后端
    Play {
        source: PlaybackSource,
        /// 是否已经是回退来源（回退来源失败后直接跳过）
        via_fallback: bool,
    },
    /// 跳过条目（视为已结束）
    Skip { error: Option<NarrationError> },
}

impl Resolution {
    fn play(source: PlaybackSource) -> Self {
        Self::Play {
            source,
            via_fallback: false,
        }
    }

    fn skip(error: NarrationError) -> Self {
        Self::Skip { error: Some(error) }
    }
}

/// 合成前的文本整理：过短追加填充句，过长截断并追加省略号
pub fn prepare_speech_text(text: &str, config: &ResolverConfig) -> String {
    let mut prepared = text.trim().to_string();

    if prepared.chars().count() < config.min_chars {
        prepared.push_str(&config.filler);
    }

    if prepared.chars().count() > config.max_chars {
        let keep = config.max_chars.saturating_sub(3);
        prepared = prepared.chars().take(keep).collect::<String>();
        prepared.push_str("...");
    }

    prepared
}

/// Fallback Resolver
pub struct FallbackResolver {
    config: ResolverConfig,
    speech: Arc<dyn SpeechSynthesisPort>,
    probe: Arc<dyn AssetProbePort>,
    clock: Arc<dyn ClockPort>,
}

impl FallbackResolver {
    pub fn new(
        config: ResolverConfig,
        speech: Arc<dyn SpeechSynthesisPort>,
        probe: Arc<dyn AssetProbePort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            config,
            speech,
            probe,
            clock,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// 播放前决策
    pub async fn resolve(&self, item: &NarrationQueueItem) -> Resolution {
        match &item.payload {
            NarrationPayload::PrebakedAsset(prebaked) => match self.probe.probe(&prebaked.url).await {
                Ok(()) => Resolution::play(PlaybackSource::Stream {
                    url: prebaked.url.clone(),
                }),
                Err(e) => {
                    tracing::warn!(
                        url = %prebaked.url,
                        error = %e,
                        "Prebaked asset probe failed, falling back to speech synthesis"
                    );
                    self.fallback(prebaked, NarrationError::asset_not_found(&prebaked.url))
                        .await
                }
            },
            NarrationPayload::StreamedRecitation(recitation) => {
                Resolution::play(PlaybackSource::Stream {
                    url: recitation.url.clone(),
                })
            }
            NarrationPayload::SynthesizedSpeech(speech) => {
                match self.synthesize(&speech.text, speech.role).await {
                    Ok(buffer) => Resolution::play(PlaybackSource::Buffer(buffer)),
                    Err(e) => Resolution::skip(e),
                }
            }
        }
    }

    /// 已提交的播放失败后的恢复
    ///
    /// 只有尚未回退过的预渲染条目会再尝试一次合成；其余一律跳过
    pub async fn recover(
        &self,
        item: &NarrationQueueItem,
        failure: NarrationError,
        via_fallback: bool,
    ) -> Resolution {
        match &item.payload {
            NarrationPayload::PrebakedAsset(prebaked) if !via_fallback => {
                tracing::warn!(
                    url = %prebaked.url,
                    error = %failure,
                    "Prebaked playback failed, falling back to speech synthesis"
                );
                self.fallback(prebaked, failure).await
            }
            _ => Resolution::skip(failure),
        }
    }

    async fn fallback(&self, prebaked: &PrebakedItem, cause: NarrationError) -> Resolution {
        let Some(text) = prebaked.fallback_text.as_deref() else {
            tracing::debug!(url = %prebaked.url, "No fallback text, skipping item");
            return Resolution::skip(cause);
        };

        match self.synthesize(text, SpeechRole::Fallback).await {
            Ok(buffer) => Resolution::Play {
                source: PlaybackSource::Buffer(buffer),
                via_fallback: true,
            },
            Err(e) => Resolution::skip(e),
        }
    }

    /// 调用合成服务（带固定前置延迟与文本整理）
    pub async fn synthesize(&self, text: &str, role: SpeechRole) -> Result<AudioBuffer, NarrationError> {
        self.clock.sleep(self.config.synthesis_delay).await;

        let request = SynthesisRequest {
            text: prepare_speech_text(text, &self.config),
            voice: self.config.voices.for_role(role).to_string(),
        };

        tracing::debug!(
            text_len = request.text.len(),
            voice = %request.voice,
            role = ?role,
            "Requesting speech synthesis"
        );

        match self.speech.synthesize(request).await {
            Ok(Some(buffer)) if buffer.frames() > 0 => Ok(buffer),
            Ok(_) => {
                tracing::warn!(role = ?role, "Speech synthesis returned no audio");
                Err(NarrationError::synthesis("no audio returned"))
            }
            Err(e) => {
                tracing::warn!(role = ?role, error = %e, "Speech synthesis failed");
                Err(NarrationError::synthesis(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ProbeError, TtsError};
    use crate::domain::narration::SpeechItem;
    use crate::domain::story::VerseRef;
    use crate::infrastructure::clock::TokioClock;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum TtsMode {
        Audio,
        Empty,
        Fail,
    }

    struct StubTts {
        mode: TtsMode,
        calls: AtomicUsize,
        last: Mutex<Option<SynthesisRequest>>,
    }

    impl StubTts {
        fn new(mode: TtsMode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl SpeechSynthesisPort for StubTts {
        async fn synthesize(
            &self,
            request: SynthesisRequest,
        ) -> Result<Option<AudioBuffer>, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request);
            match self.mode {
                TtsMode::Audio => Ok(Some(AudioBuffer::silence(1.0, 8000, 1))),
                TtsMode::Empty => Ok(None),
                TtsMode::Fail => Err(TtsError::ServiceError("boom".to_string())),
            }
        }
    }

    struct StubProbe {
        exists: bool,
    }

    #[async_trait]
    impl AssetProbePort for StubProbe {
        async fn probe(&self, url: &str) -> Result<(), ProbeError> {
            if self.exists {
                Ok(())
            } else {
                Err(ProbeError::NotFound(url.to_string()))
            }
        }
    }

    fn resolver(tts: Arc<StubTts>, exists: bool) -> FallbackResolver {
        FallbackResolver::new(
            ResolverConfig::default(),
            tts,
            Arc::new(StubProbe { exists }),
            Arc::new(TokioClock::new()),
        )
    }

    fn prebaked(fallback: Option<&str>) -> NarrationQueueItem {
        NarrationQueueItem::prebaked("http://assets/a.mp3", fallback.map(str::to_string))
    }

    #[test]
    fn test_prepare_short_text_gets_filler() {
        let config = ResolverConfig::default();
        assert_eq!(
            prepare_speech_text("Surah 1, verse 1.", &config),
            "Surah 1, verse 1. Let us reflect on this."
        );
    }

    #[test]
    fn test_prepare_long_text_truncated() {
        let config = ResolverConfig {
            max_chars: 30,
            ..Default::default()
        };
        let text = "a".repeat(100);
        let prepared = prepare_speech_text(&text, &config);
        assert_eq!(prepared.chars().count(), 30);
        assert!(prepared.ends_with("..."));
    }

    #[test]
    fn test_prepare_text_within_bounds_untouched() {
        let config = ResolverConfig::default();
        let text = "This sentence is comfortably long enough.";
        assert_eq!(prepare_speech_text(text, &config), text);
    }

    #[test]
    fn test_voice_map() {
        let voices = VoiceMap::default();
        assert_eq!(voices.for_role(SpeechRole::Translation), "translation");
        assert_eq!(voices.for_role(SpeechRole::Hadith), "hadith");
        assert_eq!(voices.for_role(SpeechRole::Fallback), "narrator");
    }

    #[tokio::test(start_paused = true)]
    async fn test_prebaked_asset_present_streams() {
        let tts = StubTts::new(TtsMode::Audio);
        let resolution = resolver(tts.clone(), true).resolve(&prebaked(Some("text"))).await;
        match resolution {
            Resolution::Play {
                source: PlaybackSource::Stream { url },
                via_fallback,
            } => {
                assert_eq!(url, "http://assets/a.mp3");
                assert!(!via_fallback);
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
        assert_eq!(tts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_asset_falls_back_to_speech() {
        let tts = StubTts::new(TtsMode::Audio);
        let resolution = resolver(tts.clone(), false)
            .resolve(&prebaked(Some("The original section text")))
            .await;
        assert!(matches!(
            resolution,
            Resolution::Play {
                source: PlaybackSource::Buffer(_),
                via_fallback: true
            }
        ));
        let request = tts.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.text, "The original section text");
        assert_eq!(request.voice, "narrator");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_asset_without_fallback_text_skips() {
        let tts = StubTts::new(TtsMode::Audio);
        let resolution = resolver(tts.clone(), false).resolve(&prebaked(None)).await;
        match resolution {
            Resolution::Skip { error } => {
                assert_eq!(error, Some(NarrationError::asset_not_found("http://assets/a.mp3")));
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
        assert_eq!(tts.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesis_none_and_error_skip() {
        let item = NarrationQueueItem::speech(
            SpeechItem::new("A translation long enough", SpeechRole::Translation)
                .with_verse(VerseRef::new(1, 1)),
        );

        for mode in [TtsMode::Empty, TtsMode::Fail] {
            let tts = StubTts::new(mode);
            let resolution = resolver(tts.clone(), true).resolve(&item).await;
            assert!(matches!(
                resolution,
                Resolution::Skip {
                    error: Some(NarrationError::SynthesisUnavailable(_))
                }
            ));
            assert_eq!(tts.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesis_waits_for_delay() {
        let tts = StubTts::new(TtsMode::Audio);
        let resolver = resolver(tts, true);
        let started = tokio::time::Instant::now();
        resolver
            .synthesize("Some text to speak aloud", SpeechRole::StoryIntro)
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_is_fallback_once_then_skip() {
        let tts = StubTts::new(TtsMode::Audio);
        let resolver = resolver(tts.clone(), true);
        let item = prebaked(Some("The original section text"));
        let failure = NarrationError::playback("decoder crashed");

        let first = resolver.recover(&item, failure.clone(), false).await;
        assert!(matches!(first, Resolution::Play { via_fallback: true, .. }));

        // 回退来源再次失败时直接跳过，两次结果一致
        for _ in 0..2 {
            let again = resolver.recover(&item, failure.clone(), true).await;
            assert!(matches!(again, Resolution::Skip { error: Some(_) }));
        }
        assert_eq!(tts.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_recitation_skips() {
        let tts = StubTts::new(TtsMode::Audio);
        let item = NarrationQueueItem::recitation("http://cdn/1.mp3", VerseRef::new(1, 1), "ar.alafasy");
        let resolution = resolver(tts.clone(), true)
            .recover(&item, NarrationError::playback("404"), false)
            .await;
        match resolution {
            Resolution::Skip { error } => {
                assert_eq!(error, Some(NarrationError::playback("404")));
            }
            other => panic!("unexpected resolution: {:?}", other),
        }
        assert_eq!(tts.calls.load(Ordering::SeqCst), 0);
    }
}
