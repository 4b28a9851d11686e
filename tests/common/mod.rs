//! Shared test harness: engine wiring, story fixtures and wait helpers.

#![allow(dead_code)]

pub mod mock_ports;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use narrator::application::ports::{ClockPort, PlaybackPort};
use narrator::application::{EngineConfig, NarrationEngine, NarrationPorts};
use narrator::domain::narration::NarrationState;
use narrator::domain::story::{Hadith, Section, Story, Verse};
use narrator::domain::ReciterCatalog;
use narrator::infrastructure::playback::{AudioOutput, HeadlessOutput};
use narrator::infrastructure::{BufferedPlayback, StreamingPlayback, Subscription, TokioClock};

pub use mock_ports::{ErroringPlayback, MockMedia, MockProbe, MockTts, TtsBehavior};

pub const ASSETS_BASE_URL: &str = "http://assets.test";

/// Engine wired to in-memory fakes and the real playback backends.
pub struct TestHarness {
    pub engine: NarrationEngine,
    pub tts: Arc<MockTts>,
    pub probe: Arc<MockProbe>,
    pub media: Arc<MockMedia>,
    pub backends: Vec<Arc<dyn PlaybackPort>>,
    pub history: Arc<Mutex<Vec<NarrationState>>>,
    _subscription: Subscription,
}

impl TestHarness {
    /// TTS returns one second of audio, every asset exists and streams last two seconds.
    pub fn new() -> Self {
        Self::with_ports(
            MockTts::new(TtsBehavior::Audio(1.0)),
            MockProbe::new(),
            MockMedia::new(2.0),
        )
    }

    pub fn with_tts(behavior: TtsBehavior) -> Self {
        Self::with_ports(MockTts::new(behavior), MockProbe::new(), MockMedia::new(2.0))
    }

    pub fn with_ports(tts: MockTts, probe: MockProbe, media: MockMedia) -> Self {
        Self::with_leading_backends(tts, probe, media, Vec::new())
    }

    /// `leading` backends are consulted before the streaming and buffered ones.
    pub fn with_leading_backends(
        tts: MockTts,
        probe: MockProbe,
        media: MockMedia,
        leading: Vec<Arc<dyn PlaybackPort>>,
    ) -> Self {
        let tts = Arc::new(tts);
        let probe = Arc::new(probe);
        let media = Arc::new(media);
        let (engine, backends) = build_engine(&tts, &probe, &media, leading);

        let history = Arc::new(Mutex::new(Vec::new()));
        let recorder = history.clone();
        let subscription = engine.subscribe(move |state| {
            recorder.lock().unwrap().push(state.clone());
        });

        Self {
            engine,
            tts,
            probe,
            media,
            backends,
            history,
            _subscription: subscription,
        }
    }

    pub fn state(&self) -> NarrationState {
        (*self.engine.get_state()).clone()
    }

    pub fn history(&self) -> Vec<NarrationState> {
        self.history.lock().unwrap().clone()
    }

    pub fn playing_backends(&self) -> usize {
        self.backends.iter().filter(|b| b.is_playing()).count()
    }

    /// Waits (in paused tokio time) until the predicate holds.
    pub async fn wait_for<F>(&self, mut predicate: F) -> NarrationState
    where
        F: FnMut(&NarrationState) -> bool,
    {
        let mut rx = self.engine.watch();
        tokio::time::timeout(Duration::from_secs(3600), async {
            loop {
                let state = (**rx.borrow_and_update()).clone();
                if predicate(&state) {
                    return state;
                }
                rx.changed().await.expect("state channel closed");
            }
        })
        .await
        .expect("timed out waiting for narration state")
    }

    pub async fn wait_completed(&self) -> NarrationState {
        self.wait_for(|s| s.is_completed()).await
    }

    /// Waits until the item at `index` has started playing.
    pub async fn wait_started(&self, index: usize) -> NarrationState {
        self.wait_for(|s| s.current_index == index && s.current_item.is_some() && !s.is_loading)
            .await
    }
}

/// Wires an engine to the given fakes and headless streaming/buffered backends.
pub fn build_engine(
    tts: &Arc<MockTts>,
    assets: &Arc<MockProbe>,
    media: &Arc<MockMedia>,
    leading: Vec<Arc<dyn PlaybackPort>>,
) -> (NarrationEngine, Vec<Arc<dyn PlaybackPort>>) {
    let clock: Arc<dyn ClockPort> = Arc::new(TokioClock::new());
    let output: Arc<dyn AudioOutput> = Arc::new(HeadlessOutput::new(clock.clone()));

    let mut backends = leading;
    backends.push(Arc::new(StreamingPlayback::new(
        media.clone(),
        output.clone(),
        clock.clone(),
        StreamingPlayback::DEFAULT_TICK,
    )));
    backends.push(Arc::new(BufferedPlayback::new(
        output,
        clock.clone(),
        BufferedPlayback::DEFAULT_FRAME_INTERVAL,
    )));

    let config = EngineConfig {
        assets_base_url: ASSETS_BASE_URL.to_string(),
        ..EngineConfig::default()
    };

    let engine = NarrationEngine::new(
        config,
        ReciterCatalog::default(),
        NarrationPorts {
            speech: tts.clone(),
            probe: assets.clone(),
            backends: backends.clone(),
            clock,
        },
    );
    (engine, backends)
}

pub fn verse(surah: u16, verse: u16) -> Verse {
    Verse {
        surah,
        verse,
        translation: format!("Translation of surah {} verse {}", surah, verse),
    }
}

pub fn hadith(source: &str) -> Hadith {
    Hadith {
        source: source.to_string(),
        book: "Book of the Prophets".to_string(),
        text: "The believers are like one body.".to_string(),
        grade: Some("Sahih".to_string()),
    }
}

pub fn section(id: &str, verses: Vec<Verse>, hadiths: Vec<Hadith>) -> Section {
    Section {
        id: id.to_string(),
        title: format!("Section {}", id),
        content: format!("Narrated content of section {} about the prophet.", id),
        verses,
        hadiths,
    }
}

/// Section with two verses and no hadith: 7 items.
pub fn two_verse_section() -> Section {
    section("creation", vec![verse(2, 30), verse(2, 31)], vec![])
}

/// Section with one verse and one hadith: 5 items.
pub fn five_item_section() -> Section {
    section("garden", vec![verse(7, 19)], vec![hadith("Sahih Bukhari")])
}

/// Story of 14 items: intro, 8 in `creation`, 4 in `descent`, key lessons.
pub fn sample_story() -> Story {
    Story {
        id: "adam".to_string(),
        prophet_name: "Adam".to_string(),
        summary: "The first man and the first prophet.".to_string(),
        key_lessons: vec!["Repentance".to_string(), "Humility".to_string()],
        sections: vec![
            section(
                "creation",
                vec![verse(2, 30), verse(2, 31)],
                vec![hadith("Sahih Muslim")],
            ),
            section("descent", vec![verse(7, 24)], vec![]),
        ],
    }
}

pub fn prebaked_url(story_id: &str, section_id: &str) -> String {
    format!(
        "{}/assets/adult/audio/{}-{}.mp3",
        ASSETS_BASE_URL, story_id, section_id
    )
}
