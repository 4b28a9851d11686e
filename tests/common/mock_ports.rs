//! In-memory port fakes for driving the engine without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use narrator::application::ports::{
    AssetProbePort, AudioBuffer, LoadedMedia, MediaError, MediaSourcePort, PlaybackError,
    PlaybackEvent, PlaybackEventKind, PlaybackEventSender, PlaybackPort, PlaybackSource,
    PlaybackTicket, ProbeError, SpeechSynthesisPort, SynthesisRequest, TtsError,
};

/// How the mock speech service answers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TtsBehavior {
    /// Return silence of the given length.
    Audio(f64),
    /// Answer without audio.
    NoAudio,
    /// Fail the request.
    Fail,
}

/// Mock TTS that records every request.
pub struct MockTts {
    behavior: Mutex<TtsBehavior>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl MockTts {
    pub fn new(behavior: TtsBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: TtsBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose text starts with `prefix`.
    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.text.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl SpeechSynthesisPort for MockTts {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Option<AudioBuffer>, TtsError> {
        self.requests.lock().unwrap().push(request);
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            TtsBehavior::Audio(secs) => Ok(Some(AudioBuffer::silence(secs, 8000, 1))),
            TtsBehavior::NoAudio => Ok(None),
            TtsBehavior::Fail => Err(TtsError::ServiceError("mock TTS failure".to_string())),
        }
    }
}

/// Mock asset probe; every URL exists unless marked missing.
#[derive(Default)]
pub struct MockProbe {
    missing: Mutex<HashSet<String>>,
    missing_all: Mutex<bool>,
    probed: Mutex<Vec<String>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_missing(&self, url: &str) {
        self.missing.lock().unwrap().insert(url.to_string());
    }

    pub fn mark_all_missing(&self) {
        *self.missing_all.lock().unwrap() = true;
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetProbePort for MockProbe {
    async fn probe(&self, url: &str) -> Result<(), ProbeError> {
        self.probed.lock().unwrap().push(url.to_string());
        let missing = *self.missing_all.lock().unwrap() || self.missing.lock().unwrap().contains(url);
        if missing {
            Err(ProbeError::NotFound(url.to_string()))
        } else {
            Ok(())
        }
    }
}

/// Mock media source with a default duration per URL.
pub struct MockMedia {
    default_duration: f64,
    latency: Duration,
    durations: Mutex<HashMap<String, f64>>,
    broken: Mutex<HashSet<String>>,
    loads: Mutex<Vec<String>>,
}

impl MockMedia {
    pub fn new(default_duration: f64) -> Self {
        Self {
            default_duration,
            latency: Duration::from_millis(20),
            durations: Mutex::new(HashMap::new()),
            broken: Mutex::new(HashSet::new()),
            loads: Mutex::new(Vec::new()),
        }
    }

    pub fn set_duration(&self, url: &str, secs: f64) {
        self.durations.lock().unwrap().insert(url.to_string(), secs);
    }

    /// Loads of this URL fail even though the probe succeeds.
    pub fn mark_broken(&self, url: &str) {
        self.broken.lock().unwrap().insert(url.to_string());
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSourcePort for MockMedia {
    async fn load(&self, url: &str) -> Result<LoadedMedia, MediaError> {
        self.loads.lock().unwrap().push(url.to_string());
        tokio::time::sleep(self.latency).await;

        if self.broken.lock().unwrap().contains(url) {
            return Err(MediaError::DecodingError(format!("corrupt media: {}", url)));
        }

        let duration = self
            .durations
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(self.default_duration);

        Ok(LoadedMedia {
            url: url.to_string(),
            data: Arc::from(vec![0u8; 4096]),
            format_hint: Some("mp3".to_string()),
            duration_secs: duration,
            sample_rate: Some(44100),
        })
    }
}

/// Backend that takes over the given stream URLs, starts them and then
/// reports a mid-stream failure, like a decoder losing sync.
pub struct ErroringPlayback {
    urls: Mutex<HashSet<String>>,
    duration: f64,
    fail_after: Duration,
    starts: AtomicUsize,
    paused: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ErroringPlayback {
    pub fn new(duration: f64, fail_after: Duration) -> Self {
        Self {
            urls: Mutex::new(HashSet::new()),
            duration,
            fail_after,
            starts: AtomicUsize::new(0),
            paused: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Streams of this URL are taken over by this backend.
    pub fn fail_url(&self, url: &str) {
        self.urls.lock().unwrap().insert(url.to_string());
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaybackPort for ErroringPlayback {
    fn name(&self) -> &'static str {
        "erroring"
    }

    fn accepts(&self, source: &PlaybackSource) -> bool {
        matches!(source, PlaybackSource::Stream { url } if self.urls.lock().unwrap().contains(url))
    }

    async fn start(
        &self,
        ticket: PlaybackTicket,
        _source: PlaybackSource,
        _rate: f32,
        events: PlaybackEventSender,
    ) -> Result<(), PlaybackError> {
        self.stop();
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);

        let _ = events.send(PlaybackEvent::new(
            ticket,
            PlaybackEventKind::Started {
                duration: self.duration,
            },
        ));

        let fail_after = self.fail_after;
        let task = tokio::spawn(async move {
            tokio::time::sleep(fail_after).await;
            let _ = events.send(PlaybackEvent::new(
                ticket,
                PlaybackEventKind::Error("decoder lost sync".to_string()),
            ));
        });
        *self.task.lock().unwrap() = Some(task);
        Ok(())
    }

    fn pause(&self) -> bool {
        self.is_playing() && !self.paused.swap(true, Ordering::SeqCst)
    }

    fn resume(&self) -> bool {
        self.task.lock().unwrap().is_some() && self.paused.swap(false, Ordering::SeqCst)
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }

    fn set_rate(&self, _rate: f32) {}

    fn is_playing(&self) -> bool {
        let running = self
            .task
            .lock()
            .unwrap()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false);
        running && !self.paused.load(Ordering::SeqCst)
    }
}
