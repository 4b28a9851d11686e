//! Buffered Playback - 内存音频播放后端
//!
//! 把合成得到的 AudioBuffer 作为 PCM 交给输出设备播放，
//! 进度与结束由 sink 的位置与排空决定。

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::monitor::{self, ActiveSink, SinkSlot};
use super::output::{AudioClip, AudioOutput};
use crate::application::ports::{
    ClockPort, PlaybackError, PlaybackEventSender, PlaybackPort, PlaybackSource, PlaybackTicket,
};

const BACKEND_NAME: &str = "buffered";

/// 缓冲播放后端
pub struct BufferedPlayback {
    output: Arc<dyn AudioOutput>,
    clock: Arc<dyn ClockPort>,
    frame_interval: Duration,
    slot: SinkSlot,
}

impl BufferedPlayback {
    /// 默认帧间隔（约 60 fps）
    pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

    pub fn new(
        output: Arc<dyn AudioOutput>,
        clock: Arc<dyn ClockPort>,
        frame_interval: Duration,
    ) -> Self {
        Self {
            output,
            clock,
            frame_interval,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// 当前已播放时长（秒）
    pub fn elapsed(&self) -> Option<f64> {
        monitor::lock_slot(&self.slot)
            .as_ref()
            .map(|active| active.sink.position())
    }
}

#[async_trait]
impl PlaybackPort for BufferedPlayback {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn accepts(&self, source: &PlaybackSource) -> bool {
        matches!(source, PlaybackSource::Buffer(_))
    }

    async fn start(
        &self,
        ticket: PlaybackTicket,
        source: PlaybackSource,
        rate: f32,
        events: PlaybackEventSender,
    ) -> Result<(), PlaybackError> {
        let PlaybackSource::Buffer(buffer) = source else {
            return Err(PlaybackError::UnsupportedSource {
                backend: BACKEND_NAME,
            });
        };
        if buffer.frames() == 0 {
            return Err(PlaybackError::LoadFailed("empty audio buffer".to_string()));
        }

        monitor::release(&mut monitor::lock_slot(&self.slot));

        let duration = buffer.duration_secs();
        let label = format!("buffer({:.2}s)", duration);
        let sink = self.output.open(AudioClip::Pcm(buffer), rate)?;

        monitor::activate(
            &self.slot,
            ActiveSink::new(ticket, label, duration, sink),
            self.clock.clone(),
            self.frame_interval,
            events,
        );

        tracing::debug!(
            ticket = %ticket,
            output = self.output.name(),
            duration = duration,
            "Buffer source playing"
        );
        Ok(())
    }

    fn pause(&self) -> bool {
        match monitor::lock_slot(&self.slot).as_ref() {
            Some(active) if active.is_audible() => {
                active.sink.pause();
                true
            }
            _ => false,
        }
    }

    fn resume(&self) -> bool {
        match monitor::lock_slot(&self.slot).as_ref() {
            Some(active) if active.sink.is_paused() => {
                active.sink.play();
                true
            }
            _ => false,
        }
    }

    fn stop(&self) {
        monitor::release(&mut monitor::lock_slot(&self.slot));
    }

    fn set_rate(&self, rate: f32) {
        if let Some(active) = monitor::lock_slot(&self.slot).as_ref() {
            active.sink.set_speed(rate);
        }
    }

    fn is_playing(&self) -> bool {
        monitor::lock_slot(&self.slot)
            .as_ref()
            .map(|active| active.is_audible())
            .unwrap_or(false)
    }
}

impl Drop for BufferedPlayback {
    fn drop(&mut self) {
        monitor::release(&mut monitor::lock_slot(&self.slot));
    }
}
