//! Streaming Playback - 流式元素播放后端
//!
//! 播放 URL 寻址的音频（预渲染文件、远程朗诵）。
//! 通过 MediaSourcePort 取回编码数据与时长，交给输出端解码播放；
//! 进度与结束由 sink 的位置与排空决定。

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::monitor::{self, ActiveSink, SinkSlot};
use super::output::{AudioClip, AudioOutput};
use crate::application::ports::{
    ClockPort, MediaSourcePort, PlaybackError, PlaybackEventSender, PlaybackPort, PlaybackSource,
    PlaybackTicket,
};

const BACKEND_NAME: &str = "streaming";

/// 流式播放后端
pub struct StreamingPlayback {
    media: Arc<dyn MediaSourcePort>,
    output: Arc<dyn AudioOutput>,
    clock: Arc<dyn ClockPort>,
    tick: Duration,
    /// 正在加载的票据
    pending: Mutex<Option<PlaybackTicket>>,
    slot: SinkSlot,
}

impl StreamingPlayback {
    /// 默认进度 tick
    pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

    pub fn new(
        media: Arc<dyn MediaSourcePort>,
        output: Arc<dyn AudioOutput>,
        clock: Arc<dyn ClockPort>,
        tick: Duration,
    ) -> Self {
        Self {
            media,
            output,
            clock,
            tick,
            pending: Mutex::new(None),
            slot: Arc::new(Mutex::new(None)),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<PlaybackTicket>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 当前元素位置（秒）
    pub fn position(&self) -> Option<f64> {
        monitor::lock_slot(&self.slot)
            .as_ref()
            .map(|active| active.sink.position())
    }
}

#[async_trait]
impl PlaybackPort for StreamingPlayback {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn accepts(&self, source: &PlaybackSource) -> bool {
        matches!(source, PlaybackSource::Stream { .. })
    }

    async fn start(
        &self,
        ticket: PlaybackTicket,
        source: PlaybackSource,
        rate: f32,
        events: PlaybackEventSender,
    ) -> Result<(), PlaybackError> {
        let PlaybackSource::Stream { url } = source else {
            return Err(PlaybackError::UnsupportedSource {
                backend: BACKEND_NAME,
            });
        };

        {
            let mut pending = self.pending();
            monitor::release(&mut monitor::lock_slot(&self.slot));
            *pending = Some(ticket);
        }

        let loaded = self.media.load(&url).await;

        // 持有 pending 直到 sink 就位，stop 不会落在两者之间
        let mut pending = self.pending();
        if *pending != Some(ticket) {
            tracing::debug!(url = %url, ticket = %ticket, "Stream load superseded");
            return Err(PlaybackError::Superseded);
        }
        *pending = None;

        let media = loaded.map_err(|e| PlaybackError::LoadFailed(e.to_string()))?;
        let duration = if media.duration_secs.is_finite() {
            media.duration_secs.max(0.0)
        } else {
            0.0
        };

        let size_bytes = media.size_bytes();
        let clip = AudioClip::Encoded {
            data: media.data,
            format_hint: media.format_hint,
            duration_secs: duration,
        };
        let sink = self.output.open(clip, rate)?;

        monitor::activate(
            &self.slot,
            ActiveSink::new(ticket, url.as_str(), duration, sink),
            self.clock.clone(),
            self.tick,
            events,
        );

        tracing::debug!(
            url = %url,
            ticket = %ticket,
            output = self.output.name(),
            duration = duration,
            size_bytes = size_bytes,
            "Stream element playing"
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
        let mut pending = self.pending();
        *pending = None;
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

impl Drop for StreamingPlayback {
    fn drop(&mut self) {
        monitor::release(&mut monitor::lock_slot(&self.slot));
    }
}
