//! Headless Output - 无设备输出
//!
//! 不出声，只按时钟推进播放位置：elapsed = (now - start_time) × rate。
//! 暂停冻结 elapsed，恢复与改速时重新锚定 start_time。
//! 用于没有音频设备的环境与测试。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{AudioClip, AudioOutput, OutputSink};
use crate::application::ports::{ClockPort, PlaybackError};

const OUTPUT_NAME: &str = "headless";

struct SinkClock {
    start_time: Duration,
    rate: f64,
    paused_elapsed: Option<f64>,
    stopped: bool,
}

impl SinkClock {
    fn elapsed(&self, now: Duration) -> f64 {
        match self.paused_elapsed {
            Some(elapsed) => elapsed,
            None => now.saturating_sub(self.start_time).as_secs_f64() * self.rate,
        }
    }

    fn anchor(&mut self, now: Duration, elapsed: f64) {
        let offset = if self.rate > 0.0 {
            Duration::from_secs_f64((elapsed / self.rate).max(0.0))
        } else {
            Duration::ZERO
        };
        self.start_time = now.saturating_sub(offset);
    }
}

/// 按时钟推进的虚拟 sink
pub struct HeadlessSink {
    clock: Arc<dyn ClockPort>,
    duration: f64,
    state: Mutex<SinkClock>,
}

impl HeadlessSink {
    pub fn new(clock: Arc<dyn ClockPort>, duration_secs: f64, rate: f32) -> Self {
        let start_time = clock.now();
        Self {
            clock,
            duration: duration_secs.max(0.0),
            state: Mutex::new(SinkClock {
                start_time,
                rate: rate as f64,
                paused_elapsed: None,
                stopped: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkClock> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSink for HeadlessSink {
    fn pause(&self) {
        let now = self.clock.now();
        let mut state = self.lock();
        if state.paused_elapsed.is_none() {
            state.paused_elapsed = Some(state.elapsed(now));
        }
    }

    fn play(&self) {
        let now = self.clock.now();
        let mut state = self.lock();
        if let Some(elapsed) = state.paused_elapsed.take() {
            state.anchor(now, elapsed);
        }
    }

    fn is_paused(&self) -> bool {
        self.lock().paused_elapsed.is_some()
    }

    fn set_speed(&self, rate: f32) {
        let now = self.clock.now();
        let mut state = self.lock();
        let elapsed = state.elapsed(now);
        state.rate = rate as f64;
        if state.paused_elapsed.is_none() {
            state.anchor(now, elapsed);
        }
    }

    fn position(&self) -> f64 {
        let now = self.clock.now();
        self.lock().elapsed(now).min(self.duration)
    }

    fn is_finished(&self) -> bool {
        let now = self.clock.now();
        let state = self.lock();
        state.stopped || state.elapsed(now) >= self.duration
    }

    fn stop(&self) {
        self.lock().stopped = true;
    }
}

/// 无设备输出
pub struct HeadlessOutput {
    clock: Arc<dyn ClockPort>,
}

impl HeadlessOutput {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self { clock }
    }
}

impl AudioOutput for HeadlessOutput {
    fn name(&self) -> &'static str {
        OUTPUT_NAME
    }

    fn open(&self, clip: AudioClip, rate: f32) -> Result<Box<dyn OutputSink>, PlaybackError> {
        let duration = clip.duration_secs();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(PlaybackError::LoadFailed("clip has no playable audio".to_string()));
        }
        Ok(Box::new(HeadlessSink::new(self.clock.clone(), duration, rate)))
    }
}
