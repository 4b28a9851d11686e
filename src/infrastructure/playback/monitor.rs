//! Sink Monitor - 由输出 sink 推导进度与结束
//!
//! 两种后端共用：周期读取 sink 的位置，排空时判断是完整播完还是中途断流。
//! 解码出错时 sink 只会提前排空，所以"排空时位置明显不足"即视为播放错误。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::output::OutputSink;
use crate::application::ports::{
    ClockPort, PlaybackEvent, PlaybackEventKind, PlaybackEventSender, PlaybackTicket,
};

/// 排空时允许的时长误差（秒）
const END_TOLERANCE_SECS: f64 = 0.5;
/// 排空时允许的相对误差
const END_TOLERANCE_RATIO: f64 = 0.05;

/// 当前持有的 sink
pub(super) struct ActiveSink {
    pub ticket: PlaybackTicket,
    pub label: String,
    pub duration: f64,
    pub sink: Box<dyn OutputSink>,
    monitor: Option<JoinHandle<()>>,
}

impl ActiveSink {
    pub fn new(
        ticket: PlaybackTicket,
        label: impl Into<String>,
        duration: f64,
        sink: Box<dyn OutputSink>,
    ) -> Self {
        Self {
            ticket,
            label: label.into(),
            duration,
            sink,
            monitor: None,
        }
    }

    /// 正在出声
    pub fn is_audible(&self) -> bool {
        !self.sink.is_paused() && !self.sink.is_finished()
    }

    fn release(self) {
        if let Some(monitor) = &self.monitor {
            monitor.abort();
        }
        self.sink.stop();
        tracing::trace!(ticket = %self.ticket, source = %self.label, "Output sink released");
    }
}

/// 后端持有的唯一 sink 槽位
pub(super) type SinkSlot = Arc<Mutex<Option<ActiveSink>>>;

pub(super) fn lock_slot(slot: &SinkSlot) -> MutexGuard<'_, Option<ActiveSink>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 释放槽位中的 sink
pub(super) fn release(slot: &mut Option<ActiveSink>) {
    if let Some(active) = slot.take() {
        active.release();
    }
}

/// 判断 sink 排空时是否完整播完
fn reached_end(position: f64, duration: f64) -> bool {
    if duration <= 0.0 {
        return true;
    }
    let tolerance = END_TOLERANCE_SECS.max(duration * END_TOLERANCE_RATIO);
    position + tolerance >= duration
}

/// 放入新 sink，发出 `Started` 并启动监视任务
pub(super) fn activate(
    slot: &SinkSlot,
    mut active: ActiveSink,
    clock: Arc<dyn ClockPort>,
    interval: Duration,
    events: PlaybackEventSender,
) {
    let ticket = active.ticket;
    let duration = active.duration;
    let mut guard = lock_slot(slot);
    release(&mut guard);

    let _ = events.send(PlaybackEvent::new(
        ticket,
        PlaybackEventKind::Started { duration },
    ));

    let task_slot = slot.clone();
    active.monitor = Some(tokio::spawn(async move {
        loop {
            clock.sleep(interval).await;

            let mut guard = lock_slot(&task_slot);
            let Some(current) = guard.as_ref().filter(|a| a.ticket == ticket) else {
                return;
            };

            if current.sink.is_finished() {
                let position = current.sink.position();
                let finished = guard.take();
                drop(guard);

                if reached_end(position, duration) {
                    let _ = events.send(PlaybackEvent::new(
                        ticket,
                        PlaybackEventKind::Progress {
                            current_time: duration,
                            duration,
                        },
                    ));
                    let _ = events.send(PlaybackEvent::new(ticket, PlaybackEventKind::Ended));
                } else {
                    tracing::warn!(
                        ticket = %ticket,
                        position = position,
                        duration = duration,
                        "Audio output drained before the end"
                    );
                    let _ = events.send(PlaybackEvent::new(
                        ticket,
                        PlaybackEventKind::Error(format!(
                            "audio stopped at {:.1}s of {:.1}s",
                            position, duration
                        )),
                    ));
                }

                // 自身的 JoinHandle 随之丢弃，之后不再 await
                drop(finished);
                return;
            }

            if current.sink.is_paused() {
                continue;
            }

            let _ = events.send(PlaybackEvent::new(
                ticket,
                PlaybackEventKind::Progress {
                    current_time: current.sink.position().min(duration),
                    duration,
                },
            ));
        }
    }));

    *guard = Some(active);
}
