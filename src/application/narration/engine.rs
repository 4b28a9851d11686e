//! Narration Engine - 播放状态机
//!
//! 持有队列游标与唯一的可变会话状态，编排 Fallback Resolver 与播放后端。
//!
//! 并发模型:
//! - 会话状态由一把互斥锁保护，锁从不跨越 await
//! - 每次切换条目（自然结束、跳转、停止、新的 narrate 调用）都会递增 generation，
//!   迟到的异步结果（合成、加载、过渡延迟）据此自行作废
//! - 后端事件带有票据，只有当前资源的票据会被处理
//! - 状态快照在锁内编号暂存，释放锁之后才回调订阅者，回调里可以再调用控制方法

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::application::ports::{
    AssetProbePort, ClockPort, PlaybackEvent, PlaybackEventKind, PlaybackEventReceiver,
    PlaybackEventSender, PlaybackPort, PlaybackSource, PlaybackTicket, SpeechSynthesisPort,
};
use crate::domain::narration::{
    estimate_story_duration, format_duration, NarrationQueueItem, NarrationState, QueueBuilder,
};
use crate::domain::reciter::{Reciter, ReciterCatalog};
use crate::domain::story::{Section, Story};
use crate::infrastructure::events::{StatePublisher, Subscription};

use super::{
    FallbackResolver, NarrationError, ProgressReport, Resolution, ResolverConfig,
    SettingsController,
};

/// 引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 自然结束后进入下一条目前的停顿
    pub transition_delay: Duration,
    pub default_speed: f32,
    pub recitation_base_url: String,
    pub assets_base_url: String,
    /// 含 `{story_id}` 与 `{section_id}` 占位符
    pub prebaked_template: String,
    pub resolver: ResolverConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transition_delay: Duration::from_millis(500),
            default_speed: 1.0,
            recitation_base_url: "https://cdn.islamic.network/quran/audio".to_string(),
            assets_base_url: "http://localhost:3000".to_string(),
            prebaked_template: "/assets/adult/audio/{story_id}-{section_id}.mp3".to_string(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// 引擎依赖的外部端口
pub struct NarrationPorts {
    pub speech: Arc<dyn SpeechSynthesisPort>,
    pub probe: Arc<dyn AssetProbePort>,
    /// 播放后端，按顺序选取第一个接受来源的后端
    pub backends: Vec<Arc<dyn PlaybackPort>>,
    pub clock: Arc<dyn ClockPort>,
}

/// 当前持有的后端资源
#[derive(Debug, Clone, Copy)]
struct ActiveResource {
    backend: usize,
    ticket: PlaybackTicket,
    via_fallback: bool,
}

/// 可变会话状态
struct Session {
    queue: Vec<NarrationQueueItem>,
    state: NarrationState,
    generation: u64,
    next_ticket: u64,
    active: Option<ActiveResource>,
    /// 暂停期间到期的前进，等待 resume
    advance_held: bool,
    settings: SettingsController,
}

/// 异步结果提交给状态机时的结局
enum CommitOutcome {
    Started,
    Stale,
    Failed(NarrationError),
}

struct EngineInner {
    config: EngineConfig,
    resolver: FallbackResolver,
    backends: Vec<Arc<dyn PlaybackPort>>,
    clock: Arc<dyn ClockPort>,
    publisher: StatePublisher,
    events: PlaybackEventSender,
    runtime: Handle,
    session: Mutex<Session>,
}

/// 叙述播放引擎
///
/// 显式构造、显式持有的会话对象；多个实例之间没有共享状态。
/// 控制方法从不返回错误，失败只会体现在 `NarrationState.error` 中。
pub struct NarrationEngine {
    inner: Arc<EngineInner>,
}

impl NarrationEngine {
    /// 创建引擎并启动后端事件循环
    ///
    /// 必须在 tokio 运行时内调用
    pub fn new(config: EngineConfig, catalog: ReciterCatalog, ports: NarrationPorts) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let resolver = FallbackResolver::new(
            config.resolver.clone(),
            ports.speech,
            ports.probe,
            ports.clock.clone(),
        );
        let settings = SettingsController::new(catalog, config.default_speed);

        let inner = Arc::new(EngineInner {
            config,
            resolver,
            backends: ports.backends,
            clock: ports.clock,
            publisher: StatePublisher::new(),
            events: events_tx,
            runtime: Handle::current(),
            session: Mutex::new(Session {
                queue: Vec::new(),
                state: NarrationState::default(),
                generation: 0,
                next_ticket: 0,
                active: None,
                advance_held: false,
                settings,
            }),
        });

        inner
            .runtime
            .spawn(run_event_loop(Arc::downgrade(&inner), events_rx));

        tracing::info!(
            backends = inner.backends.len(),
            "NarrationEngine started"
        );

        Self { inner }
    }

    // ------------------------------------------------------------------
    // narrate*
    // ------------------------------------------------------------------

    /// 朗读单个章节
    pub fn narrate_section(&self, section: &Section, story: &Story) {
        self.inner.transition(|inner, session| {
            let items = inner.queue_builder(session).build_section_queue(
                section,
                &story.id,
                &story.prophet_name,
            );
            inner.begin(session, items, story, Some(section.id.clone()));
        });
    }

    /// 朗读完整故事
    pub fn narrate_full_story(&self, story: &Story) {
        self.inner.transition(|inner, session| {
            let items = inner.queue_builder(session).build_full_story_queue(story);
            inner.begin(session, items, story, None);
        });
    }

    /// 从指定章节开始朗读
    pub fn narrate_from_section(&self, story: &Story, start_index: usize) {
        self.inner.transition(|inner, session| {
            let items = inner
                .queue_builder(session)
                .build_from_section_queue(story, start_index);
            let section_id = story.sections.get(start_index).map(|s| s.id.clone());
            inner.begin(session, items, story, section_id);
        });
    }

    // ------------------------------------------------------------------
    // 播放控制
    // ------------------------------------------------------------------

    /// 暂停当前资源；不在播放时无操作
    pub fn pause(&self) {
        self.inner.transition(|inner, session| {
            if !session.state.is_playing {
                return;
            }

            if let Some(active) = session.active {
                inner.backends[active.backend].pause();
            }
            session.state.is_playing = false;
            session.state.is_paused = true;
            inner.publish(session);

            tracing::info!(index = session.state.current_index, "Narration paused");
        });
    }

    /// 恢复暂停的资源；没有暂停时无操作
    ///
    /// 暂停期间当前条目已结束的，恢复时直接前进到下一条目
    pub fn resume(&self) {
        self.inner.transition(|inner, session| {
            if !session.state.is_paused {
                return;
            }

            session.state.is_playing = true;
            session.state.is_paused = false;
            tracing::info!(index = session.state.current_index, "Narration resumed");

            if session.advance_held {
                session.advance_held = false;
                inner.next(session);
                return;
            }

            if let Some(active) = session.active {
                inner.backends[active.backend].resume();
            }
            inner.publish(session);
        });
    }

    /// 停止并丢弃队列与全部进度
    pub fn stop(&self) {
        self.inner.transition(|inner, session| {
            session.generation += 1;
            session.advance_held = false;
            inner.release(session);
            session.queue.clear();
            session.state = NarrationState::default();
            inner.publish(session);

            tracing::info!("Narration stopped");
        });
    }

    /// 跳到下一条目；已在最后一条时无操作
    pub fn skip_to_next(&self) {
        self.inner.transition(|inner, session| {
            if session.state.current_item.is_none() {
                return;
            }
            let next = session.state.current_index + 1;
            if next >= session.queue.len() {
                return;
            }
            inner.jump(session, next);
        });
    }

    /// 跳到上一条目；已在第一条时无操作
    pub fn skip_to_previous(&self) {
        self.inner.transition(|inner, session| {
            if session.state.current_item.is_none() || session.state.current_index == 0 {
                return;
            }
            let previous = session.state.current_index - 1;
            inner.jump(session, previous);
        });
    }

    /// 跳到指定章节的第一个条目；找不到时无操作
    pub fn skip_to_section(&self, section_id: &str) {
        self.inner.transition(|inner, session| {
            let Some(index) = session
                .queue
                .iter()
                .position(|item| item.section_id() == Some(section_id))
            else {
                tracing::debug!(section_id = %section_id, "Section not in queue, skip ignored");
                return;
            };
            inner.jump(session, index);
        });
    }

    // ------------------------------------------------------------------
    // 设置
    // ------------------------------------------------------------------

    /// 设置朗诵者，只影响之后构建的队列；未知 ID 返回 false
    pub fn set_reciter(&self, identifier: &str) -> bool {
        self.inner.session().settings.set_reciter(identifier)
    }

    /// 设置播放速度（限制在 [0.5, 2.0]），立即作用于当前资源，返回实际值
    pub fn set_speed(&self, multiplier: f32) -> f32 {
        let mut session = self.inner.session();
        let speed = session.settings.set_speed(multiplier);
        if let Some(active) = session.active {
            self.inner.backends[active.backend].set_rate(speed);
        }
        tracing::debug!(speed = speed, "Playback speed set");
        speed
    }

    pub fn speed(&self) -> f32 {
        self.inner.session().settings.speed()
    }

    pub fn reciter(&self) -> Reciter {
        self.inner.session().settings.reciter().clone()
    }

    // ------------------------------------------------------------------
    // 观察
    // ------------------------------------------------------------------

    /// 当前状态快照
    pub fn get_state(&self) -> Arc<NarrationState> {
        self.inner.publisher.snapshot()
    }

    /// 订阅状态变化，订阅时立即收到当前快照
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&NarrationState) + Send + Sync + 'static,
    {
        self.inner.publisher.subscribe(listener)
    }

    /// 异步观察通道
    pub fn watch(&self) -> watch::Receiver<Arc<NarrationState>> {
        self.inner.publisher.watch()
    }

    /// 当前队列副本
    pub fn queue(&self) -> Vec<NarrationQueueItem> {
        self.inner.session().queue.clone()
    }

    /// 估算故事时长（分钟）
    pub fn estimate_story_duration(story: &Story) -> u32 {
        estimate_story_duration(story)
    }

    pub fn format_duration(minutes: u32) -> String {
        format_duration(minutes)
    }
}

impl Drop for NarrationEngine {
    fn drop(&mut self) {
        let mut session = self.inner.session();
        session.generation += 1;
        self.inner.release(&mut session);
    }
}

impl EngineInner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 在会话锁内执行一次状态迁移，释放锁之后再通知订阅者
    fn transition<R>(self: &Arc<Self>, f: impl FnOnce(&Arc<Self>, &mut Session) -> R) -> R {
        let result = {
            let mut session = self.session();
            f(self, &mut *session)
        };
        self.publisher.flush();
        result
    }

    /// 暂存快照；由外层的 `transition` 负责派发
    fn publish(&self, session: &Session) {
        self.publisher.stage(&session.state);
    }

    fn queue_builder(&self, session: &Session) -> QueueBuilder {
        QueueBuilder::new(
            session.settings.reciter().clone(),
            &self.config.recitation_base_url,
            &self.config.assets_base_url,
            &self.config.prebaked_template,
        )
    }

    /// 释放当前后端资源
    fn release(&self, session: &mut Session) {
        if let Some(active) = session.active.take() {
            let backend = &self.backends[active.backend];
            backend.stop();
            tracing::debug!(
                backend = backend.name(),
                ticket = %active.ticket,
                "Playback resource released"
            );
        }
    }

    /// 整体替换队列并开始播放第一个条目
    fn begin(
        self: &Arc<Self>,
        session: &mut Session,
        items: Vec<NarrationQueueItem>,
        story: &Story,
        section_id: Option<String>,
    ) {
        session.generation += 1;
        session.advance_held = false;
        self.release(session);

        let session_id = Uuid::new_v4();
        let total_items = items.len();
        session.queue = items;
        session.state = NarrationState {
            is_playing: total_items > 0,
            is_loading: total_items > 0,
            total_items,
            current_section_id: section_id,
            current_story_id: Some(story.id.clone()),
            current_prophet_name: Some(story.prophet_name.clone()),
            session_id: Some(session_id),
            ..Default::default()
        };

        tracing::info!(
            session_id = %session_id,
            story_id = %story.id,
            total_items = total_items,
            "Narration queue replaced"
        );

        if total_items == 0 {
            self.publish(session);
            return;
        }

        self.launch(session, 0);
    }

    /// 手动跳转：立即开始，不经过过渡延迟
    fn jump(self: &Arc<Self>, session: &mut Session, index: usize) {
        session.state.is_paused = false;
        session.state.is_playing = true;
        tracing::info!(
            from = session.state.current_index,
            to = index,
            "Skipping narration item"
        );
        self.launch(session, index);
    }

    /// 切换到指定条目并异步解析来源
    fn launch(self: &Arc<Self>, session: &mut Session, index: usize) {
        session.generation += 1;
        session.advance_held = false;
        self.release(session);

        let item = session.queue[index].clone();
        let generation = session.generation;

        let state = &mut session.state;
        state.current_index = index;
        state.is_loading = true;
        state.is_playing = !state.is_paused;
        state.progress = 0.0;
        state.current_time = 0.0;
        state.duration = 0.0;
        if let Some(section_id) = item.section_id() {
            state.current_section_id = Some(section_id.to_string());
        }
        state.current_item = Some(item.clone());
        self.publish(session);

        tracing::debug!(
            session_id = ?session.state.session_id,
            index = index,
            kind = %item.kind(),
            generation = generation,
            "Narration item loading"
        );

        let inner = self.clone();
        self.runtime.spawn(async move {
            let resolution = inner.resolver.resolve(&item).await;
            inner.drive(generation, item, resolution).await;
        });
    }

    /// 执行决策结果，直到条目开始播放、被跳过或已过期
    ///
    /// 回退来源只会尝试一次，因此循环最多两轮
    async fn drive(self: Arc<Self>, generation: u64, item: NarrationQueueItem, resolution: Resolution) {
        let mut resolution = resolution;
        loop {
            match resolution {
                Resolution::Skip { error } => {
                    self.transition(|inner, session| {
                        if session.generation == generation {
                            inner.finish_item(session, error);
                        }
                    });
                    return;
                }
                Resolution::Play {
                    source,
                    via_fallback,
                } => match self.commit(generation, source, via_fallback).await {
                    CommitOutcome::Started | CommitOutcome::Stale => return,
                    CommitOutcome::Failed(failure) => {
                        resolution = self.resolver.recover(&item, failure, via_fallback).await;
                    }
                },
            }
        }
    }

    /// 把来源交给后端
    async fn commit(
        &self,
        generation: u64,
        source: PlaybackSource,
        via_fallback: bool,
    ) -> CommitOutcome {
        let (backend, ticket, rate) = {
            let mut session = self.session();
            if session.generation != generation {
                return CommitOutcome::Stale;
            }

            let Some(index) = self.backends.iter().position(|b| b.accepts(&source)) else {
                return CommitOutcome::Failed(NarrationError::playback(format!(
                    "no backend accepts {}",
                    source.describe()
                )));
            };

            self.release(&mut session);
            session.next_ticket += 1;
            let ticket = PlaybackTicket(session.next_ticket);
            session.active = Some(ActiveResource {
                backend: index,
                ticket,
                via_fallback,
            });

            tracing::debug!(
                backend = self.backends[index].name(),
                ticket = %ticket,
                source = %source.describe(),
                "Starting playback"
            );

            (self.backends[index].clone(), ticket, session.settings.speed())
        };

        let result = backend
            .start(ticket, source, rate, self.events.clone())
            .await;

        let mut session = self.session();
        let current = session.generation == generation
            && session.active.map(|a| a.ticket) == Some(ticket);
        if !current {
            return CommitOutcome::Stale;
        }

        match result {
            Ok(()) => {
                // 加载期间的暂停与改速在资源就绪后补上
                let speed = session.settings.speed();
                if speed != rate {
                    backend.set_rate(speed);
                }
                if session.state.is_paused {
                    backend.pause();
                }
                CommitOutcome::Started
            }
            Err(e) => {
                tracing::warn!(
                    backend = backend.name(),
                    ticket = %ticket,
                    error = %e,
                    "Playback failed to start"
                );
                session.active = None;
                backend.stop();
                CommitOutcome::Failed(NarrationError::playback(e.to_string()))
            }
        }
    }

    /// 条目结束（自然结束或被跳过），过渡延迟后前进
    fn finish_item(self: &Arc<Self>, session: &mut Session, error: Option<NarrationError>) {
        self.release(session);
        session.state.is_loading = false;
        if let Some(error) = error {
            tracing::warn!(
                index = session.state.current_index,
                error = %error,
                "Narration item skipped"
            );
            session.state.error = Some(error.to_string());
        }
        self.publish(session);

        let generation = session.generation;
        let delay = self.config.transition_delay;
        let inner = self.clone();
        self.runtime.spawn(async move {
            inner.clock.sleep(delay).await;
            inner.advance(generation);
        });
    }

    /// 过渡延迟结束后前进游标；期间发生跳转或停止时作废，暂停时留到 resume
    fn advance(self: &Arc<Self>, generation: u64) {
        self.transition(|inner, session| {
            if session.generation != generation {
                return;
            }

            if session.state.is_paused {
                session.advance_held = true;
                tracing::debug!(
                    index = session.state.current_index,
                    "Narration paused, holding advance"
                );
                return;
            }

            inner.next(session);
        });
    }

    /// 开始下一条目，或在队列末尾结束
    fn next(self: &Arc<Self>, session: &mut Session) {
        let next = session.state.current_index + 1;
        if next >= session.queue.len() {
            self.complete(session);
        } else {
            self.launch(session, next);
        }
    }

    /// 队列播完
    fn complete(&self, session: &mut Session) {
        session.generation += 1;
        session.advance_held = false;
        self.release(session);

        let total_items = session.queue.len();
        let state = &mut session.state;
        state.is_playing = false;
        state.is_paused = false;
        state.is_loading = false;
        state.current_item = None;
        state.current_index = total_items;
        state.progress = 100.0;
        self.publish(session);

        tracing::info!(
            session_id = ?session.state.session_id,
            total_items = total_items,
            "Narration completed"
        );
    }

    /// 处理后端事件
    fn on_playback_event(self: &Arc<Self>, event: PlaybackEvent) {
        self.transition(|inner, session| inner.apply_event(session, event));
    }

    fn apply_event(self: &Arc<Self>, session: &mut Session, event: PlaybackEvent) {
        let Some(active) = session.active.filter(|a| a.ticket == event.ticket) else {
            tracing::trace!(ticket = %event.ticket, "Dropping stale playback event");
            return;
        };

        match event.kind {
            PlaybackEventKind::Started { duration } => {
                let report = ProgressReport::normalize(0.0, duration);
                let state = &mut session.state;
                state.is_loading = false;
                state.error = None;
                state.current_time = report.current_time;
                state.duration = report.duration;
                state.progress = report.progress;
                self.publish(session);

                tracing::info!(
                    index = session.state.current_index,
                    backend = self.backends[active.backend].name(),
                    duration = duration,
                    "Narration item started"
                );
            }
            PlaybackEventKind::Progress {
                current_time,
                duration,
            } => {
                let report = ProgressReport::normalize(current_time, duration);
                let state = &mut session.state;
                state.current_time = report.current_time;
                state.duration = report.duration;
                state.progress = report.progress;
                self.publish(session);
            }
            PlaybackEventKind::Ended => {
                let report = ProgressReport::finished(session.state.duration);
                session.state.current_time = report.current_time;
                session.state.progress = report.progress;
                tracing::debug!(index = session.state.current_index, "Narration item ended");
                self.finish_item(session, None);
            }
            PlaybackEventKind::Error(message) => {
                tracing::warn!(
                    index = session.state.current_index,
                    backend = self.backends[active.backend].name(),
                    error = %message,
                    "Playback error reported"
                );
                let failure = NarrationError::playback(message);
                self.release(session);
                session.state.is_loading = true;
                session.state.error = Some(failure.to_string());
                self.publish(session);

                let Some(item) = session.state.current_item.clone() else {
                    return;
                };
                let generation = session.generation;
                let inner = self.clone();
                self.runtime.spawn(async move {
                    let resolution = inner
                        .resolver
                        .recover(&item, failure, active.via_fallback)
                        .await;
                    inner.drive(generation, item, resolution).await;
                });
            }
        }
    }
}

/// 后端事件循环；引擎释放后自动退出
async fn run_event_loop(inner: Weak<EngineInner>, mut events: PlaybackEventReceiver) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.on_playback_event(event);
    }
    tracing::debug!("Playback event loop stopped");
}
