//! State Publisher Implementation
//!
//! 叙述状态快照的订阅总线：回调订阅者 + tokio watch 通道
//!
//! 发布分两步：`stage` 在状态迁移的临界区内给快照编号并放入发件箱，
//! `flush` 在临界区外按编号顺序回调订阅者。
//! 回调中可以直接调用引擎的控制方法，新产生的快照由正在派发的一方接着送出。

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;

use crate::domain::narration::NarrationState;

/// 状态回调
pub type StateListener = Arc<dyn Fn(&NarrationState) + Send + Sync>;

struct Registered {
    /// 订阅时已编号的最后一个快照，之前的快照不再派发给它
    since: u64,
    listener: StateListener,
}

type ListenerMap = DashMap<u64, Registered>;

enum Delivery {
    /// 发给所有在该快照之前订阅的回调
    Broadcast { seq: u64, state: Arc<NarrationState> },
    /// 订阅时的首次通知
    Welcome { id: u64, state: Arc<NarrationState> },
}

#[derive(Default)]
struct Outbox {
    seq: u64,
    pending: VecDeque<Delivery>,
}

/// 派发标记，离开作用域（包括回调 panic）时复位
struct Dispatching<'a>(&'a AtomicBool);

impl Drop for Dispatching<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 状态发布器
pub struct StatePublisher {
    listeners: Arc<ListenerMap>,
    next_id: AtomicU64,
    channel: watch::Sender<Arc<NarrationState>>,
    outbox: Mutex<Outbox>,
    dispatching: AtomicBool,
}

impl StatePublisher {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(NarrationState::default()));
        Self {
            listeners: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            channel: tx,
            outbox: Mutex::new(Outbox::default()),
            dispatching: AtomicBool::new(false),
        }
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 注册订阅者，并以当前快照通知一次
    ///
    /// 在另一次派发进行中订阅时，首次通知由那一轮派发送出
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&NarrationState) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut outbox = self.outbox();
            self.listeners.insert(
                id,
                Registered {
                    since: outbox.seq,
                    listener: Arc::new(listener),
                },
            );
            let state = self.snapshot();
            outbox.pending.push_back(Delivery::Welcome { id, state });
        }
        self.flush();

        tracing::debug!(subscriber_id = id, "State subscriber registered");

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// 异步订阅通道（总是持有最新快照）
    pub fn watch(&self) -> watch::Receiver<Arc<NarrationState>> {
        self.channel.subscribe()
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<NarrationState> {
        self.channel.borrow().clone()
    }

    /// 记录新快照：更新 watch 通道并放入发件箱，不回调订阅者
    pub fn stage(&self, state: &NarrationState) {
        let snapshot = Arc::new(state.clone());
        let mut outbox = self.outbox();
        outbox.seq += 1;
        let seq = outbox.seq;
        self.channel.send_replace(snapshot.clone());
        outbox.pending.push_back(Delivery::Broadcast {
            seq,
            state: snapshot,
        });
    }

    /// 按顺序把发件箱中的快照派发给订阅者
    ///
    /// 已有派发在进行（包括从回调中重入）时直接返回
    pub fn flush(&self) {
        loop {
            if self
                .dispatching
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            {
                let _dispatching = Dispatching(&self.dispatching);
                while let Some(delivery) = self.next_delivery() {
                    self.deliver(delivery);
                }
            }

            // 复位之前别的线程可能刚放入快照并已返回
            if self.outbox().pending.is_empty() {
                return;
            }
        }
    }

    /// 发布新快照
    pub fn publish(&self, state: &NarrationState) {
        self.stage(state);
        self.flush();
    }

    /// 取出下一条待派发快照；发件箱的锁不能带进回调
    fn next_delivery(&self) -> Option<Delivery> {
        self.outbox().pending.pop_front()
    }

    fn deliver(&self, delivery: Delivery) {
        match delivery {
            Delivery::Broadcast { seq, state } => {
                let listeners: Vec<StateListener> = self
                    .listeners
                    .iter()
                    .filter(|entry| entry.since < seq)
                    .map(|entry| entry.listener.clone())
                    .collect();
                for listener in listeners {
                    listener(&state);
                }
            }
            Delivery::Welcome { id, state } => {
                let listener = self.listeners.get(&id).map(|entry| entry.listener.clone());
                if let Some(listener) = listener {
                    listener(&state);
                }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for StatePublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// 订阅句柄
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 取消订阅
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(&self.id);
            tracing::debug!(subscriber_id = self.id, "State subscriber removed");
        }
    }
}
