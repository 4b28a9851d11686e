//! Tokio Clock - 基于 tokio 时间的时钟实现
//!
//! 测试中配合 `start_paused` 使用时，时间由运行时自动推进

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::application::ports::ClockPort;

pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClockPort for TokioClock {
    fn now(&self) -> Duration {
        Instant::now().duration_since(self.origin)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
