//! Clock Port - 时钟与调度抽象
//!
//! 所有延迟（合成前延迟、条目过渡、进度 tick）都经由该端口，
//! 测试中可以用暂停的 tokio 时间驱动

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait ClockPort: Send + Sync {
    /// 单调时间（自时钟创建起）
    fn now(&self) -> Duration;

    /// 挂起指定时长
    async fn sleep(&self, duration: Duration);
}
