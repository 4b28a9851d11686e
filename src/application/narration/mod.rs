//! Narration - 叙述播放用例
//!
//! - engine: 播放状态机（队列游标、唯一会话状态、控制操作）
//! - fallback: 条目来源决策（探测、合成回退、跳过）
//! - progress: 进度换算
//! - settings: 朗诵者与播放速度
//! - error: 非致命播放错误

mod engine;
mod error;
mod fallback;
mod progress;
mod settings;

pub use engine::{EngineConfig, NarrationEngine, NarrationPorts};
pub use error::NarrationError;
pub use fallback::{prepare_speech_text, FallbackResolver, Resolution, ResolverConfig, VoiceMap};
pub use progress::ProgressReport;
pub use settings::{clamp_speed, SettingsController, MAX_SPEED, MIN_SPEED};
