//! Narration Context - 叙述限界上下文
//!
//! 职责:
//! - 队列条目（按来源区分的标签联合）
//! - 播放状态快照
//! - 队列构建与时长估算（纯函数）

mod duration;
mod item;
mod queue_builder;
mod state;

pub use duration::{estimate_story_duration, format_duration};
pub use item::{
    NarrationItemKind, NarrationPayload, NarrationQueueItem, PrebakedItem, RecitationItem,
    SectionTag, SpeechItem, SpeechRole,
};
pub use queue_builder::{hadith_text, QueueBuilder};
pub use state::{NarrationPhase, NarrationState};
