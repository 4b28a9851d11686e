//! Narrator - 多来源叙述播放引擎
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Story: 故事、章节、经文、圣训记录
//! - Quran / Reciter: 经文编号与朗诵者目录
//! - Narration: 播放队列、队列构建、状态快照、时长估算
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechSynthesis, AssetProbe, MediaSource, Playback, Clock）
//! - Narration: 播放状态机、Fallback Resolver、设置
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP TTS Client, Asset Probe, Media Source, symphonia 解码
//! - Playback: 流式与缓冲播放后端
//! - Events: 状态订阅总线

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::NarrationEngine;
pub use config::{load_config, AppConfig};
