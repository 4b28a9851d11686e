//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechSynthesis、AssetProbe、MediaSource、Playback、Clock）
//! - narration: 叙述播放引擎及其协作者
//! - error: 应用层错误定义

pub mod error;
pub mod narration;
pub mod ports;

pub use error::ApplicationError;

pub use narration::{
    EngineConfig, FallbackResolver, NarrationEngine, NarrationError, NarrationPorts,
    ResolverConfig, VoiceMap,
};

pub use ports::{
    AssetProbePort, AudioBuffer, ClockPort, LoadedMedia, MediaError, MediaSourcePort,
    PlaybackError, PlaybackEvent, PlaybackEventKind, PlaybackPort, PlaybackSource,
    PlaybackTicket, ProbeError, SpeechSynthesisPort, SynthesisRequest, TtsError,
};
