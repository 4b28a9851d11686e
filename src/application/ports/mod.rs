//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod asset_probe;
mod clock;
mod media_source;
mod playback;
mod speech_synthesis;

pub use asset_probe::{AssetProbePort, ProbeError};
pub use clock::ClockPort;
pub use media_source::{AudioBuffer, LoadedMedia, MediaError, MediaSourcePort};
pub use playback::{
    PlaybackError, PlaybackEvent, PlaybackEventKind, PlaybackEventReceiver, PlaybackEventSender,
    PlaybackPort, PlaybackSource, PlaybackTicket,
};
pub use speech_synthesis::{SpeechSynthesisPort, SynthesisRequest, TtsError};
