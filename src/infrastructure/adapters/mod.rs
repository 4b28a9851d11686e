//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod audio;
pub mod media;
pub mod probe;
pub mod tts;

pub use media::HttpMediaSource;
pub use probe::HttpAssetProbe;
pub use tts::*;
