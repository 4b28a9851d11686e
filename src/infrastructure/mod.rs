//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod clock;
pub mod events;
pub mod playback;

pub use adapters::{FakeTtsClient, HttpAssetProbe, HttpMediaSource, HttpTtsClient};
pub use clock::TokioClock;
pub use events::{StatePublisher, Subscription};
pub use playback::{BufferedPlayback, StreamingPlayback};
