//! Media Adapter - 可寻址音频加载

mod http_media_source;

pub use http_media_source::{extension_hint, HttpMediaSource};
