//! Audio Adapter - 音频解码

mod decoder;

pub use decoder::{decode_audio, measure_duration, MediaInfo};

#[cfg(test)]
pub(crate) use decoder::tests::create_test_wav;
