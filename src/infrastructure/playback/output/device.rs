//! Device Output - rodio 默认输出设备
//!
//! `OutputStream` 不是 Send，因此由专用线程创建并持有，
//! 其余部分只使用可跨线程的 `OutputStreamHandle` 与 `Sink`。

use std::io::Cursor;
use std::sync::{mpsc, Arc};
use std::thread;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::{AudioClip, AudioOutput, OutputSink};
use crate::application::ports::PlaybackError;

const OUTPUT_NAME: &str = "device";

/// rodio sink
struct DeviceSink {
    sink: Sink,
}

impl OutputSink for DeviceSink {
    fn pause(&self) {
        self.sink.pause();
    }

    fn play(&self) {
        self.sink.play();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn set_speed(&self, rate: f32) {
        self.sink.set_speed(rate);
    }

    fn position(&self) -> f64 {
        self.sink.get_pos().as_secs_f64()
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    fn stop(&self) {
        self.sink.stop();
    }
}

/// 默认音频输出设备
pub struct DeviceOutput {
    handle: OutputStreamHandle,
    /// 丢弃时通知音频线程释放输出流
    _shutdown: mpsc::Sender<()>,
}

impl DeviceOutput {
    /// 打开系统默认输出设备
    pub fn open_default() -> Result<Self, PlaybackError> {
        let (handle_tx, handle_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("narrator-audio".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = handle_tx.send(Ok(handle));
                    // 发送端被丢弃时 recv 返回错误
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    tracing::debug!("Audio output stream closed");
                }
                Err(e) => {
                    let _ = handle_tx.send(Err(e.to_string()));
                }
            })
            .map_err(|e| PlaybackError::Output(e.to_string()))?;

        let handle = handle_rx
            .recv()
            .map_err(|e| PlaybackError::Output(e.to_string()))?
            .map_err(PlaybackError::Output)?;

        tracing::info!("Audio playback initialized on default output device");

        Ok(Self {
            handle,
            _shutdown: shutdown_tx,
        })
    }
}

impl AudioOutput for DeviceOutput {
    fn name(&self) -> &'static str {
        OUTPUT_NAME
    }

    fn open(&self, clip: AudioClip, rate: f32) -> Result<Box<dyn OutputSink>, PlaybackError> {
        let sink = Sink::try_new(&self.handle).map_err(|e| PlaybackError::Output(e.to_string()))?;
        sink.set_speed(rate);

        match clip {
            AudioClip::Encoded {
                data, format_hint, ..
            } => {
                let cursor = Cursor::new(Arc::clone(&data));
                let source = match format_hint.as_deref() {
                    Some("mp3") => Decoder::new_mp3(cursor),
                    Some("wav") => Decoder::new_wav(cursor),
                    _ => Decoder::new(cursor),
                }
                .map_err(|e| PlaybackError::LoadFailed(format!("decode failed: {}", e)))?;
                sink.append(source);
            }
            AudioClip::Pcm(buffer) => {
                if buffer.frames() == 0 {
                    return Err(PlaybackError::LoadFailed("empty audio buffer".to_string()));
                }
                sink.append(SamplesBuffer::new(
                    buffer.channels,
                    buffer.sample_rate,
                    buffer.samples.to_vec(),
                ));
            }
        }

        Ok(Box::new(DeviceSink { sink }))
    }
}
