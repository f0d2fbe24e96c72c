//! Destinations for inbound audio frames.

use crate::protocol::AudioFrame;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Where received frames are delivered. Injected into the event loop so the
/// destination is an explicit choice, not ambient state.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn deliver(&self, frame: AudioFrame) -> Result<()>;
}

/// Logs each received frame.
pub struct LogSink;

#[async_trait]
impl FrameSink for LogSink {
    async fn deliver(&self, frame: AudioFrame) -> Result<()> {
        log::info!("Received audio frame: {} samples", frame.len());
        Ok(())
    }
}

/// Queues frames for the playback thread. The queue is bounded; when full,
/// the frame is dropped with a warning rather than stalling the event loop.
pub struct PlaybackSink {
    tx: mpsc::Sender<AudioFrame>,
}

impl PlaybackSink {
    pub fn new(tx: mpsc::Sender<AudioFrame>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameSink for PlaybackSink {
    async fn deliver(&self, frame: AudioFrame) -> Result<()> {
        if let Err(e) = self.tx.try_send(frame) {
            log::warn!("Playback queue unavailable, dropping frame: {}", e);
        }
        Ok(())
    }
}

/// Factory: build the configured sink. A playback sink also yields the
/// receiving end of its queue for the playback thread.
pub fn create_sink(
    kind: &str,
    queue_depth: usize,
) -> Result<(Box<dyn FrameSink>, Option<mpsc::Receiver<AudioFrame>>)> {
    match kind {
        "log" => Ok((Box::new(LogSink), None)),
        "playback" => {
            let (tx, rx) = mpsc::channel(queue_depth);
            Ok((Box::new(PlaybackSink::new(tx)), Some(rx)))
        }
        other => anyhow::bail!("Unsupported sink kind: {}", other),
    }
}
