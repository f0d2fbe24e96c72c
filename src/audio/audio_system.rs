//! The AudioSystem that manages the capture and playback threads.
//!
//! Uses std::thread (NOT tokio tasks) for real-time audio I/O to avoid
//! contention with async network tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use anyhow::Result;

use super::capture::{CaptureEvent, capture_thread};
use super::playback::play_thread;
use crate::protocol::AudioFrame;

/// Audio system configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// ALSA capture device name (e.g. "default", "plughw:0,0")
    pub capture_device: String,
    /// ALSA playback device name
    pub playback_device: String,
    /// Desired sample rate (may be negotiated by hardware)
    pub sample_rate: u32,
    /// Samples per capture period; one period becomes one wire frame
    pub frame_size: usize,
    /// Desired ALSA playback period size (0 = let ALSA decide)
    pub playback_period_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            capture_device: "default".to_string(),
            playback_device: "default".to_string(),
            sample_rate: 44100,
            frame_size: 2048,
            playback_period_size: 1024,
        }
    }
}

/// Manages recording and playback in dedicated OS threads.
///
/// - Capture thread: ALSA f32 capture → quantize → `frame_tx`
/// - Playback thread (optional): `playback_rx` → ALSA i16 playback
pub struct AudioSystem {
    running: Arc<AtomicBool>,
    capture_handle: Option<JoinHandle<()>>,
    play_handle: Option<JoinHandle<()>>,
}

impl AudioSystem {
    /// Start the audio system.
    ///
    /// * `config`      - Audio configuration
    /// * `frame_tx`    - Sender for capture events to the event loop
    /// * `playback_rx` - Receiver of frames to play, if the playback sink
    ///                   is in use
    ///
    /// A capture device that cannot be opened logs one error and aborts the
    /// capture path; the rest of the system keeps running.
    pub fn start(
        config: AudioConfig,
        frame_tx: mpsc::Sender<CaptureEvent>,
        playback_rx: Option<mpsc::Receiver<AudioFrame>>,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));

        log::info!(
            "AudioSystem starting — capture: \"{}\", playback: \"{}\", rate: {}Hz, frame: {} samples",
            config.capture_device,
            config.playback_device,
            config.sample_rate,
            config.frame_size,
        );

        let capture_handle = {
            let running = running.clone();
            let config = config.clone();
            let abort_tx = frame_tx.clone();
            thread::Builder::new()
                .name("audio-capture".into())
                .spawn(move || {
                    if let Err(e) = capture_thread(&config, frame_tx, &running) {
                        log::error!("Capture thread error: {}", e);
                        let _ = abort_tx.blocking_send(CaptureEvent::Ended);
                    }
                })?
        };

        let play_handle = match playback_rx {
            Some(rx) => {
                let running = running.clone();
                let config = config.clone();
                Some(
                    thread::Builder::new()
                        .name("audio-playback".into())
                        .spawn(move || {
                            if let Err(e) = play_thread(&config, rx, &running) {
                                log::error!("Playback thread error: {}", e);
                            }
                        })?,
                )
            }
            None => None,
        };

        Ok(Self {
            running,
            capture_handle: Some(capture_handle),
            play_handle,
        })
    }

    /// Signal threads to stop and wait for the capture thread to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(h) = self.capture_handle.take() {
            let _ = h.join();
        }
        // Playback thread exits when its queue sender is dropped; detach it
        // here to avoid blocking.
        self.play_handle.take();
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}
