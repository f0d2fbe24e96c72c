use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use anyhow::Result;

use super::alsa_device;
use super::audio_system::AudioConfig;
use super::quantize::quantize;
use crate::protocol::AudioFrame;

/// Events from the capture thread to the event loop.
#[derive(Debug)]
pub enum CaptureEvent {
    /// One quantized buffer's worth of microphone audio
    Frame(AudioFrame),
    /// The device is gone and will not recover; no more frames follow
    Ended,
}

pub(super) fn capture_thread(
    config: &AudioConfig,
    frame_tx: mpsc::Sender<CaptureEvent>,
    running: &AtomicBool,
) -> Result<()> {
    // 1. Open the ALSA capture device (mono float)
    let (pcm, params) = alsa_device::open_capture(
        &config.capture_device,
        config.sample_rate,
        config.frame_size,
    )?;

    let actual_rate = params.sample_rate;
    let period_size = params.period_size;

    // ALSA read buffer (mono f32, one period)
    let mut read_buf = vec![0f32; period_size];

    let io = pcm.io_f32()?;

    log::info!(
        "Capture started: rate={}, period={}",
        actual_rate,
        period_size,
    );

    while running.load(Ordering::Relaxed) {
        // Read one period from ALSA; a short or empty read still produces
        // a (possibly zero-length) frame
        match io.readi(&mut read_buf) {
            Ok(frames) => {
                let frame = AudioFrame::new(quantize(&read_buf[..frames]));
                if frame_tx.blocking_send(CaptureEvent::Frame(frame)).is_err() {
                    log::warn!("Failed to send captured frame, receiver dropped");
                    return Ok(());
                }
            }
            Err(e) => {
                log::warn!("ALSA capture error: {}, recovering...", e);
                if let Err(e2) = pcm.prepare() {
                    log::error!("Failed to recover PCM capture: {}", e2);
                    // Make the end of the stream observable instead of
                    // stalling silently
                    let _ = frame_tx.blocking_send(CaptureEvent::Ended);
                    break;
                }
            }
        }
    }

    log::info!("Capture stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_open_failure_emits_no_frames() {
        let config = AudioConfig {
            capture_device: "no-such-device:9,9".to_string(),
            ..AudioConfig::default()
        };
        let (tx, mut rx) = mpsc::channel(8);
        let running = AtomicBool::new(true);

        let result = capture_thread(&config, tx, &running);
        assert!(result.is_err());
        // The capture path aborted before producing anything.
        assert!(rx.try_recv().is_err());
    }
}
