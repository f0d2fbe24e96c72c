use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use anyhow::Result;

use super::alsa_device;
use super::audio_system::AudioConfig;
use crate::protocol::AudioFrame;

pub(super) fn play_thread(
    config: &AudioConfig,
    mut frame_rx: mpsc::Receiver<AudioFrame>,
    running: &AtomicBool,
) -> Result<()> {
    // 1. Open the ALSA playback device (mono i16)
    let period_size_opt = if config.playback_period_size > 0 {
        Some(config.playback_period_size)
    } else {
        None
    };
    let (pcm, params) = alsa_device::open_playback(
        &config.playback_device,
        config.sample_rate,
        period_size_opt,
    )?;

    let io = pcm.io_i16()?;

    log::info!(
        "Playback started: rate={}, period={}",
        params.sample_rate,
        params.period_size,
    );

    while running.load(Ordering::Relaxed) {
        // Block until a frame arrives (or the queue closes)
        match frame_rx.blocking_recv() {
            Some(frame) => {
                let samples = frame.samples();
                if samples.is_empty() {
                    continue;
                }
                // Write to ALSA with a retry loop to handle short writes
                // and XRUN recovery without losing samples
                let total_frames = samples.len();
                let mut frames_written = 0;
                while frames_written < total_frames {
                    match io.writei(&samples[frames_written..]) {
                        Ok(n) => {
                            frames_written += n;
                        }
                        Err(e) => {
                            log::warn!("ALSA playback error: {}, recovering...", e);
                            if let Err(e2) = pcm.prepare() {
                                log::error!("Failed to recover PCM playback: {}", e2);
                                break;
                            }
                            // After recovery, the loop retries the remaining samples
                        }
                    }
                }
            }
            None => {
                log::info!("Playback queue closed");
                break;
            }
        }
    }

    log::info!("Playback stopped");
    Ok(())
}
