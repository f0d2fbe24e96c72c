//! audio - Microphone capture, playback, and fixed-point conversion
//!
//! Uses ALSA for audio I/O. Capture reads floating-point buffers from the
//! device and quantizes them to the signed 16-bit wire format; playback
//! writes received frames straight back to a device.

mod alsa_device;
mod audio_system;
mod capture;
mod playback;
pub mod quantize;
pub mod sink;

pub use audio_system::{AudioConfig, AudioSystem};
pub use capture::CaptureEvent;
pub use sink::{FrameSink, LogSink, PlaybackSink, create_sink};
