/// 系统运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// Connected, no audio flowing in either direction
    Idle,
    /// Microphone frames are being forwarded to the server
    Streaming,
    /// Inbound frames are being delivered to the sink
    Receiving,
    /// Channel is down, frames are being dropped
    NetworkError,
}
