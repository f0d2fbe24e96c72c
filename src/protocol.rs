//! Channel wire contract: the closed set of JSON control messages plus the
//! binary audio frame codec.
//!
//! Every transport message is either one JSON text message (tagged by
//! `type`) or one binary message carrying exactly one audio frame as raw
//! little-endian i16 samples. Malformed input is rejected here, at the
//! boundary, so consumers never see a half-valid message.

use anyhow::{Result, bail};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// JSON control messages exchanged over the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    /// Client signal: begin the remote log/data stream.
    StartStream,

    /// One remote log record.
    Log {
        level: String,
        message: String,
        time: String,
        name: String,
        function: String,
        line: u32,
    },

    /// Generic stream chunk.
    StreamData { data: String },
}

/// One fixed-duration chunk of mono audio: signed 16-bit samples at the
/// capture device's native rate. Zero-length frames are legal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioFrame {
    samples: Vec<i16>,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Encode as raw little-endian i16 bytes, one transport message's worth.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.samples.len() * 2);
        for &s in &self.samples {
            buf.put_i16_le(s);
        }
        buf.freeze()
    }

    /// Decode a binary channel payload. An odd byte count cannot be a
    /// sequence of 16-bit samples and is rejected.
    pub fn from_bytes(mut data: &[u8]) -> Result<Self> {
        if data.len() % 2 != 0 {
            bail!("audio frame payload has odd length {}", data.len());
        }
        let mut samples = Vec::with_capacity(data.len() / 2);
        while data.remaining() >= 2 {
            samples.push(data.get_i16_le());
        }
        Ok(Self { samples })
    }
}
