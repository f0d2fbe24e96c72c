//! Counters that make frame loss observable instead of silent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters for outbound frame traffic. Incremented from the event
/// loop, readable from anywhere holding the `Arc`.
#[derive(Debug, Default)]
pub struct LinkStats {
    frames_sent: AtomicU64,
    frames_dropped: AtomicU64,
}

impl LinkStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one frame dropped because the channel was not connected.
    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_accumulate() {
        let stats = LinkStats::new();
        assert_eq!(stats.frames_sent(), 0);
        assert_eq!(stats.frames_dropped(), 0);

        stats.record_sent();
        stats.record_sent();
        stats.record_dropped();

        assert_eq!(stats.frames_sent(), 2);
        assert_eq!(stats.frames_dropped(), 1);
    }
}
