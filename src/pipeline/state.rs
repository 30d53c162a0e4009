//! Pipeline counters shared with whoever is watching the pipeline.
//!
//! [`PipelineStats`] is the single source of truth for what the pipeline has
//! done so far. [`SharedStats`] is a type alias for `Arc<Mutex<..>>`, cheap to
//! clone and safe to read from another thread.

use std::sync::{Arc, Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// PipelineStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Clips finalized by local capture.
    pub clips_captured: u64,

    /// Clips fully streamed to peers.
    pub clips_sent: u64,

    /// Sends aborted by the transport.
    pub transfers_failed: u64,

    /// Clips completely reassembled from peers.
    pub clips_received: u64,

    /// Malformed chunks refused by reassembly.
    pub chunks_rejected: u64,

    /// Clips that never reached disk (encode or storage failure).
    pub clips_lost: u64,

    /// Emitters started.
    pub playbacks: u64,

    /// Most recent failure, for display.
    pub last_error: Option<String>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// SharedStats
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`PipelineStats`].
///
/// Keep the lock for a short critical section only; never hold it across an
/// `.await`.
pub type SharedStats = Arc<Mutex<PipelineStats>>;

pub fn new_shared_stats() -> SharedStats {
    Arc::new(Mutex::new(PipelineStats::new()))
}

/// Lock `stats`, recovering the data if a previous holder panicked.
pub fn lock_stats(stats: &SharedStats) -> MutexGuard<'_, PipelineStats> {
    stats.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = PipelineStats::default();
        assert_eq!(stats.clips_captured, 0);
        assert_eq!(stats.playbacks, 0);
        assert!(stats.last_error.is_none());
    }

    #[test]
    fn shared_stats_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedStats>();
    }

    #[test]
    fn shared_stats_can_be_cloned_and_mutated() {
        let stats = new_shared_stats();
        let other = Arc::clone(&stats);

        lock_stats(&stats).clips_sent += 2;
        assert_eq!(lock_stats(&other).clips_sent, 2);
    }
}
