//! Spatial emitter seam.
//!
//! # Overview
//!
//! The host engine owns the actual 3D audio sources. The core hands it a
//! rendered [`PlayableAudio`] and a [`PlaybackTarget`] through
//! [`EmitterHost`] and later asks for the emitter back by [`EmitterId`].
//!
//! [`EmitterHost`] is object-safe and `Send + Sync` so it can be held behind
//! an `Arc<dyn EmitterHost>` and despawned from a teardown task.
//!
//! [`LoggingEmitterHost`] is a headless implementation that only logs and
//! tracks live emitters. The demo binary and the tests use it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Handle to a moving transform owned by the host (e.g. a puppet's head).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// Where an emitter plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackTarget {
    /// Fixed world position.
    Point(Vec3),
    /// Follow a host transform for the emitter's lifetime.
    Anchor(AnchorId),
}

// ---------------------------------------------------------------------------
// PlayableAudio
// ---------------------------------------------------------------------------

/// Fully rendered mono float audio, ready for an emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl PlayableAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EmitterHost
// ---------------------------------------------------------------------------

/// Identifier the host assigns to a spawned emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(pub u64);

#[derive(Debug, Clone, Error)]
pub enum EmitterError {
    /// The target no longer resolves (anchor destroyed, point off-world).
    #[error("playback target is not valid: {0}")]
    InvalidTarget(String),

    #[error("emitter host failure: {0}")]
    Host(String),
}

/// Object-safe, thread-safe interface to the host's spatial audio.
///
/// # Contract
///
/// - `spawn` starts playing `audio` immediately at `target`.
/// - `despawn` releases the emitter and anything attached to it. Despawning an
///   unknown or already released id is a no-op.
pub trait EmitterHost: Send + Sync {
    /// Whether `target` can currently carry an emitter.
    fn is_valid_target(&self, target: &PlaybackTarget) -> bool {
        match target {
            PlaybackTarget::Point(p) => p.is_finite(),
            PlaybackTarget::Anchor(_) => true,
        }
    }

    fn spawn(&self, target: PlaybackTarget, audio: PlayableAudio) -> Result<EmitterId, EmitterError>;

    fn despawn(&self, id: EmitterId);
}

// Compile-time assertion: Arc<dyn EmitterHost> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Arc<dyn EmitterHost>) {}
};

// ---------------------------------------------------------------------------
// LoggingEmitterHost
// ---------------------------------------------------------------------------

/// Headless host: logs spawns and despawns and tracks what is still live.
#[derive(Debug, Default)]
pub struct LoggingEmitterHost {
    next_id: AtomicU64,
    live: Mutex<HashSet<EmitterId>>,
}

impl LoggingEmitterHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of emitters spawned and not yet despawned.
    pub fn live_count(&self) -> usize {
        self.lock_live().len()
    }

    fn lock_live(&self) -> std::sync::MutexGuard<'_, HashSet<EmitterId>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EmitterHost for LoggingEmitterHost {
    fn spawn(&self, target: PlaybackTarget, audio: PlayableAudio) -> Result<EmitterId, EmitterError> {
        let id = EmitterId(self.next_id.fetch_add(1, Ordering::Relaxed));
        log::info!(
            "emitter {}: playing {:.2}s at {:?}",
            id.0,
            audio.duration().as_secs_f32(),
            target
        );
        self.lock_live().insert(id);
        Ok(id)
    }

    fn despawn(&self, id: EmitterId) {
        if self.lock_live().remove(&id) {
            log::info!("emitter {}: released", id.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_sample_count() {
        let audio = PlayableAudio::new(vec![0.0; 24_000], 48_000);
        assert_eq!(audio.duration(), Duration::from_millis(500));
        assert_eq!(PlayableAudio::new(vec![0.0; 10], 0).duration(), Duration::ZERO);
    }

    #[test]
    fn non_finite_points_are_invalid() {
        let host = LoggingEmitterHost::new();
        assert!(host.is_valid_target(&PlaybackTarget::Point(Vec3::new(1.0, 2.0, 3.0))));
        assert!(!host.is_valid_target(&PlaybackTarget::Point(Vec3::new(f32::NAN, 0.0, 0.0))));
        assert!(host.is_valid_target(&PlaybackTarget::Anchor(AnchorId(4))));
    }

    #[test]
    fn logging_host_tracks_live_emitters() {
        let host = LoggingEmitterHost::new();
        let a = host
            .spawn(PlaybackTarget::Point(Vec3::default()), PlayableAudio::new(vec![0.0; 4], 4))
            .unwrap();
        let b = host
            .spawn(PlaybackTarget::Anchor(AnchorId(1)), PlayableAudio::new(vec![0.0; 4], 4))
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(host.live_count(), 2);

        host.despawn(a);
        host.despawn(a);
        assert_eq!(host.live_count(), 1);
    }
}
