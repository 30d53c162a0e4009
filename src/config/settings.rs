//! Pipeline settings structs, defaults, bounds and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Settings for speech-triggered capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Duration of one voice frame in milliseconds (20 ms ⇒ 50 frames/s).
    pub frame_ms: u32,
    /// Seconds of continuous silence after which a capture is finalized.
    pub silence_timeout_secs: f32,
    /// Upper bound on a single clip; sizes the capture buffer.
    pub max_clip_secs: f32,
    /// Lower bound of the random delay before the next capture is armed.
    pub min_interval_secs: f32,
    /// Upper bound of the random delay before the next capture is armed.
    pub max_interval_secs: f32,
    /// RMS threshold used by the microphone source to flag voice activity.
    pub vad_threshold: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_ms: 20,
            silence_timeout_secs: 0.5,
            max_clip_secs: 10.0,
            min_interval_secs: 5.0,
            max_interval_secs: 30.0,
            vad_threshold: 0.02,
        }
    }
}

impl CaptureConfig {
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.frame_ms))
    }

    pub fn silence_timeout(&self) -> Duration {
        Duration::from_secs_f32(self.silence_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Settings for the per-speaker clip store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Maximum number of clips kept per speaker (oldest evicted first).
    pub max_samples_per_speaker: usize,
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_samples_per_speaker: 5,
            data_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TransferConfig
// ---------------------------------------------------------------------------

/// Settings for the chunked transfer protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes per chunk message.
    pub chunk_size: usize,
    /// Pause between two chunk messages, in milliseconds.
    pub pacing_ms: u64,
    /// Incomplete reassembly sessions idle for longer than this are dropped.
    pub session_ttl_secs: u64,
    /// Largest chunk count a receiver accepts for one transfer.
    pub max_chunks_per_transfer: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8 * 1024,
            pacing_ms: 125,
            session_ttl_secs: 30,
            max_chunks_per_transfer: 4_096,
        }
    }
}

impl TransferConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Settings for filtered spatial playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Allow one randomly chosen extra filter (pitch down/up, alien).
    pub extra_filter_enabled: bool,
    /// Cutoff of the muffling low-pass filter in Hz.
    pub low_pass_cutoff_hz: f32,
    /// Extra time the emitter lives past the end of the clip.
    pub teardown_margin_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            extra_filter_enabled: true,
            low_pass_cutoff_hz: 1_500.0,
            teardown_margin_ms: 250,
        }
    }
}

impl PlaybackConfig {
    pub fn teardown_margin(&self) -> Duration {
        Duration::from_millis(self.teardown_margin_ms)
    }
}

// ---------------------------------------------------------------------------
// IdentityConfig
// ---------------------------------------------------------------------------

/// Who the local participant is on the wire and on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub speaker_id: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            speaker_id: "local".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// MimicConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use voice_mimic::config::MimicConfig;
///
/// // Load (returns Default when file is missing)
/// let config = MimicConfig::load().unwrap().sanitized();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MimicConfig {
    pub identity: IdentityConfig,
    pub capture: CaptureConfig,
    pub storage: StorageConfig,
    pub transfer: TransferConfig,
    pub playback: PlaybackConfig,
}

impl MimicConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(MimicConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Clamp every numeric setting into its supported range.
    ///
    /// Hand-edited files can hold anything; the pipeline only ever sees
    /// sanitized values.
    pub fn sanitized(mut self) -> Self {
        let c = &mut self.capture;
        c.frame_ms = c.frame_ms.clamp(5, 100);
        c.silence_timeout_secs = c.silence_timeout_secs.clamp(0.1, 5.0);
        c.max_clip_secs = c.max_clip_secs.clamp(1.0, 60.0);
        c.min_interval_secs = c.min_interval_secs.clamp(0.0, 600.0);
        c.max_interval_secs = c.max_interval_secs.max(c.min_interval_secs).min(600.0);
        c.vad_threshold = c.vad_threshold.clamp(0.0, 1.0);

        let s = &mut self.storage;
        s.max_samples_per_speaker = s.max_samples_per_speaker.clamp(1, 100);

        let t = &mut self.transfer;
        t.chunk_size = t.chunk_size.clamp(512, 64 * 1024);
        t.pacing_ms = t.pacing_ms.min(5_000);
        t.session_ttl_secs = t.session_ttl_secs.clamp(1, 3_600);
        t.max_chunks_per_transfer = t.max_chunks_per_transfer.clamp(16, 65_536);

        let p = &mut self.playback;
        p.low_pass_cutoff_hz = p.low_pass_cutoff_hz.clamp(100.0, 20_000.0);
        p.teardown_margin_ms = p.teardown_margin_ms.min(10_000);

        if self.identity.speaker_id.trim().is_empty() {
            self.identity.speaker_id = IdentityConfig::default().speaker_id;
        }
        self
    }

    /// Root directory of the clip store.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().data_dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = MimicConfig::default();
        original.save_to(&path).expect("save");

        let loaded = MimicConfig::load_from(&path).expect("load");

        assert_eq!(original.identity.speaker_id, loaded.identity.speaker_id);
        assert_eq!(original.capture.frame_ms, loaded.capture.frame_ms);
        assert_eq!(
            original.capture.silence_timeout_secs,
            loaded.capture.silence_timeout_secs
        );
        assert_eq!(
            original.storage.max_samples_per_speaker,
            loaded.storage.max_samples_per_speaker
        );
        assert_eq!(original.transfer.chunk_size, loaded.transfer.chunk_size);
        assert_eq!(original.transfer.pacing_ms, loaded.transfer.pacing_ms);
        assert_eq!(
            original.playback.extra_filter_enabled,
            loaded.playback.extra_filter_enabled
        );
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = MimicConfig::load_from(&path).expect("should not error");
        assert_eq!(config.transfer.chunk_size, 8 * 1024);
        assert_eq!(config.capture.frame_ms, 20);
    }

    #[test]
    fn default_values() {
        let cfg = MimicConfig::default();

        assert_eq!(cfg.capture.frame_duration(), Duration::from_millis(20));
        assert_eq!(cfg.capture.silence_timeout(), Duration::from_millis(500));
        assert_eq!(cfg.storage.max_samples_per_speaker, 5);
        assert_eq!(cfg.transfer.pacing(), Duration::from_millis(125));
        assert!(cfg.playback.extra_filter_enabled);
        assert!(cfg.storage.data_dir.is_none());
    }

    /// A file that only sets a few keys keeps defaults for the rest.
    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[storage]\nmax_samples_per_speaker = 3\n").unwrap();

        let cfg = MimicConfig::load_from(&path).expect("load");
        assert_eq!(cfg.storage.max_samples_per_speaker, 3);
        assert_eq!(cfg.transfer.chunk_size, 8 * 1024);
        assert_eq!(cfg.identity.speaker_id, "local");
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let mut cfg = MimicConfig::default();
        cfg.capture.frame_ms = 0;
        cfg.capture.min_interval_secs = 20.0;
        cfg.capture.max_interval_secs = 10.0;
        cfg.storage.max_samples_per_speaker = 0;
        cfg.transfer.chunk_size = 1;
        cfg.transfer.max_chunks_per_transfer = u32::MAX;
        cfg.identity.speaker_id = "  ".into();

        let cfg = cfg.sanitized();
        assert_eq!(cfg.capture.frame_ms, 5);
        assert_eq!(cfg.capture.max_interval_secs, 20.0);
        assert_eq!(cfg.storage.max_samples_per_speaker, 1);
        assert_eq!(cfg.transfer.chunk_size, 512);
        assert_eq!(cfg.transfer.max_chunks_per_transfer, 65_536);
        assert_eq!(cfg.identity.speaker_id, "local");
    }

    #[test]
    fn data_dir_override_wins() {
        let mut cfg = MimicConfig::default();
        cfg.storage.data_dir = Some(PathBuf::from("/tmp/mimic"));
        assert_eq!(cfg.data_dir(), PathBuf::from("/tmp/mimic"));
    }
}
