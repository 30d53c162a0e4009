//! Rotating per-speaker clip store.
//!
//! Each speaker gets one directory; each clip one WAV file named after a
//! strictly increasing tick count so lexical creation order is recoverable
//! from the file name alone. Saving into a directory that already holds
//! `max_per_speaker` clips evicts the oldest first.
//!
//! Writes for the same speaker are serialised through a per-speaker async
//! lock, so evict-then-write is one logical step; different speakers never
//! wait on each other.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::seq::SliceRandom;
use thiserror::Error;

use crate::audio::{Clip, WavError};

use super::layout::{
    sample_file_name, sample_ticks, sanitize_speaker_id, speaker_dir_name, speaker_from_dir_name,
    AUDIO_DIR,
};

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode clip: {0}")]
    Wav(#[from] WavError),

    #[error("invalid speaker id {0:?}")]
    InvalidSpeaker(String),
}

// ---------------------------------------------------------------------------
// ClipStore
// ---------------------------------------------------------------------------

type SpeakerLock = Arc<tokio::sync::Mutex<()>>;

/// On-disk rotating collection of clips keyed by speaker.
pub struct ClipStore {
    root: PathBuf,
    max_per_speaker: AtomicUsize,
    locks: Mutex<HashMap<String, SpeakerLock>>,
    last_tick: AtomicU64,
}

impl std::fmt::Debug for ClipStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipStore")
            .field("root", &self.root)
            .field("max_per_speaker", &self.max_per_speaker())
            .finish_non_exhaustive()
    }
}

impl ClipStore {
    /// Store rooted at `<data_dir>/AudioFiles`. Nothing is created until the
    /// first save.
    pub fn new(data_dir: impl AsRef<Path>, max_per_speaker: usize) -> Self {
        Self {
            root: data_dir.as_ref().join(AUDIO_DIR),
            max_per_speaker: AtomicUsize::new(max_per_speaker.max(1)),
            locks: Mutex::new(HashMap::new()),
            last_tick: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_per_speaker(&self) -> usize {
        self.max_per_speaker.load(Ordering::Relaxed)
    }

    /// Change the cap. A lower cap takes effect on the speaker's next save.
    pub fn set_max_per_speaker(&self, max: usize) {
        self.max_per_speaker.store(max.max(1), Ordering::Relaxed);
    }

    pub fn speaker_dir(&self, speaker_id: &str) -> PathBuf {
        self.root.join(speaker_dir_name(speaker_id))
    }

    /// Encode `clip` and store it under its speaker.
    pub async fn save(&self, clip: &Clip) -> Result<PathBuf, StoreError> {
        let bytes = clip.to_wav()?;
        self.save_raw(clip.speaker_id(), &bytes).await
    }

    /// Store an already-encoded WAV buffer (e.g. received from a peer).
    pub async fn save_raw(&self, speaker_id: &str, wav: &[u8]) -> Result<PathBuf, StoreError> {
        let key = sanitize_speaker_id(speaker_id);
        if key.is_empty() {
            return Err(StoreError::InvalidSpeaker(speaker_id.to_string()));
        }
        let lock = self.speaker_lock(&key);
        let _guard = lock.lock().await;

        let dir = self.speaker_dir(speaker_id);
        tokio::fs::create_dir_all(&dir).await?;

        let mut entries = list_samples(&dir).await?;
        let cap = self.max_per_speaker();
        while entries.len() >= cap {
            let (_, oldest) = entries.remove(0);
            tokio::fs::remove_file(&oldest).await?;
            log::debug!("store: evicted {}", oldest.display());
        }

        let path = dir.join(sample_file_name(self.next_tick()));
        tokio::fs::write(&path, wav).await?;
        log::debug!("store: saved {} ({} bytes)", path.display(), wav.len());
        Ok(path)
    }

    /// Bytes of one uniformly chosen clip for `speaker_id`, if any exist.
    pub async fn random_clip(&self, speaker_id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = list_samples(&self.speaker_dir(speaker_id)).await?;
        let chosen = entries
            .choose(&mut rand::thread_rng())
            .map(|(_, path)| path.clone());
        match chosen {
            Some(path) => Ok(Some(tokio::fs::read(&path).await?)),
            None => {
                log::debug!("store: no clips for speaker {speaker_id:?}");
                Ok(None)
            }
        }
    }

    /// Sanitized ids of every speaker with a directory in the store.
    pub async fn list_speakers(&self) -> Result<BTreeSet<String>, StoreError> {
        let mut speakers = BTreeSet::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(speakers),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(speaker_from_dir_name) {
                speakers.insert(id.to_string());
            }
        }
        Ok(speakers)
    }

    /// Stored clip paths for `speaker_id`, oldest first.
    pub async fn clips(&self, speaker_id: &str) -> Result<Vec<PathBuf>, StoreError> {
        Ok(list_samples(&self.speaker_dir(speaker_id))
            .await?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    pub async fn clip_count(&self, speaker_id: &str) -> Result<usize, StoreError> {
        Ok(list_samples(&self.speaker_dir(speaker_id)).await?.len())
    }

    /// Delete every clip of one speaker.
    pub async fn clear_speaker(&self, speaker_id: &str) -> Result<(), StoreError> {
        let lock = self.speaker_lock(&sanitize_speaker_id(speaker_id));
        let _guard = lock.lock().await;
        match tokio::fs::remove_dir_all(self.speaker_dir(speaker_id)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Delete the whole store.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        for speaker in self.list_speakers().await? {
            self.clear_speaker(&speaker).await?;
        }
        Ok(())
    }

    fn speaker_lock(&self, key: &str) -> SpeakerLock {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    /// 100 ns ticks since the Unix epoch, strictly increasing per store.
    fn next_tick(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| (d.as_nanos() / 100) as u64)
            .unwrap_or(0);
        let mut last = self.last_tick.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_tick.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

/// `(ticks, path)` of every sample file in `dir`, oldest first. A missing
/// directory is empty.
async fn list_samples(dir: &Path) -> Result<Vec<(u64, PathBuf)>, StoreError> {
    let mut out = Vec::new();
    let mut rd = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if let Some(ticks) = sample_ticks(&path) {
            out.push((ticks, path));
        }
    }
    out.sort();
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
