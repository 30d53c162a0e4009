//! Playback controller: stored clip → DSP chain → spatial emitter.
//!
//! # Flow
//!
//! ```text
//! play(target, speaker, extra)
//!   ├─ invalid target / no stored clip ─▶ Ok(None)   (logged, no-op)
//!   ├─ spawn_blocking(render_clip)
//!   │     decode → low_pass → [pitch-down | pitch-up | alien] → fade_and_pad
//!   ├─ host.spawn(target, audio)                      → EmitterId
//!   └─ tokio::spawn(sleep(duration + margin); host.despawn(id))
//! ```
//!
//! The teardown task is detached and owns its own `Arc` of the host, so every
//! successful `play` releases its emitter even if the returned handle is
//! dropped straight away.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::audio::{wav, WavError};
use crate::config::PlaybackConfig;
use crate::dsp::{fade_and_pad, i16_slice_to_float, low_pass, ExtraFilter};
use crate::store::{ClipStore, StoreError};

use super::emitter::{EmitterError, EmitterHost, EmitterId, PlayableAudio, PlaybackTarget};

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to read stored clip: {0}")]
    Store(#[from] StoreError),

    #[error("stored clip is not valid PCM16 WAV: {0}")]
    Wav(#[from] WavError),

    #[error(transparent)]
    Emitter(#[from] EmitterError),

    #[error("render task failed: {0}")]
    Render(String),
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Run a stored WAV buffer through the playback DSP chain.
///
/// The low-pass always applies; `extra` adds at most one character filter
/// before the edges are faded and padded.
pub fn render_clip(
    wav_bytes: &[u8],
    cutoff_hz: f32,
    extra: Option<ExtraFilter>,
) -> Result<PlayableAudio, WavError> {
    let decoded = wav::decode(wav_bytes)?;
    let rate = decoded.sample_rate;

    let mut samples = low_pass(&i16_slice_to_float(&decoded.samples), rate, cutoff_hz);
    if let Some(filter) = extra {
        samples = filter.apply(&samples, rate);
    }
    Ok(PlayableAudio::new(fade_and_pad(&samples, rate), rate))
}

// ---------------------------------------------------------------------------
// PlaybackHandle
// ---------------------------------------------------------------------------

/// One started playback. Dropping it does not stop the scheduled teardown.
#[derive(Debug)]
pub struct PlaybackHandle {
    pub emitter: EmitterId,
    pub duration: Duration,
    pub filter: Option<ExtraFilter>,
    teardown: JoinHandle<()>,
}

impl PlaybackHandle {
    /// Resolves once the emitter has been despawned.
    pub async fn finished(self) {
        if let Err(e) = self.teardown.await {
            log::warn!("playback: teardown task for emitter {} failed: {e}", self.emitter.0);
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

pub struct PlaybackController {
    store: Arc<ClipStore>,
    host: Arc<dyn EmitterHost>,
    config: PlaybackConfig,
}

impl PlaybackController {
    pub fn new(store: Arc<ClipStore>, host: Arc<dyn EmitterHost>, config: PlaybackConfig) -> Self {
        Self {
            store,
            host,
            config,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Play a random stored clip of `speaker_id` at `target`.
    ///
    /// Returns `Ok(None)` when there is nothing to do: the target is not
    /// valid, or the speaker has no stored clips yet.
    pub async fn play(
        &self,
        target: PlaybackTarget,
        speaker_id: &str,
        apply_extra_filter: bool,
    ) -> Result<Option<PlaybackHandle>, PlaybackError> {
        if !self.host.is_valid_target(&target) {
            log::debug!("playback: target {target:?} is not valid, skipping");
            return Ok(None);
        }

        let Some(bytes) = self.store.random_clip(speaker_id).await? else {
            log::debug!("playback: nothing stored for {speaker_id:?} yet");
            return Ok(None);
        };

        let filter = if apply_extra_filter && self.config.extra_filter_enabled {
            Some(ExtraFilter::choose(&mut rand::thread_rng()))
        } else {
            None
        };
        let cutoff = self.config.low_pass_cutoff_hz;

        let audio = tokio::task::spawn_blocking(move || render_clip(&bytes, cutoff, filter))
            .await
            .map_err(|e| PlaybackError::Render(e.to_string()))??;

        if audio.is_empty() {
            log::debug!("playback: stored clip for {speaker_id:?} is empty, skipping");
            return Ok(None);
        }

        let duration = audio.duration();
        let emitter = self.host.spawn(target, audio)?;
        log::debug!(
            "playback: emitter {} for {speaker_id:?} ({:.2}s, filter {filter:?})",
            emitter.0,
            duration.as_secs_f32()
        );

        let host = Arc::clone(&self.host);
        let linger = duration + self.config.teardown_margin();
        let teardown = tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            host.despawn(emitter);
        });

        Ok(Some(PlaybackHandle {
            emitter,
            duration,
            filter,
            teardown,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
