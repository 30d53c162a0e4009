//! Pipeline orchestrator: drives capture → store/transfer → playback.
//!
//! [`MimicPipeline`] owns the reassembly state and responds to
//! [`PipelineEvent`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Pipeline flow
//!
//! ```text
//! PipelineEvent::ClipCaptured(clip)
//!   └─▶ encode WAV ─┬─▶ task: store.save_raw            (local copy)
//!                   └─▶ task: sender.send_clip           (paced chunks to peers)
//!
//! PipelineEvent::ChunkReceived(delivery)
//!   └─▶ receiver.accept ──complete──▶ WAV check ──▶ task: store.save_raw (remote copy)
//!
//! PipelineEvent::PlayRequest { target, speaker_id, apply_extra_filter }
//!   └─▶ task: playback.play
//! ```
//!
//! Disk I/O, pacing and rendering run in spawned tasks so the event loop
//! never waits on them. A failed save is counted as a lost clip and logged;
//! it never stops the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use crate::audio::Clip;
use crate::config::MimicConfig;
use crate::playback::{EmitterHost, PlaybackController, PlaybackTarget};
use crate::store::ClipStore;
use crate::transfer::{Broadcast, ChunkReceiver, ChunkSender, Delivery, ReceivedClip};

use super::state::{lock_stats, new_shared_stats, SharedStats};

// ---------------------------------------------------------------------------
// PipelineEvent
// ---------------------------------------------------------------------------

/// Everything the orchestrator reacts to.
#[derive(Debug)]
pub enum PipelineEvent {
    /// Local capture finalized a clip.
    ClipCaptured(Clip),

    /// A chunk arrived from a peer.
    ChunkReceived(Delivery),

    /// Play a stored clip of `speaker_id` at `target`.
    PlayRequest {
        target: PlaybackTarget,
        speaker_id: String,
        apply_extra_filter: bool,
    },
}

// ---------------------------------------------------------------------------
// MimicPipeline
// ---------------------------------------------------------------------------

/// Create with [`MimicPipeline::new`], then spawn [`run`](Self::run) as a
/// tokio task.
pub struct MimicPipeline {
    stats: SharedStats,
    store: Arc<ClipStore>,
    sender: Arc<ChunkSender>,
    receiver: ChunkReceiver,
    playback: Arc<PlaybackController>,
    purge_every: Duration,
}

impl MimicPipeline {
    /// # Arguments
    ///
    /// * `store`     : local clip store shared with anything else reading it.
    /// * `transport` : this peer's broadcast link.
    /// * `host`      : spatial emitter host used for playback.
    /// * `config`    : transfer and playback settings are read from here.
    pub fn new(
        store: Arc<ClipStore>,
        transport: Arc<dyn Broadcast>,
        host: Arc<dyn EmitterHost>,
        config: &MimicConfig,
    ) -> Self {
        let ttl = config.transfer.session_ttl();
        Self {
            stats: new_shared_stats(),
            sender: Arc::new(ChunkSender::new(transport, &config.transfer)),
            receiver: ChunkReceiver::new(ttl).with_max_chunks(config.transfer.max_chunks_per_transfer),
            playback: Arc::new(PlaybackController::new(
                Arc::clone(&store),
                host,
                config.playback.clone(),
            )),
            store,
            purge_every: ttl.max(Duration::from_secs(1)),
        }
    }

    pub fn stats(&self) -> SharedStats {
        Arc::clone(&self.stats)
    }

    pub fn store(&self) -> &Arc<ClipStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `events` is closed, then wait for in-flight tasks.
    pub async fn run(mut self, mut events: mpsc::Receiver<PipelineEvent>) {
        let mut tasks = JoinSet::new();
        let mut purge = tokio::time::interval(self.purge_every);
        purge.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event, &mut tasks),
                    None => break,
                },
                Some(done) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = done {
                        log::error!("pipeline: task failed: {e}");
                    }
                }
                _ = purge.tick() => {
                    let expired = self.receiver.purge_expired(Instant::now());
                    if expired > 0 {
                        log::debug!("pipeline: purged {expired} stalled transfer(s)");
                    }
                }
            }
        }

        log::info!("pipeline: event channel closed, finishing {} task(s)", tasks.len());
        while let Some(done) = tasks.join_next().await {
            if let Err(e) = done {
                log::error!("pipeline: task failed: {e}");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Event handlers
    // -----------------------------------------------------------------------

    fn handle(&mut self, event: PipelineEvent, tasks: &mut JoinSet<()>) {
        match event {
            PipelineEvent::ClipCaptured(clip) => self.on_clip_captured(clip, tasks),
            PipelineEvent::ChunkReceived(delivery) => self.on_chunk(delivery, tasks),
            PipelineEvent::PlayRequest {
                target,
                speaker_id,
                apply_extra_filter,
            } => self.on_play(target, speaker_id, apply_extra_filter, tasks),
        }
    }

    fn on_clip_captured(&self, clip: Clip, tasks: &mut JoinSet<()>) {
        lock_stats(&self.stats).clips_captured += 1;
        log::debug!(
            "pipeline: captured {:.2}s for {:?}",
            clip.duration_secs(),
            clip.speaker_id()
        );

        let wav = match clip.to_wav() {
            Ok(bytes) => Arc::new(bytes),
            Err(e) => {
                record_lost(&self.stats, clip.speaker_id(), &e.to_string());
                return;
            }
        };
        let speaker = clip.speaker_id().to_string();

        // Local copy.
        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);
        let bytes = Arc::clone(&wav);
        let who = speaker.clone();
        tasks.spawn(async move {
            if let Err(e) = store.save_raw(&who, bytes.as_slice()).await {
                record_lost(&stats, &who, &e.to_string());
            }
        });

        // Remote copies.
        let sender = Arc::clone(&self.sender);
        let stats = Arc::clone(&self.stats);
        let rate = clip.sample_rate();
        tasks.spawn(async move {
            match sender.send_clip(&speaker, rate, wav.as_slice()).await {
                Ok(report) => {
                    log::debug!(
                        "pipeline: transfer {} sent ({} chunks)",
                        report.transfer_id,
                        report.chunks_sent
                    );
                    lock_stats(&stats).clips_sent += 1;
                }
                Err(e) => {
                    log::warn!("pipeline: transfer for {speaker:?} aborted: {e}");
                    let mut st = lock_stats(&stats);
                    st.transfers_failed += 1;
                    st.last_error = Some(e.to_string());
                }
            }
        });
    }

    fn on_chunk(&mut self, delivery: Delivery, tasks: &mut JoinSet<()>) {
        let from = delivery.from;
        let received = match self.receiver.accept(delivery.message, Instant::now()) {
            Ok(Some(received)) => received,
            Ok(None) => return,
            Err(e) => {
                log::warn!("pipeline: chunk from {from} rejected: {e}");
                let mut st = lock_stats(&self.stats);
                st.chunks_rejected += 1;
                st.last_error = Some(e.to_string());
                return;
            }
        };

        let ReceivedClip {
            speaker_id, wav, ..
        } = received;
        // Only well-formed clips reach the store; playback would fail on the rest.
        if let Err(e) = crate::audio::wav::decode(&wav) {
            log::warn!("pipeline: clip for {speaker_id:?} from {from} is not valid WAV: {e}");
            let mut st = lock_stats(&self.stats);
            st.chunks_rejected += 1;
            st.last_error = Some(e.to_string());
            return;
        }
        log::info!(
            "pipeline: received clip for {speaker_id:?} from {from} ({} bytes)",
            wav.len()
        );
        lock_stats(&self.stats).clips_received += 1;

        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);
        tasks.spawn(async move {
            if let Err(e) = store.save_raw(&speaker_id, &wav).await {
                record_lost(&stats, &speaker_id, &e.to_string());
            }
        });
    }

    fn on_play(
        &self,
        target: PlaybackTarget,
        speaker_id: String,
        apply_extra_filter: bool,
        tasks: &mut JoinSet<()>,
    ) {
        let playback = Arc::clone(&self.playback);
        let stats = Arc::clone(&self.stats);
        tasks.spawn(async move {
            match playback.play(target, &speaker_id, apply_extra_filter).await {
                Ok(Some(_handle)) => lock_stats(&stats).playbacks += 1,
                Ok(None) => {}
                Err(e) => {
                    log::warn!("pipeline: playback of {speaker_id:?} failed: {e}");
                    lock_stats(&stats).last_error = Some(e.to_string());
                }
            }
        });
    }
}

fn record_lost(stats: &SharedStats, speaker_id: &str, reason: &str) {
    log::error!("pipeline: clip for {speaker_id:?} lost: {reason}");
    let mut st = lock_stats(stats);
    st.clips_lost += 1;
    st.last_error = Some(reason.to_string());
}

// ---------------------------------------------------------------------------
// Forwarders
// ---------------------------------------------------------------------------

/// Turn finalized capture clips into pipeline events.
pub fn forward_clips(
    mut clips: mpsc::Receiver<Clip>,
    events: mpsc::Sender<PipelineEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(clip) = clips.recv().await {
            if events.send(PipelineEvent::ClipCaptured(clip)).await.is_err() {
                break;
            }
        }
    })
}

/// Turn a peer's transport inbox into pipeline events.
pub fn forward_deliveries(
    mut inbox: mpsc::UnboundedReceiver<Delivery>,
    events: mpsc::Sender<PipelineEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(delivery) = inbox.recv().await {
            if events.send(PipelineEvent::ChunkReceived(delivery)).await.is_err() {
                break;
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
