//! Application entry point: a two-peer voice mimicry demo.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`MimicConfig`] from disk (default on first run) and sanitize it.
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Join two peers to an in-process [`LoopbackBus`], each with its own
//!    store and pipeline.
//! 5. Capture one clip on peer 1, from the microphone when built with the
//!    `microphone` feature, otherwise from a scripted tone.
//! 6. Wait for peer 2 to reassemble and store it, then play it back there
//!    through a logging emitter host.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use voice_mimic::{
    audio::{Frame, ScriptedSource, VoiceSource},
    capture::CaptureDriver,
    config::{CaptureConfig, MimicConfig},
    pipeline::{forward_clips, forward_deliveries, lock_stats, MimicPipeline, PipelineEvent, SharedStats},
    playback::{LoggingEmitterHost, PlaybackTarget, Vec3},
    store::ClipStore,
    transfer::{LoopbackBus, PeerId},
};

/// Rate of the scripted demo voice.
const SCRIPTED_RATE: u32 = 16_000;
/// How long peer 2 waits for the clip to arrive.
const ARRIVAL_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Peers
// ---------------------------------------------------------------------------

struct Peer {
    store: Arc<ClipStore>,
    stats: SharedStats,
    host: Arc<LoggingEmitterHost>,
    events: mpsc::Sender<PipelineEvent>,
    inbox_forwarder: JoinHandle<()>,
    pipeline: JoinHandle<()>,
}

fn spawn_peer(bus: &Arc<LoopbackBus>, id: u64, config: &MimicConfig) -> Peer {
    let data_dir = config.data_dir().join(format!("peer-{id}"));
    let store = Arc::new(ClipStore::new(&data_dir, config.storage.max_samples_per_speaker));
    let (link, inbox) = bus.join(PeerId(id));
    let host = Arc::new(LoggingEmitterHost::new());

    let pipeline = MimicPipeline::new(Arc::clone(&store), Arc::new(link), host.clone(), config);
    let stats = pipeline.stats();
    let (events, events_rx) = mpsc::channel(64);
    let inbox_forwarder = forward_deliveries(inbox, events.clone());

    log::info!("peer {id}: storing clips under {}", store.root().display());
    Peer {
        store,
        stats,
        host,
        events,
        inbox_forwarder,
        pipeline: tokio::spawn(pipeline.run(events_rx)),
    }
}

impl Peer {
    async fn shutdown(self) {
        self.inbox_forwarder.abort();
        drop(self.events);
        if let Err(e) = self.pipeline.await {
            log::warn!("pipeline task ended abnormally: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// About 1.5 s of a 220 Hz tone followed by enough silence to finalize it.
fn scripted_voice(capture: &CaptureConfig) -> ScriptedSource {
    let frame_len = (SCRIPTED_RATE * capture.frame_ms / 1_000) as usize;
    let voiced = 1_500 / capture.frame_ms.max(1) as usize;
    let silent = (capture.silence_timeout_secs * 1_000.0) as usize / capture.frame_ms.max(1) as usize + 5;

    let mut source = ScriptedSource::new();
    for k in 0..voiced {
        source.push(Frame::tone(frame_len, SCRIPTED_RATE, 220.0, 0.4, k * frame_len));
    }
    source.push_silence(silent, frame_len);
    source
}

fn spawn_capture<S: VoiceSource + 'static>(
    speaker_id: &str,
    source: S,
    config: &CaptureConfig,
    clips: mpsc::Sender<voice_mimic::audio::Clip>,
) -> oneshot::Sender<()> {
    let (stop_tx, stop_rx) = oneshot::channel();
    let driver = CaptureDriver::new(speaker_id, source, config.clone());
    tokio::spawn(driver.run(clips, stop_rx));
    stop_tx
}

#[cfg(feature = "microphone")]
fn start_capture(
    speaker_id: &str,
    config: &CaptureConfig,
    clips: mpsc::Sender<voice_mimic::audio::Clip>,
) -> (oneshot::Sender<()>, Option<voice_mimic::audio::StreamHandle>) {
    use voice_mimic::audio::{EnergyVad, Microphone};

    let vad = EnergyVad::new(config.vad_threshold, 8);
    match Microphone::new().and_then(|mic| mic.start(config.frame_ms, vad)) {
        Ok((stream, source)) => {
            log::info!("capture: speak into the microphone");
            (spawn_capture(speaker_id, source, config, clips), Some(stream))
        }
        Err(e) => {
            log::warn!("microphone unavailable ({e}); using a scripted voice");
            (spawn_capture(speaker_id, scripted_voice(config), config, clips), None)
        }
    }
}

#[cfg(not(feature = "microphone"))]
fn start_capture(
    speaker_id: &str,
    config: &CaptureConfig,
    clips: mpsc::Sender<voice_mimic::audio::Clip>,
) -> (oneshot::Sender<()>, Option<()>) {
    log::info!("capture: using a scripted voice");
    (spawn_capture(speaker_id, scripted_voice(config), config, clips), None)
}

// ---------------------------------------------------------------------------
// Demo
// ---------------------------------------------------------------------------

async fn run_demo(config: MimicConfig) -> Result<()> {
    let speaker = config.identity.speaker_id.clone();
    let bus = LoopbackBus::new();
    let speaking = spawn_peer(&bus, 1, &config);
    let listening = spawn_peer(&bus, 2, &config);

    let (clip_tx, clip_rx) = mpsc::channel(4);
    let clip_forwarder = forward_clips(clip_rx, speaking.events.clone());
    let (stop_capture, _stream) = start_capture(&speaker, &config.capture, clip_tx);

    // Wait for the clip to land in the listening peer's store.
    let deadline = tokio::time::Instant::now() + ARRIVAL_TIMEOUT;
    while listening
        .store
        .clip_count(&speaker)
        .await
        .context("reading listening peer's store")?
        == 0
    {
        if tokio::time::Instant::now() >= deadline {
            bail!("no clip from {speaker:?} arrived within {ARRIVAL_TIMEOUT:?}");
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    let _ = stop_capture.send(());
    clip_forwarder.abort();

    listening
        .events
        .send(PipelineEvent::PlayRequest {
            target: PlaybackTarget::Point(Vec3::new(3.0, 0.0, -2.0)),
            speaker_id: speaker.clone(),
            apply_extra_filter: true,
        })
        .await
        .context("listening pipeline stopped early")?;

    // Let the emitter play out and be released.
    let linger = Duration::from_secs_f32(config.capture.max_clip_secs)
        + Duration::from_secs(1)
        + config.playback.teardown_margin();
    let released_by = tokio::time::Instant::now() + linger;
    while tokio::time::Instant::now() < released_by {
        tokio::time::sleep(Duration::from_millis(250)).await;
        if lock_stats(&listening.stats).playbacks > 0 && listening.host.live_count() == 0 {
            break;
        }
    }

    let said = lock_stats(&speaking.stats).clone();
    let heard = lock_stats(&listening.stats).clone();
    log::info!(
        "peer 1: captured {} sent {} failed {} lost {}",
        said.clips_captured,
        said.clips_sent,
        said.transfers_failed,
        said.clips_lost
    );
    log::info!(
        "peer 2: received {} rejected {} played {} (emitters live: {})",
        heard.clips_received,
        heard.chunks_rejected,
        heard.playbacks,
        listening.host.live_count()
    );

    speaking.shutdown().await;
    listening.shutdown().await;
    Ok(())
}

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-mimic starting up");

    // 2. Configuration
    let config = MimicConfig::load()
        .unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            MimicConfig::default()
        })
        .sanitized();

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run_demo(config))
}
