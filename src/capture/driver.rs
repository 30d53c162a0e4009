//! Update loop that feeds a [`CaptureSession`] from a [`VoiceSource`].
//!
//! Every tick (one frame duration) the driver:
//!
//! 1. arms the session if it is idle and the re-arm deadline has passed,
//! 2. drains every frame the source has ready into the session,
//! 3. forwards finalized clips and schedules the next arm a random delay
//!    within `[min_interval_secs, max_interval_secs]` later.

use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::audio::{Clip, VoiceSource};
use crate::config::CaptureConfig;

use super::session::CaptureSession;
use super::state::CaptureState;

/// Owns the session and its source; runs on the host's update loop.
pub struct CaptureDriver<S: VoiceSource> {
    session: CaptureSession,
    source: S,
    config: CaptureConfig,
    rearm_at: Option<Instant>,
}

impl<S: VoiceSource> CaptureDriver<S> {
    pub fn new(speaker_id: impl Into<String>, source: S, config: CaptureConfig) -> Self {
        Self {
            session: CaptureSession::new(speaker_id, &config),
            source,
            config,
            rearm_at: None,
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Random delay before the next capture is armed.
    fn next_interval(&self) -> Duration {
        let lo = self.config.min_interval_secs.max(0.0);
        let hi = self.config.max_interval_secs.max(lo);
        let secs = if hi > lo {
            rand::thread_rng().gen_range(lo..=hi)
        } else {
            lo
        };
        Duration::from_secs_f32(secs)
    }

    /// One update step at time `now`. Returns the clips finalized in it.
    pub fn step(&mut self, now: Instant) -> Vec<Clip> {
        if self.session.state() == CaptureState::Idle
            && self.rearm_at.map_or(true, |at| now >= at)
        {
            self.session.arm();
            self.rearm_at = None;
        }

        let mut clips = Vec::new();
        while let Some(frame) = self.source.next_frame() {
            if let Some(clip) = self.session.push_frame(&frame) {
                let delay = self.next_interval();
                log::debug!("capture driver: next capture armed in {delay:?}");
                self.rearm_at = Some(now + delay);
                clips.push(clip);
            }
        }
        clips
    }

    /// Tick at the frame cadence until `shutdown` fires or `clips` closes.
    pub async fn run(mut self, clips: mpsc::Sender<Clip>, mut shutdown: oneshot::Receiver<()>) {
        // interval() panics on a zero period
        let period = self.config.frame_duration().max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                now = ticker.tick() => {
                    for clip in self.step(now) {
                        if clips.send(clip).await.is_err() {
                            log::info!("capture driver: clip receiver dropped, stopping");
                            return;
                        }
                    }
                }
            }
        }
        self.session.disarm();
        log::info!("capture driver: stopped");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ScriptedSource;

    fn config(min: f32, max: f32) -> CaptureConfig {
        CaptureConfig {
            min_interval_secs: min,
            max_interval_secs: max,
            ..CaptureConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn step_arms_and_emits_clip() {
        let mut src = ScriptedSource::new();
        src.push_voice(10, 960, 4_000).push_silence(30, 960);

        let mut driver = CaptureDriver::new("alice", src, config(1.0, 1.0));
        let clips = driver.step(Instant::now());
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].len(), 9_600);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_interval_before_rearming() {
        let mut src = ScriptedSource::new();
        src.push_voice(1, 960, 4_000).push_silence(30, 960);

        let mut driver = CaptureDriver::new("alice", src, config(2.0, 2.0));
        let t0 = Instant::now();
        assert_eq!(driver.step(t0).len(), 1);
        assert_eq!(driver.session().state(), CaptureState::Idle);

        driver.step(t0 + Duration::from_secs(1));
        assert_eq!(driver.session().state(), CaptureState::Idle);

        driver.step(t0 + Duration::from_secs(2));
        assert_eq!(driver.session().state(), CaptureState::Armed);
    }

    #[tokio::test(start_paused = true)]
    async fn run_forwards_clips_and_stops_on_shutdown() {
        let mut src = ScriptedSource::new();
        src.push_voice(5, 960, 4_000).push_silence(30, 960);

        let driver = CaptureDriver::new("alice", src, config(0.0, 0.0));
        let (tx, mut rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(driver.run(tx, stop_rx));

        let clip = rx.recv().await.expect("clip");
        assert_eq!(clip.len(), 5 * 960);

        stop_tx.send(()).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_frame_ms_still_ticks() {
        let mut src = ScriptedSource::new();
        src.push_voice(3, 16, 4_000).push_silence(5, 16);

        let config = CaptureConfig {
            frame_ms: 0,
            ..config(0.0, 0.0)
        };
        let driver = CaptureDriver::new("alice", src, config);
        let (tx, _rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(driver.run(tx, stop_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        stop_tx.send(()).unwrap();
        task.await.expect("driver task must not panic");
    }
}
