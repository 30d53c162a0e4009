//! Speech-triggered capture session.
//!
//! [`CaptureSession`] consumes one [`Frame`] per update step. It is driven
//! from a single update loop and is not internally synchronised.
//!
//! # Flow
//!
//! ```text
//! arm()                          → Armed
//! voiced frame while Armed       → Capturing (write position and silence reset)
//! voiced frame while Capturing   → append, silence reset
//! silent frame while Capturing   → silence += frame duration
//!     silence > timeout && samples captured ─┐
//! buffer full ───────────────────────────────┴─▶ Finalizing → Clip → Idle
//! ```

use std::time::Duration;

use crate::audio::{Clip, Frame};
use crate::config::CaptureConfig;
use crate::dsp::convert::float_slice_to_i16;

use super::buffer::CaptureBuffer;
use super::state::CaptureState;

/// Turns a stream of voice frames into clips.
#[derive(Debug)]
pub struct CaptureSession {
    speaker_id: String,
    frame_duration: Duration,
    silence_timeout: Duration,
    max_clip_secs: f32,
    state: CaptureState,
    /// Allocated lazily once the first frame reveals the sample rate.
    buffer: Option<CaptureBuffer>,
    sample_rate: Option<u32>,
    silence: Duration,
    /// Set when the current episode has emitted its clip.
    finalized: bool,
}

impl CaptureSession {
    pub fn new(speaker_id: impl Into<String>, config: &CaptureConfig) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            frame_duration: config.frame_duration(),
            silence_timeout: config.silence_timeout(),
            max_clip_secs: config.max_clip_secs,
            state: CaptureState::Idle,
            buffer: None,
            sample_rate: None,
            silence: Duration::ZERO,
            finalized: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Sample rate inferred from the frame size, once a frame has arrived.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Samples captured so far in the current episode.
    pub fn captured_len(&self) -> usize {
        match self.state {
            CaptureState::Capturing => self.buffer.as_ref().map_or(0, CaptureBuffer::len),
            _ => 0,
        }
    }

    /// Idle → Armed. Returns `false` (and does nothing) in any other state.
    pub fn arm(&mut self) -> bool {
        match self.state {
            CaptureState::Idle => {
                self.state = CaptureState::Armed;
                log::debug!("capture[{}]: Idle → Armed", self.speaker_id);
                true
            }
            other => {
                log::debug!(
                    "capture[{}]: arm ignored while {}",
                    self.speaker_id,
                    other.label()
                );
                false
            }
        }
    }

    /// Drop back to Idle, discarding anything captured so far.
    pub fn disarm(&mut self) {
        if self.state != CaptureState::Idle {
            log::debug!("capture[{}]: {} → Idle (disarmed)", self.speaker_id, self.state.label());
        }
        self.state = CaptureState::Idle;
        self.silence = Duration::ZERO;
        if let Some(buf) = self.buffer.as_mut() {
            buf.reset();
        }
    }

    /// Feed one frame. Returns the finalized clip on the step that ends a
    /// capturing episode, `None` otherwise.
    pub fn push_frame(&mut self, frame: &Frame) -> Option<Clip> {
        if !self.state.is_listening() || frame.samples.is_empty() {
            return None;
        }
        self.ensure_buffer(frame.samples.len());

        match self.state {
            CaptureState::Armed => {
                if !frame.talking {
                    return None;
                }
                log::debug!("capture[{}]: Armed → Capturing", self.speaker_id);
                self.state = CaptureState::Capturing;
                self.silence = Duration::ZERO;
                self.finalized = false;
                if let Some(buf) = self.buffer.as_mut() {
                    buf.reset();
                }
                self.append(frame)
            }
            CaptureState::Capturing => {
                if frame.talking {
                    self.silence = Duration::ZERO;
                    return self.append(frame);
                }
                self.silence += self.frame_duration;
                let has_audio = self.buffer.as_ref().is_some_and(|b| !b.is_empty());
                if self.silence > self.silence_timeout && has_audio {
                    log::debug!(
                        "capture[{}]: silence for {:?}, finalizing",
                        self.speaker_id,
                        self.silence
                    );
                    return self.finalize();
                }
                None
            }
            CaptureState::Idle | CaptureState::Finalizing => None,
        }
    }

    /// Append a voiced frame; finalizes when the buffer fills up.
    fn append(&mut self, frame: &Frame) -> Option<Clip> {
        let buf = self.buffer.as_mut()?;
        buf.push_pcm16(&frame.samples);
        if buf.is_full() {
            log::debug!("capture[{}]: buffer full, finalizing", self.speaker_id);
            return self.finalize();
        }
        None
    }

    /// Cut the written prefix into a clip. Emits at most once per episode.
    fn finalize(&mut self) -> Option<Clip> {
        if self.finalized {
            return None;
        }
        self.state = CaptureState::Finalizing;
        self.finalized = true;

        let clip = match (self.buffer.as_ref(), self.sample_rate) {
            (Some(buf), Some(rate)) if !buf.is_empty() => Some(Clip::new(
                float_slice_to_i16(buf.written()),
                rate,
                self.speaker_id.clone(),
            )),
            _ => None,
        };

        if let Some(buf) = self.buffer.as_mut() {
            buf.reset();
        }
        self.silence = Duration::ZERO;
        self.state = CaptureState::Idle;

        if let Some(clip) = &clip {
            log::info!(
                "capture[{}]: clip finalized ({} samples @ {} Hz, {:.2}s)",
                self.speaker_id,
                clip.len(),
                clip.sample_rate(),
                clip.duration_secs()
            );
        }
        clip
    }

    /// `rate = frame_len × frames_per_second`; (re)allocate when it changes
    /// outside of a capturing episode.
    fn ensure_buffer(&mut self, frame_len: usize) {
        let frame_ms = self.frame_duration.as_millis().max(1) as u64;
        let rate = (frame_len as u64 * 1_000 / frame_ms) as u32;

        if self.sample_rate == Some(rate) && self.buffer.is_some() {
            return;
        }
        if self.state == CaptureState::Capturing && self.buffer.is_some() {
            log::warn!(
                "capture[{}]: frame size changed mid-capture ({} samples), keeping {:?} Hz",
                self.speaker_id,
                frame_len,
                self.sample_rate
            );
            return;
        }
        let capacity = (rate as f32 * self.max_clip_secs) as usize;
        log::debug!(
            "capture[{}]: sample rate {} Hz, buffer {} samples",
            self.speaker_id,
            rate,
            capacity
        );
        self.sample_rate = Some(rate);
        self.buffer = Some(CaptureBuffer::new(capacity));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
