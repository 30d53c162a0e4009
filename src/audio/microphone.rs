//! Microphone voice source via `cpal` (feature `microphone`).
//!
//! [`Microphone`] wraps the cpal host/device/stream lifecycle.
//! [`Microphone::start`] returns a [`StreamHandle`] (RAII guard; dropping it
//! stops the stream) and a [`MicrophoneSource`] that slices the raw callback
//! buffers into fixed-duration mono PCM16 frames for the capture session.

use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::source::VoiceSource;
use super::vad::EnergyVad;
use crate::dsp::convert::float_to_i16;

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// `cpal::Stream` is not `Send` on every platform, so keep this on the thread
/// that called [`Microphone::start`].
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up the microphone stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// Microphone
// ---------------------------------------------------------------------------

/// Default input device wrapper.
pub struct Microphone {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_rate: u32,
    channels: u16,
}

impl Microphone {
    /// Open the system default input device with its preferred configuration.
    pub fn new() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start streaming. Frames are `frame_ms` long; `vad` sets the talking
    /// flag for each one.
    pub fn start(
        &self,
        frame_ms: u32,
        vad: EnergyVad,
    ) -> Result<(StreamHandle, MicrophoneSource), CaptureError> {
        let (tx, rx) = mpsc::channel::<Vec<f32>>();
        let channels = usize::from(self.channels.max(1));

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = data
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                    .collect();
                // Ignore send errors; the source may have been dropped.
                let _ = tx.send(mono);
            },
            |err: cpal::StreamError| {
                log::error!("microphone stream error: {err}");
            },
            None,
        )?;
        stream.play()?;

        log::info!(
            "microphone: streaming {} Hz, {} ch, {} ms frames",
            self.sample_rate,
            self.channels,
            frame_ms
        );

        let frame_len = (self.sample_rate as usize * frame_ms as usize) / 1_000;
        let source = MicrophoneSource {
            rx,
            pending: Vec::new(),
            frame_len: frame_len.max(1),
            vad,
            talking: false,
        };
        Ok((StreamHandle { _stream: stream }, source))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

// ---------------------------------------------------------------------------
// MicrophoneSource
// ---------------------------------------------------------------------------

/// [`VoiceSource`] fed by the cpal callback.
pub struct MicrophoneSource {
    rx: mpsc::Receiver<Vec<f32>>,
    pending: Vec<f32>,
    frame_len: usize,
    vad: EnergyVad,
    talking: bool,
}

impl VoiceSource for MicrophoneSource {
    fn read(&mut self) -> Option<Vec<i16>> {
        while let Ok(buf) = self.rx.try_recv() {
            self.pending.extend_from_slice(&buf);
        }
        if self.pending.len() < self.frame_len {
            return None;
        }
        let frame: Vec<f32> = self.pending.drain(..self.frame_len).collect();
        self.talking = self.vad.classify(&frame);
        Some(frame.into_iter().map(float_to_i16).collect())
    }

    fn is_talking(&self) -> bool {
        self.talking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_slices_pending_audio_into_frames() {
        let (tx, rx) = mpsc::channel();
        let mut src = MicrophoneSource {
            rx,
            pending: Vec::new(),
            frame_len: 4,
            vad: EnergyVad::new(0.1, 0),
            talking: false,
        };

        tx.send(vec![0.5_f32; 3]).unwrap();
        assert!(src.read().is_none());

        tx.send(vec![0.5_f32; 3]).unwrap();
        let frame = src.read().expect("one full frame");
        assert_eq!(frame.len(), 4);
        assert!(src.is_talking());
        assert!(src.read().is_none());
    }

    #[test]
    fn microphone_source_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<MicrophoneSource>();
    }
}
