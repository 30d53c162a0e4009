//! Audio primitives: clips, the WAV codec, and the voice frame feed.
//!
//! # Pipeline
//!
//! ```text
//! VoiceSource (host feed / microphone) → Frame { samples, talking }
//!           → capture::CaptureSession → Clip → wav::encode → bytes
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use voice_mimic::audio::{Clip, wav};
//!
//! let clip = Clip::new(vec![0, 1_000, -1_000], 16_000, "alice");
//! let bytes = clip.to_wav().unwrap();
//! assert_eq!(bytes.len(), wav::HEADER_LEN + 6);
//! ```

pub mod clip;
#[cfg(feature = "microphone")]
pub mod microphone;
pub mod source;
pub mod vad;
pub mod wav;

pub use clip::Clip;
#[cfg(feature = "microphone")]
pub use microphone::{CaptureError, Microphone, MicrophoneSource, StreamHandle};
pub use source::{Frame, ScriptedSource, VoiceSource};
pub use vad::EnergyVad;
pub use wav::{DecodedWav, WavError};
