//! Voice mimicry pipeline.
//!
//! One participant's speech is captured, stored per speaker, redistributed to
//! peers in paced chunks, and later replayed (filtered) through a spatial
//! emitter somewhere else.
//!
//! # Data flow
//!
//! ```text
//! VoiceSource frames → CaptureSession → Clip → wav::encode
//!        ├─▶ ClipStore (local)
//!        └─▶ ChunkSender ──Broadcast──▶ ChunkReceiver → ClipStore (remote)
//!                                                        │
//! PlaybackController ◀── random clip ────────────────────┘
//!        └─▶ low-pass → [pitch / alien] → fade+pad → EmitterHost
//! ```

pub mod audio;
pub mod capture;
pub mod config;
pub mod dsp;
pub mod pipeline;
pub mod playback;
pub mod store;
pub mod transfer;
