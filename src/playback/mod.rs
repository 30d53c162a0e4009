//! Spatial playback of stored clips.
//!
//! [`PlaybackController`] picks a random stored clip for a speaker, renders it
//! through the DSP chain and hands it to an [`EmitterHost`] at a
//! [`PlaybackTarget`], scheduling the emitter's release once the audio has
//! run out.

pub mod controller;
pub mod emitter;

pub use controller::{render_clip, PlaybackController, PlaybackError, PlaybackHandle};
pub use emitter::{
    AnchorId, EmitterError, EmitterHost, EmitterId, LoggingEmitterHost, PlayableAudio,
    PlaybackTarget, Vec3,
};
