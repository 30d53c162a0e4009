//! Per-speaker rotating clip storage.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_mimic::audio::Clip;
//! use voice_mimic::store::ClipStore;
//!
//! # async fn example() -> Result<(), voice_mimic::store::StoreError> {
//! let store = ClipStore::new("/var/lib/voice-mimic", 5);
//! store.save(&Clip::new(vec![0; 16_000], 16_000, "alice")).await?;
//! let bytes = store.random_clip("alice").await?;
//! assert!(bytes.is_some());
//! # Ok(())
//! # }
//! ```

pub mod clip_store;
pub mod layout;

pub use clip_store::{ClipStore, StoreError};
pub use layout::sanitize_speaker_id;
