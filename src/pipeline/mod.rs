//! Pipeline orchestrator module.
//!
//! This module wires capture, storage, transfer and playback together and
//! exposes counters any observer can read.
//!
//! # Architecture
//!
//! ```text
//! CaptureDriver ──Clip──▶ forward_clips ──┐
//! peer inbox ──Delivery──▶ forward_deliveries ──┼──▶ PipelineEvent (mpsc)
//! host game logic ──PlayRequest───────────┘           │
//!                                                     ▼
//!                                        MimicPipeline::run()  ← tokio task
//!                                          ├─ ClipStore
//!                                          ├─ ChunkSender / ChunkReceiver
//!                                          └─ PlaybackController
//!
//! SharedStats (Arc<Mutex<PipelineStats>>) ←── read by anyone
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use voice_mimic::config::MimicConfig;
//! use voice_mimic::pipeline::{forward_deliveries, MimicPipeline};
//! use voice_mimic::playback::LoggingEmitterHost;
//! use voice_mimic::store::ClipStore;
//! use voice_mimic::transfer::{LoopbackBus, PeerId};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = MimicConfig::default();
//!     let store = Arc::new(ClipStore::new(config.data_dir(), config.storage.max_samples_per_speaker));
//!     let bus = LoopbackBus::new();
//!     let (link, inbox) = bus.join(PeerId(1));
//!
//!     let pipeline = MimicPipeline::new(store, Arc::new(link), Arc::new(LoggingEmitterHost::new()), &config);
//!     let (events_tx, events_rx) = mpsc::channel(64);
//!     forward_deliveries(inbox, events_tx.clone());
//!     tokio::spawn(pipeline.run(events_rx));
//! }
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{forward_clips, forward_deliveries, MimicPipeline, PipelineEvent};
pub use state::{lock_stats, new_shared_stats, PipelineStats, SharedStats};
