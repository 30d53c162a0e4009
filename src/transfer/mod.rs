//! Chunked clip transfer over an unreliable broadcast channel.
//!
//! ```text
//! sender                              receiver (per peer)
//! ──────                              ───────────────────
//! wav bytes ─ split(8 KiB) ─┐
//!                           ├─ chunk 0 ─▶ ChunkReceiver ── session[speaker]
//!        sleep(125 ms) ─────┤                              (sparse slots)
//!                           ├─ chunk 1 ─▶      …
//!                           └─ chunk n ─▶ complete ─▶ ReceivedClip
//! ```
//!
//! There are no acknowledgements and no retries. Pacing only rate-limits.

pub mod message;
pub mod reassembly;
pub mod sender;
pub mod transport;

pub use message::{chunk_count, split_into_chunks, ChunkMessage};
pub use reassembly::{ChunkReceiver, ReassemblySession, ReceivedClip, DEFAULT_MAX_CHUNKS};
pub use sender::{ChunkSender, SendReport};
pub use transport::{Broadcast, Delivery, LoopbackBus, LoopbackLink, PeerId, Target, TransportError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transport disconnected after {sent} of {total} chunks")]
    Disconnected { sent: u32, total: u32 },

    #[error("clip of {bytes} bytes needs more chunks than the protocol can index")]
    TooLarge { bytes: usize },

    #[error("chunk index {index} out of range for {total} chunks")]
    IndexOutOfRange { index: u32, total: u32 },

    #[error("chunk declares {total} chunks, more than the limit of {max}")]
    TooManyChunks { total: u32, max: u32 },

    #[error("chunk declares an empty transfer")]
    EmptyTransfer,

    #[error("chunk count changed mid-transfer: expected {expected}, got {got}")]
    TotalMismatch { expected: u32, got: u32 },

    #[error(transparent)]
    Transport(#[from] TransportError),
}
