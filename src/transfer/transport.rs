//! Broadcast primitive seam and an in-process implementation.
//!
//! The real transport is owned by the host (a game's RPC layer, a relay, …)
//! and only promises unordered, at-least-once-or-never delivery. The core
//! talks to it through [`Broadcast`]; [`LoopbackBus`] connects peers inside
//! one process for tests and the demo binary.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::message::ChunkMessage;

/// Identity of a peer on the broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Who a message goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every peer including the sender.
    All,
    /// Every peer except the sender.
    Others,
}

/// A message as seen by the receiving peer.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub from: PeerId,
    pub message: ChunkMessage,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport disconnected")]
    Disconnected,

    #[error("transport error: {0}")]
    Other(String),
}

/// Unreliable point-to-multipoint message channel.
#[async_trait]
pub trait Broadcast: Send + Sync {
    fn local_peer(&self) -> PeerId;

    fn is_connected(&self) -> bool;

    async fn send(&self, target: Target, message: ChunkMessage) -> Result<(), TransportError>;
}

// Compile-time assertion: Arc<dyn Broadcast> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Arc<dyn Broadcast>) {}
};

// ---------------------------------------------------------------------------
// LoopbackBus
// ---------------------------------------------------------------------------

/// In-process hub; every joined peer gets its own inbox.
#[derive(Debug, Default)]
pub struct LoopbackBus {
    peers: Mutex<HashMap<PeerId, mpsc::UnboundedSender<Delivery>>>,
}

impl LoopbackBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `peer` and return its sending link and inbox.
    pub fn join(
        self: &Arc<Self>,
        peer: PeerId,
    ) -> (LoopbackLink, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_peers().insert(peer, tx);
        let link = LoopbackLink {
            bus: Arc::clone(self),
            peer,
            connected: Arc::new(AtomicBool::new(true)),
        };
        (link, rx)
    }

    pub fn peer_count(&self) -> usize {
        self.lock_peers().len()
    }

    fn lock_peers(&self) -> std::sync::MutexGuard<'_, HashMap<PeerId, mpsc::UnboundedSender<Delivery>>> {
        self.peers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn deliver(&self, from: PeerId, target: Target, message: ChunkMessage) {
        let mut peers = self.lock_peers();
        // Drop peers whose inbox has gone away.
        peers.retain(|id, tx| {
            if target == Target::Others && *id == from {
                return true;
            }
            tx.send(Delivery {
                from,
                message: message.clone(),
            })
            .is_ok()
        });
    }
}

/// One peer's handle on a [`LoopbackBus`].
#[derive(Debug, Clone)]
pub struct LoopbackLink {
    bus: Arc<LoopbackBus>,
    peer: PeerId,
    connected: Arc<AtomicBool>,
}

impl LoopbackLink {
    /// Simulate the transport dropping; later sends fail.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Broadcast for LoopbackLink {
    fn local_peer(&self) -> PeerId {
        self.peer
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, target: Target, message: ChunkMessage) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected);
        }
        self.bus.deliver(self.peer, target, message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(index: u32) -> ChunkMessage {
        ChunkMessage {
            transfer_id: 1,
            speaker_id: "alice".into(),
            index,
            total_chunks: 2,
            sample_rate: 16_000,
            chunk: vec![index as u8],
        }
    }

    #[tokio::test]
    async fn others_excludes_sender() {
        let bus = LoopbackBus::new();
        let (a, mut a_rx) = bus.join(PeerId(1));
        let (_b, mut b_rx) = bus.join(PeerId(2));

        a.send(Target::Others, msg(0)).await.unwrap();
        let got = b_rx.recv().await.unwrap();
        assert_eq!(got.from, PeerId(1));
        assert_eq!(got.message, msg(0));
        assert!(a_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn all_includes_sender() {
        let bus = LoopbackBus::new();
        let (a, mut a_rx) = bus.join(PeerId(1));
        let (_b, mut b_rx) = bus.join(PeerId(2));

        a.send(Target::All, msg(1)).await.unwrap();
        assert_eq!(a_rx.recv().await.unwrap().message.index, 1);
        assert_eq!(b_rx.recv().await.unwrap().message.index, 1);
    }

    #[tokio::test]
    async fn disconnected_link_refuses_to_send() {
        let bus = LoopbackBus::new();
        let (a, _a_rx) = bus.join(PeerId(1));
        a.disconnect();
        assert!(!a.is_connected());
        assert!(matches!(
            a.send(Target::Others, msg(0)).await,
            Err(TransportError::Disconnected)
        ));
        a.reconnect();
        assert!(a.send(Target::Others, msg(0)).await.is_ok());
    }

    #[tokio::test]
    async fn dropped_inbox_is_pruned() {
        let bus = LoopbackBus::new();
        let (a, _a_rx) = bus.join(PeerId(1));
        let (_b, b_rx) = bus.join(PeerId(2));
        drop(b_rx);
        a.send(Target::Others, msg(0)).await.unwrap();
        assert_eq!(bus.peer_count(), 1);
    }
}
