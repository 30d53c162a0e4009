//! Paced chunk sender.
//!
//! Pacing is plain rate limiting: a cooperative sleep between messages, no
//! acknowledgements. A disconnect stops the transfer where it is; receivers
//! are left with an incomplete session that the next transfer supersedes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::TransferConfig;

use super::message::{split_into_chunks, ChunkMessage};
use super::transport::{Broadcast, Target, TransportError};
use super::TransferError;

/// Outcome of a completed send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    pub transfer_id: u64,
    pub chunks_sent: u32,
}

/// Streams encoded clips to every other peer.
pub struct ChunkSender {
    transport: Arc<dyn Broadcast>,
    chunk_size: usize,
    pacing: Duration,
    next_transfer_id: AtomicU64,
}

impl ChunkSender {
    pub fn new(transport: Arc<dyn Broadcast>, config: &TransferConfig) -> Self {
        // Seeded from the clock so ids keep increasing across restarts.
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            transport,
            chunk_size: config.chunk_size.max(1),
            pacing: config.pacing(),
            next_transfer_id: AtomicU64::new(seed),
        }
    }

    /// Send `wav` as `speaker_id`'s clip to [`Target::Others`].
    pub async fn send_clip(
        &self,
        speaker_id: &str,
        sample_rate: u32,
        wav: &[u8],
    ) -> Result<SendReport, TransferError> {
        let transfer_id = self.next_transfer_id.fetch_add(1, Ordering::Relaxed);
        let chunks = split_into_chunks(wav, self.chunk_size);
        let total = u32::try_from(chunks.len()).map_err(|_| TransferError::TooLarge {
            bytes: wav.len(),
        })?;

        log::debug!(
            "transfer {transfer_id}: sending {} bytes as {total} chunks for {speaker_id:?}",
            wav.len()
        );

        for (index, chunk) in (0u32..).zip(chunks) {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            if !self.transport.is_connected() {
                return Err(self.aborted(transfer_id, index, total));
            }
            let message = ChunkMessage {
                transfer_id,
                speaker_id: speaker_id.to_string(),
                index,
                total_chunks: total,
                sample_rate,
                chunk: chunk.to_vec(),
            };
            match self.transport.send(Target::Others, message).await {
                Ok(()) => {}
                Err(TransportError::Disconnected) => {
                    return Err(self.aborted(transfer_id, index, total));
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::debug!("transfer {transfer_id}: all {total} chunks sent");
        Ok(SendReport {
            transfer_id,
            chunks_sent: total,
        })
    }

    fn aborted(&self, transfer_id: u64, sent: u32, total: u32) -> TransferError {
        log::warn!("transfer {transfer_id}: transport disconnected after {sent}/{total} chunks");
        TransferError::Disconnected { sent, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::transport::{LoopbackBus, PeerId};
    use tokio::time::Instant;

    fn config(chunk_size: usize) -> TransferConfig {
        TransferConfig {
            chunk_size,
            ..TransferConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sends_every_chunk_in_order_with_pacing() {
        let bus = LoopbackBus::new();
        let (link, _own) = bus.join(PeerId(1));
        let (_peer, mut inbox) = bus.join(PeerId(2));
        let sender = ChunkSender::new(Arc::new(link), &config(4));

        let start = Instant::now();
        let report = sender.send_clip("alice", 16_000, b"0123456789").await.unwrap();
        assert_eq!(report.chunks_sent, 3);
        // two pauses between three messages
        assert_eq!(start.elapsed(), Duration::from_millis(250));

        let mut got = Vec::new();
        while let Ok(d) = inbox.try_recv() {
            assert_eq!(d.message.total_chunks, 3);
            assert_eq!(d.message.speaker_id, "alice");
            assert_eq!(d.message.sample_rate, 16_000);
            assert_eq!(d.message.transfer_id, report.transfer_id);
            got.push(d.message);
        }
        let indices: Vec<u32> = got.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let joined: Vec<u8> = got.into_iter().flat_map(|m| m.chunk).collect();
        assert_eq!(joined, b"0123456789");
    }

    #[tokio::test(start_paused = true)]
    async fn transfer_ids_increase() {
        let bus = LoopbackBus::new();
        let (link, _own) = bus.join(PeerId(1));
        let sender = ChunkSender::new(Arc::new(link), &config(4));
        let a = sender.send_clip("alice", 16_000, b"ab").await.unwrap();
        let b = sender.send_clip("alice", 16_000, b"cd").await.unwrap();
        assert!(b.transfer_id > a.transfer_id);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_mid_transfer_stops_sending() {
        let bus = LoopbackBus::new();
        let (link, _own) = bus.join(PeerId(1));
        let (_peer, mut inbox) = bus.join(PeerId(2));
        let sender = ChunkSender::new(Arc::new(link.clone()), &config(2));

        let send = tokio::spawn(async move { sender.send_clip("alice", 8_000, b"aabbccdd").await });

        // first chunk goes out immediately, then the sender sleeps 125 ms
        tokio::time::sleep(Duration::from_millis(60)).await;
        link.disconnect();

        let err = send.await.unwrap().unwrap_err();
        assert!(matches!(err, TransferError::Disconnected { sent: 1, total: 4 }));

        assert_eq!(inbox.try_recv().unwrap().message.index, 0);
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_buffer_sends_nothing() {
        let bus = LoopbackBus::new();
        let (link, _own) = bus.join(PeerId(1));
        let (_peer, mut inbox) = bus.join(PeerId(2));
        let sender = ChunkSender::new(Arc::new(link), &config(4));
        let report = sender.send_clip("alice", 8_000, &[]).await.unwrap();
        assert_eq!(report.chunks_sent, 0);
        assert!(inbox.try_recv().is_err());
    }
}
