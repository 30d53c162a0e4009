//! Receiver-side reassembly.
//!
//! One [`ReassemblySession`] per speaker. Chunks join the session whose
//! transfer id they carry; a chunk from a newer transfer supersedes the
//! in-flight session (last writer wins, the old partial clip is lost), and a
//! chunk from an older transfer is stale and dropped. Slots are overwritten
//! idempotently, so duplicates and any arrival order are fine.
//!
//! Sessions that see no chunk for `session_ttl` are purged so a sender that
//! vanishes mid-transfer cannot pin memory forever. A transfer declaring more
//! than `max_chunks` chunks is rejected before any slot is allocated.
//!
//! The id of the last completed transfer is remembered per speaker, so a
//! re-delivered chunk of a finished transfer never completes it twice.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use super::message::ChunkMessage;
use super::TransferError;

/// Default upper bound on `total_chunks` for one transfer.
pub const DEFAULT_MAX_CHUNKS: u32 = 4_096;

/// A fully reassembled WAV buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedClip {
    pub speaker_id: String,
    pub transfer_id: u64,
    pub sample_rate: u32,
    pub wav: Vec<u8>,
}

/// Partial state of one in-flight transfer.
#[derive(Debug)]
pub struct ReassemblySession {
    transfer_id: u64,
    sample_rate: u32,
    expected: u32,
    /// Sparse until complete; grows on demand up to `expected`.
    chunks: Vec<Option<Vec<u8>>>,
    filled: u32,
    last_activity: Instant,
}

impl ReassemblySession {
    fn new(message: &ChunkMessage, now: Instant) -> Self {
        Self {
            transfer_id: message.transfer_id,
            sample_rate: message.sample_rate,
            expected: message.total_chunks,
            chunks: Vec::new(),
            filled: 0,
            last_activity: now,
        }
    }

    fn insert(&mut self, index: u32, chunk: Vec<u8>, now: Instant) {
        let i = index as usize;
        if self.chunks.len() <= i {
            self.chunks.resize(i + 1, None);
        }
        let slot = &mut self.chunks[i];
        if slot.is_none() && !chunk.is_empty() {
            self.filled += 1;
        }
        if !chunk.is_empty() {
            *slot = Some(chunk);
        }
        self.last_activity = now;
    }

    pub fn transfer_id(&self) -> u64 {
        self.transfer_id
    }

    pub fn expected(&self) -> u32 {
        self.expected
    }

    pub fn filled(&self) -> u32 {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.expected
            && self.chunks.len() == self.expected as usize
            && self.chunks.iter().all(|c| c.as_ref().is_some_and(|b| !b.is_empty()))
    }

    fn assemble(self) -> Vec<u8> {
        self.chunks.into_iter().flatten().flatten().collect()
    }
}

/// Owns every in-flight reassembly session, keyed by speaker id.
#[derive(Debug)]
pub struct ChunkReceiver {
    sessions: HashMap<String, ReassemblySession>,
    /// Highest transfer id completed per speaker.
    completed: HashMap<String, u64>,
    session_ttl: Option<Duration>,
    max_chunks: u32,
}

impl Default for ChunkReceiver {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
            completed: HashMap::new(),
            session_ttl: None,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

impl ChunkReceiver {
    /// Receiver whose idle sessions expire after `session_ttl`.
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            session_ttl: Some(session_ttl),
            ..Self::default()
        }
    }

    /// Receiver that keeps incomplete sessions until superseded.
    pub fn without_expiry() -> Self {
        Self::default()
    }

    /// Cap on the chunk count a single transfer may declare (at least 1).
    pub fn with_max_chunks(mut self, max_chunks: u32) -> Self {
        self.max_chunks = max_chunks.max(1);
        self
    }

    pub fn max_chunks(&self) -> u32 {
        self.max_chunks
    }

    pub fn in_flight(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, speaker_id: &str) -> Option<&ReassemblySession> {
        self.sessions.get(speaker_id)
    }

    /// Handle one incoming chunk. Returns the clip when this chunk completes
    /// its transfer.
    pub fn accept(
        &mut self,
        message: ChunkMessage,
        now: Instant,
    ) -> Result<Option<ReceivedClip>, TransferError> {
        self.purge_expired(now);

        if message.total_chunks == 0 {
            log::warn!(
                "reassembly: chunk for {:?} declares zero chunks, rejected",
                message.speaker_id
            );
            return Err(TransferError::EmptyTransfer);
        }
        if message.index >= message.total_chunks {
            log::warn!(
                "reassembly: chunk index {} out of range (total {}) for {:?}, rejected",
                message.index,
                message.total_chunks,
                message.speaker_id
            );
            return Err(TransferError::IndexOutOfRange {
                index: message.index,
                total: message.total_chunks,
            });
        }
        if message.total_chunks > self.max_chunks {
            log::warn!(
                "reassembly: chunk for {:?} declares {} chunks (limit {}), rejected",
                message.speaker_id,
                message.total_chunks,
                self.max_chunks
            );
            return Err(TransferError::TooManyChunks {
                total: message.total_chunks,
                max: self.max_chunks,
            });
        }
        if let Some(&done) = self.completed.get(&message.speaker_id) {
            if message.transfer_id <= done {
                log::debug!(
                    "reassembly: chunk {} of finished transfer {} for {:?} dropped",
                    message.index,
                    message.transfer_id,
                    message.speaker_id
                );
                return Ok(None);
            }
        }

        let current = self
            .sessions
            .get(&message.speaker_id)
            .map(|s| (s.transfer_id, s.expected, s.filled));

        match current {
            Some((id, _, _)) if message.transfer_id < id => {
                log::debug!(
                    "reassembly: stale chunk {} of transfer {} for {:?} dropped",
                    message.index,
                    message.transfer_id,
                    message.speaker_id
                );
                return Ok(None);
            }
            Some((id, expected, _)) if message.transfer_id == id => {
                if message.total_chunks != expected {
                    log::warn!(
                        "reassembly: transfer {id} for {:?} changed chunk count {expected} -> {}, rejected",
                        message.speaker_id,
                        message.total_chunks
                    );
                    return Err(TransferError::TotalMismatch {
                        expected,
                        got: message.total_chunks,
                    });
                }
            }
            previous => {
                if let Some((id, expected, filled)) = previous {
                    log::warn!(
                        "reassembly: transfer {id} for {:?} superseded by {} with {filled}/{expected} chunks received",
                        message.speaker_id,
                        message.transfer_id
                    );
                }
                self.sessions.insert(
                    message.speaker_id.clone(),
                    ReassemblySession::new(&message, now),
                );
            }
        }

        let Some(session) = self.sessions.get_mut(&message.speaker_id) else {
            return Ok(None);
        };

        session.insert(message.index, message.chunk, now);
        if !session.is_complete() {
            return Ok(None);
        }

        let Some(session) = self.sessions.remove(&message.speaker_id) else {
            return Ok(None);
        };
        let transfer_id = session.transfer_id;
        let sample_rate = session.sample_rate;
        self.completed.insert(message.speaker_id.clone(), transfer_id);
        let wav = session.assemble();
        log::debug!(
            "reassembly: transfer {transfer_id} for {:?} complete ({} bytes)",
            message.speaker_id,
            wav.len()
        );
        Ok(Some(ReceivedClip {
            speaker_id: message.speaker_id,
            transfer_id,
            sample_rate,
            wav,
        }))
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let Some(ttl) = self.session_ttl else {
            return 0;
        };
        let before = self.sessions.len();
        self.sessions.retain(|speaker, s| {
            let alive = now.saturating_duration_since(s.last_activity) <= ttl;
            if !alive {
                log::debug!(
                    "reassembly: transfer {} for {speaker:?} expired with {}/{} chunks",
                    s.transfer_id,
                    s.filled,
                    s.expected
                );
            }
            alive
        });
        before - self.sessions.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
