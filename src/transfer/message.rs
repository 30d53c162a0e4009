//! Chunk message format and the splitter.

/// One fragment of an encoded clip, as sent over the broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMessage {
    /// Per-sender, strictly increasing id of the transfer this chunk is from.
    pub transfer_id: u64,
    pub speaker_id: String,
    pub index: u32,
    pub total_chunks: u32,
    pub sample_rate: u32,
    pub chunk: Vec<u8>,
}

/// Number of chunks `len` bytes split into at `chunk_size`: `ceil(len / size)`.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    len.div_ceil(chunk_size)
}

/// Split `bytes` into ordered slices of at most `chunk_size` bytes. Only the
/// last one may be shorter. A zero chunk size yields nothing.
pub fn split_into_chunks(bytes: &[u8], chunk_size: usize) -> Vec<&[u8]> {
    if chunk_size == 0 {
        return Vec::new();
    }
    bytes.chunks(chunk_size).collect()
}
