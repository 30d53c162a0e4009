//! Fixed-capacity linear buffer for `f32` capture samples.
//!
//! Unlike a ring buffer this never overwrites: once `capacity` samples are
//! written, further pushes are clipped and [`CaptureBuffer::is_full`] reports
//! `true` so the session can finalize.
//!
//! # Example
//!
//! ```rust
//! use voice_mimic::capture::CaptureBuffer;
//!
//! let mut buf = CaptureBuffer::new(4);
//! assert_eq!(buf.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]), 4); // 5th sample clipped
//! assert!(buf.is_full());
//! assert_eq!(buf.written(), &[1.0, 2.0, 3.0, 4.0]);
//! ```

/// Pre-allocated capture storage with a monotonic write position.
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    buf: Vec<f32>,
    /// Index of the *next* write position; never exceeds `buf.len()`.
    write_pos: usize,
}

impl CaptureBuffer {
    /// Allocate `capacity` samples up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Append as much of `data` as fits. Returns how many samples were taken.
    pub fn push_slice(&mut self, data: &[f32]) -> usize {
        let n = data.len().min(self.remaining());
        self.buf[self.write_pos..self.write_pos + n].copy_from_slice(&data[..n]);
        self.write_pos += n;
        n
    }

    /// Append PCM16 samples, normalising them to `[-1.0, 1.0)` on the way in.
    pub fn push_pcm16(&mut self, data: &[i16]) -> usize {
        let n = data.len().min(self.remaining());
        for (dst, &src) in self.buf[self.write_pos..self.write_pos + n]
            .iter_mut()
            .zip(data)
        {
            *dst = crate::dsp::convert::i16_to_float(src);
        }
        self.write_pos += n;
        n
    }

    /// The prefix written since the last reset.
    pub fn written(&self) -> &[f32] {
        &self.buf[..self.write_pos]
    }

    /// Rewind the write position; storage is kept.
    pub fn reset(&mut self) {
        self.write_pos = 0;
    }

    pub fn len(&self) -> usize {
        self.write_pos
    }

    pub fn is_empty(&self) -> bool {
        self.write_pos == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.write_pos
    }

    pub fn is_full(&self) -> bool {
        self.write_pos == self.buf.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_within_capacity() {
        let mut buf = CaptureBuffer::new(8);
        assert_eq!(buf.push_slice(&[1.0, 2.0, 3.0]), 3);
        assert_eq!(buf.len(), 3);
        assert!(!buf.is_full());
        assert_eq!(buf.written(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn overflow_is_clipped_not_wrapped() {
        let mut buf = CaptureBuffer::new(3);
        buf.push_slice(&[1.0, 2.0]);
        assert_eq!(buf.push_slice(&[3.0, 4.0, 5.0]), 1);
        assert!(buf.is_full());
        assert_eq!(buf.written(), &[1.0, 2.0, 3.0]);
        assert_eq!(buf.push_slice(&[6.0]), 0);
    }

    #[test]
    fn pcm16_is_normalised() {
        let mut buf = CaptureBuffer::new(4);
        buf.push_pcm16(&[i16::MIN, 0, 16_384]);
        assert_eq!(buf.written(), &[-1.0, 0.0, 0.5]);
    }

    #[test]
    fn reset_rewinds_but_keeps_capacity() {
        let mut buf = CaptureBuffer::new(4);
        buf.push_slice(&[1.0; 4]);
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 4);
        buf.push_slice(&[9.0]);
        assert_eq!(buf.written(), &[9.0]);
    }

    #[test]
    fn zero_capacity_is_always_full() {
        let mut buf = CaptureBuffer::new(0);
        assert!(buf.is_full());
        assert_eq!(buf.push_pcm16(&[1, 2]), 0);
    }
}
