//! The immutable unit of recorded speech.

use super::wav::{self, WavError};

/// One finalized capture: mono 16-bit samples, their rate, and who spoke.
///
/// Created by capture finalization or by reassembly on a receiver and never
/// mutated afterwards; fields are private and only exposed read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    samples: Vec<i16>,
    sample_rate: u32,
    speaker_id: String,
}

impl Clip {
    pub fn new(samples: Vec<i16>, sample_rate: u32, speaker_id: impl Into<String>) -> Self {
        Self {
            samples,
            sample_rate,
            speaker_id: speaker_id.into(),
        }
    }

    /// Decode a WAV buffer received for `speaker_id`.
    pub fn from_wav(bytes: &[u8], speaker_id: impl Into<String>) -> Result<Self, WavError> {
        let decoded = wav::decode(bytes)?;
        Ok(Self::new(decoded.samples, decoded.sample_rate, speaker_id))
    }

    /// Canonical RIFF/WAVE serialization of this clip.
    pub fn to_wav(&self) -> Result<Vec<u8>, WavError> {
        wav::encode(&self.samples, self.sample_rate)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn speaker_id(&self) -> &str {
        &self.speaker_id
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}
