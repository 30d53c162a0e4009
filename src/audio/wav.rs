//! Canonical PCM16 mono RIFF/WAVE codec built on `hound`.
//!
//! Layout produced by [`encode`]:
//!
//! | Offset | Field                                   |
//! |--------|-----------------------------------------|
//! | 0      | `RIFF`, chunk size (`36 + data size`)   |
//! | 8      | `WAVE`                                  |
//! | 12     | `fmt `, 16, PCM=1, mono, rate, byte rate, block align 2, 16 bits |
//! | 36     | `data`, `2 × sample count`              |
//! | 44     | little-endian `i16` samples             |

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;

/// Size of the canonical header preceding the sample data.
pub const HEADER_LEN: usize = 44;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Errors raised while encoding or decoding WAV buffers.
#[derive(Debug, Error)]
pub enum WavError {
    #[error("WAV codec error: {0}")]
    Codec(#[from] hound::Error),

    /// Well-formed WAV that is not mono 16-bit integer PCM.
    #[error("unsupported WAV format: {channels} ch, {bits} bit, {format:?}")]
    UnsupportedFormat {
        channels: u16,
        bits: u16,
        format: SampleFormat,
    },

    #[error("sample rate must be positive")]
    ZeroSampleRate,
}

/// A decoded WAV buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedWav {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Encode `samples` at `sample_rate` into a canonical WAV byte buffer.
pub fn encode(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, WavError> {
    if sample_rate == 0 {
        return Err(WavError::ZeroSampleRate);
    }
    let mut cursor = Cursor::new(Vec::with_capacity(HEADER_LEN + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec(sample_rate))?;
        for &s in samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Decode a mono 16-bit PCM WAV buffer.
///
/// Header-derived metadata (byte rate, block align, sizes) is recomputed on
/// encode, so only samples and rate are returned.
pub fn decode(bytes: &[u8]) -> Result<DecodedWav, WavError> {
    let mut reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    if spec.channels != CHANNELS
        || spec.bits_per_sample != BITS_PER_SAMPLE
        || spec.sample_format != SampleFormat::Int
    {
        return Err(WavError::UnsupportedFormat {
            channels: spec.channels,
            bits: spec.bits_per_sample,
            format: spec.sample_format,
        });
    }
    if spec.sample_rate == 0 {
        return Err(WavError::ZeroSampleRate);
    }
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, hound::Error>>()?;
    Ok(DecodedWav {
        samples,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    #[test]
    fn header_is_canonical() {
        let samples = [0_i16, 1, -1, 1_000];
        let bytes = encode(&samples, 48_000).unwrap();

        assert_eq!(bytes.len(), HEADER_LEN + samples.len() * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 36 + 8);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1); // PCM
        assert_eq!(u16_at(&bytes, 22), 1); // mono
        assert_eq!(u32_at(&bytes, 24), 48_000);
        assert_eq!(u32_at(&bytes, 28), 96_000); // byte rate
        assert_eq!(u16_at(&bytes, 32), 2); // block align
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 8);
    }

    #[test]
    fn samples_are_little_endian_after_header() {
        let bytes = encode(&[0x1234, -2], 8_000).unwrap();
        assert_eq!(&bytes[HEADER_LEN..], &[0x34, 0x12, 0xFE, 0xFF]);
    }

    #[test]
    fn round_trip_is_exact() {
        let samples: Vec<i16> = (-500..500).map(|i| (i * 61) as i16).collect();
        for rate in [8_000, 16_000, 44_100, 48_000] {
            let decoded = decode(&encode(&samples, rate).unwrap()).unwrap();
            assert_eq!(decoded.samples, samples);
            assert_eq!(decoded.sample_rate, rate);
        }
    }

    #[test]
    fn empty_clip_round_trips() {
        let bytes = encode(&[], 16_000).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN);
        let decoded = decode(&bytes).unwrap();
        assert!(decoded.samples.is_empty());
        assert_eq!(decoded.sample_rate, 16_000);
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(encode(&[1, 2], 0), Err(WavError::ZeroSampleRate)));
    }

    #[test]
    fn garbage_is_a_codec_error() {
        assert!(matches!(decode(b"not a wav file"), Err(WavError::Codec(_))));
    }

    #[test]
    fn stereo_is_unsupported() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let spec = WavSpec {
                channels: 2,
                sample_rate: 16_000,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            };
            let mut w = WavWriter::new(&mut cursor, spec).unwrap();
            w.write_sample(1_i16).unwrap();
            w.write_sample(2_i16).unwrap();
            w.finalize().unwrap();
        }
        let err = decode(cursor.get_ref()).unwrap_err();
        assert!(matches!(err, WavError::UnsupportedFormat { channels: 2, .. }));
    }
}
