//! PCM16 ⇄ normalized `f32` conversion.
//!
//! The two directions use different scale factors (÷32768 in, ×32767 out,
//! truncating), so `float → pcm → float` lands within one quantization step
//! of the input, never bit-exact.

/// Scale used when decoding 16-bit samples.
const DECODE_SCALE: f32 = 32_768.0;
/// Scale used when encoding back to 16-bit samples.
const ENCODE_SCALE: f32 = 32_767.0;

/// Decode little-endian 16-bit PCM bytes into samples in `[-1.0, 1.0)`.
///
/// A trailing odd byte is ignored.
pub fn pcm16_to_float(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / DECODE_SCALE)
        .collect()
}

/// Encode samples as little-endian 16-bit PCM bytes (×32767, truncated).
pub fn float_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        out.extend_from_slice(&float_to_i16(s).to_le_bytes());
    }
    out
}

/// Single-sample decode.
#[inline]
pub fn i16_to_float(sample: i16) -> f32 {
    sample as f32 / DECODE_SCALE
}

/// Single-sample encode. Out-of-range input saturates at the `i16` limits.
#[inline]
pub fn float_to_i16(sample: f32) -> i16 {
    (sample * ENCODE_SCALE) as i16
}

/// Decode a whole slice of `i16` samples.
pub fn i16_slice_to_float(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| i16_to_float(s)).collect()
}

/// Encode a whole slice of normalized samples.
pub fn float_slice_to_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| float_to_i16(s)).collect()
}
