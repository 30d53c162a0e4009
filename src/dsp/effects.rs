//! Character effects and edge shaping.

use std::f32::consts::PI;

/// Vibrato rate in Hz.
const VIBRATO_HZ: f32 = 5.0;
/// Vibrato depth as a fraction of one vibrato period.
const VIBRATO_DEPTH: f32 = 0.05;
/// Ring-modulation carrier in Hz.
const RING_CARRIER_HZ: f32 = 200.0;
/// Share of the ring-modulated copy in the output.
const RING_MIX: f32 = 0.3;

/// Silence added before and after the clip, in seconds.
const PAD_SECS: f32 = 0.5;
/// Linear fade length at each edge of the original audio, in seconds.
const FADE_SECS: f32 = 0.02;

/// "Alien" voice: vibrato plus a ring-modulated copy, hard-clamped to ±1.
///
/// The vibrato moves the read position sinusoidally by up to
/// `VIBRATO_DEPTH` of a vibrato period (10 ms at 5 Hz) and reads with linear
/// interpolation. Output length equals input length.
pub fn alien_filter(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let rate = sample_rate.max(1) as f32;
    let last = (samples.len() - 1) as f32;
    let excursion = VIBRATO_DEPTH * rate / VIBRATO_HZ;

    samples
        .iter()
        .enumerate()
        .map(|(i, &dry)| {
            let t = i as f32 / rate;
            let offset = excursion * (2.0 * PI * VIBRATO_HZ * t).sin();
            let pos = (i as f32 + offset).clamp(0.0, last);
            let idx = pos.floor() as usize;
            let frac = pos - idx as f32;
            let vibrato = match samples.get(idx + 1) {
                Some(&next) => samples[idx] + (next - samples[idx]) * frac,
                None => samples[idx],
            };
            let ring = dry * (2.0 * PI * RING_CARRIER_HZ * t).sin();
            (vibrato + RING_MIX * ring).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Number of padding samples [`fade_and_pad`] adds on each side.
pub fn padding_samples(sample_rate: u32) -> usize {
    (sample_rate as f32 * PAD_SECS) as usize
}

/// Fade the edges of the clip in/out linearly, then surround it with silence.
///
/// Output length is `len + 2 × padding_samples(rate)`. The fades touch only
/// the original audio, never the padding.
pub fn fade_and_pad(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let pad = padding_samples(sample_rate);
    let fade = ((sample_rate as f32 * FADE_SECS) as usize).min(samples.len() / 2);

    let mut out = Vec::with_capacity(samples.len() + 2 * pad);
    out.resize(pad, 0.0);
    out.extend_from_slice(samples);
    out.resize(pad + samples.len() + pad, 0.0);

    if fade > 0 {
        let body = &mut out[pad..pad + samples.len()];
        let n = body.len();
        for i in 0..fade {
            let gain = i as f32 / fade as f32;
            body[i] *= gain;
            body[n - 1 - i] *= gain;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alien_preserves_length_and_range() {
        let input: Vec<f32> = (0..4_800).map(|i| (i as f32 * 0.05).sin() * 0.9).collect();
        let out = alien_filter(&input, 48_000);
        assert_eq!(out.len(), input.len());
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn alien_clamps_hot_input() {
        let out = alien_filter(&vec![1.0_f32; 2_000], 16_000);
        assert!(out.iter().all(|s| *s <= 1.0));
        assert!(out.iter().any(|s| *s == 1.0));
    }

    #[test]
    fn alien_of_silence_is_silence() {
        let out = alien_filter(&vec![0.0_f32; 512], 48_000);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn alien_changes_the_signal() {
        let input: Vec<f32> = (0..4_800).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
        let out = alien_filter(&input, 48_000);
        let diff: f32 = input.iter().zip(&out).map(|(a, b)| (a - b).abs()).sum();
        assert!(diff > 1.0);
    }

    #[test]
    fn fade_and_pad_length() {
        let input = vec![0.5_f32; 1_000];
        let out = fade_and_pad(&input, 16_000);
        assert_eq!(padding_samples(16_000), 8_000);
        assert_eq!(out.len(), 1_000 + 2 * 8_000);
    }

    #[test]
    fn padding_is_silent_and_body_is_faded() {
        let rate = 16_000;
        let input = vec![0.5_f32; 2_000];
        let out = fade_and_pad(&input, rate);
        let pad = padding_samples(rate);
        let fade = 320; // 20 ms at 16 kHz

        assert!(out[..pad].iter().all(|s| *s == 0.0));
        assert!(out[pad + input.len()..].iter().all(|s| *s == 0.0));

        // fade-in starts at zero and ramps up to full level
        assert_eq!(out[pad], 0.0);
        assert!((out[pad + fade / 2] - 0.25).abs() < 1e-6);
        assert_eq!(out[pad + fade], 0.5);

        // fade-out mirrors it
        assert_eq!(out[pad + input.len() - 1], 0.0);
        assert_eq!(out[pad + input.len() / 2], 0.5);
    }

    #[test]
    fn short_clip_fade_never_overlaps() {
        let out = fade_and_pad(&[0.5_f32; 10], 48_000);
        assert_eq!(out.len(), 10 + 2 * padding_samples(48_000));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(alien_filter(&[], 48_000).is_empty());
        assert!(fade_and_pad(&[], 48_000).is_empty());
    }
}
