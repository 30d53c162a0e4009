//! Resampling pitch shift.
//!
//! `factor` is a playback-speed multiplier: output sample `i` reads the input
//! at position `i × factor`. A factor above 1 skips through the input (shorter
//! clip, higher voice); below 1 stretches it (longer clip, lower voice).

/// Smallest factor honoured; anything positive below it is raised to it, so
/// the output is at most `len / MIN_FACTOR` samples.
pub const MIN_FACTOR: f32 = 1e-3;

/// Resample `samples` by `factor` with linear interpolation.
///
/// Output length is `floor(len / factor)`. The last input sample has no right
/// neighbour and is copied as-is; positions past the end read as silence.
/// Empty input, or a non-positive / non-finite factor, yields empty output.
pub fn pitch_shift(samples: &[f32], factor: f32) -> Vec<f32> {
    if samples.is_empty() || !factor.is_finite() || factor <= 0.0 {
        return Vec::new();
    }
    let factor = f64::from(factor.max(MIN_FACTOR));
    let len = samples.len();
    let out_len = output_len(len, factor);

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * factor;
            let idx = pos.floor() as usize;
            if idx + 1 < len {
                let frac = (pos - idx as f64) as f32;
                samples[idx] + (samples[idx + 1] - samples[idx]) * frac
            } else if idx < len {
                samples[idx]
            } else {
                0.0
            }
        })
        .collect()
}

/// `floor(len / factor)`, except that a quotient within f32 rounding of an
/// integer counts as that integer (0.8_f32 is slightly above 0.8).
fn output_len(len: usize, factor: f64) -> usize {
    let quotient = len as f64 / factor;
    let nearest = quotient.round();
    if (quotient - nearest).abs() <= nearest * f64::from(f32::EPSILON) {
        nearest as usize
    } else {
        quotient.floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32 / len as f32).collect()
    }

    #[test]
    fn output_length_is_floor_of_len_over_factor() {
        let input = ramp(300);
        for (factor, expected) in [(0.5_f32, 600), (1.0, 300), (1.5, 200), (2.0, 150)] {
            assert_eq!(pitch_shift(&input, factor).len(), expected, "factor {factor}");
        }
        // 301 / 2 = 150.5 → 150
        assert_eq!(pitch_shift(&ramp(301), 2.0).len(), 150);
    }

    #[test]
    fn exact_quotients_survive_f32_factors() {
        // 0.8_f32 widens to 0.800000011920929, which would floor 8 / 0.8 to 9
        assert_eq!(pitch_shift(&ramp(8), 0.8).len(), 10);
        assert_eq!(pitch_shift(&ramp(1_000), 0.8).len(), 1_250);
        assert_eq!(pitch_shift(&ramp(13), 1.3).len(), 10);
        assert_eq!(pitch_shift(&ramp(7), 0.8).len(), 8);
        assert_eq!(pitch_shift(&ramp(3), 0.1).len(), 30);
    }

    #[test]
    fn tiny_factor_is_raised_to_minimum() {
        let input = ramp(4);
        let expected = (4.0 / MIN_FACTOR).round() as usize;
        assert_eq!(pitch_shift(&input, 1e-9).len(), expected);
        assert_eq!(pitch_shift(&input, f32::MIN_POSITIVE).len(), expected);
        assert_eq!(pitch_shift(&input, MIN_FACTOR).len(), expected);
    }

    #[test]
    fn unit_factor_is_identity() {
        let input = ramp(64);
        assert_eq!(pitch_shift(&input, 1.0), input);
    }

    #[test]
    fn half_factor_interpolates_midpoints() {
        let input = [0.0_f32, 1.0, 0.0];
        let out = pitch_shift(&input, 0.5);
        assert_eq!(out.len(), 6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        assert!((out[3] - 0.5).abs() < 1e-6);
        // positions 2.0 and 2.5 both hit the tail sample
        assert_eq!(out[4], 0.0);
        assert_eq!(out[5], 0.0);
    }

    #[test]
    fn tail_sample_is_copied_verbatim() {
        let input = [0.1_f32, 0.2, 0.9];
        let out = pitch_shift(&input, 0.5);
        assert_eq!(out[4], 0.9);
        assert_eq!(out[5], 0.9);
    }

    #[test]
    fn double_factor_takes_every_other_sample() {
        let input = [1.0_f32, 9.0, 2.0, 9.0, 3.0, 9.0];
        assert_eq!(pitch_shift(&input, 2.0), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn degenerate_inputs_give_empty_output() {
        assert!(pitch_shift(&[], 1.0).is_empty());
        assert!(pitch_shift(&[0.5], 0.0).is_empty());
        assert!(pitch_shift(&[0.5], -1.0).is_empty());
        assert!(pitch_shift(&[0.5], f32::NAN).is_empty());
    }
}
