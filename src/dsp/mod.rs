//! Stateless sample-array transforms used by playback.
//!
//! Every function here is pure: no I/O, no hidden state, and an empty input
//! always yields an empty output.
//!
//! | Function          | Output length                    |
//! |-------------------|----------------------------------|
//! | [`low_pass`]      | `len`                            |
//! | [`pitch_shift`]   | `floor(len / factor)`            |
//! | [`alien_filter`]  | `len`                            |
//! | [`fade_and_pad`]  | `len + 2 × padding_samples(rate)`|

pub mod convert;
pub mod effects;
pub mod filter;
pub mod pitch;

pub use convert::{float_to_pcm16, i16_slice_to_float, pcm16_to_float};
pub use effects::{alien_filter, fade_and_pad, padding_samples};
pub use filter::low_pass;
pub use pitch::pitch_shift;

use rand::Rng;

/// Speed factor for the "pitch down" extra filter.
pub const PITCH_DOWN_FACTOR: f32 = 0.8;
/// Speed factor for the "pitch up" extra filter.
pub const PITCH_UP_FACTOR: f32 = 1.3;

/// The optional character filter applied on top of the muffling low-pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraFilter {
    PitchDown,
    PitchUp,
    Alien,
}

impl ExtraFilter {
    pub const ALL: [ExtraFilter; 3] = [
        ExtraFilter::PitchDown,
        ExtraFilter::PitchUp,
        ExtraFilter::Alien,
    ];

    /// Pick one filter uniformly at random.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn apply(self, samples: &[f32], sample_rate: u32) -> Vec<f32> {
        match self {
            ExtraFilter::PitchDown => pitch_shift(samples, PITCH_DOWN_FACTOR),
            ExtraFilter::PitchUp => pitch_shift(samples, PITCH_UP_FACTOR),
            ExtraFilter::Alien => alien_filter(samples, sample_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn choose_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 3];
        let draws = 3_000;
        for _ in 0..draws {
            let picked = ExtraFilter::choose(&mut rng);
            let idx = ExtraFilter::ALL
                .iter()
                .position(|f| *f == picked)
                .expect("choose returns a listed filter");
            counts[idx] += 1;
        }
        // each share within 800..1200 of the expected 1000
        for count in counts {
            assert!((800..=1_200).contains(&count), "counts {counts:?}");
        }
    }

    #[test]
    fn pitch_filters_change_length_in_opposite_directions() {
        let input = vec![0.1_f32; 1_000];
        assert!(ExtraFilter::PitchDown.apply(&input, 48_000).len() > 1_000);
        assert!(ExtraFilter::PitchUp.apply(&input, 48_000).len() < 1_000);
        assert_eq!(ExtraFilter::Alien.apply(&input, 48_000).len(), 1_000);
    }
}
