//! Energy-based voice-activity detection for live frames.
//!
//! ## Algorithm
//!
//! 1. Compute the RMS of the incoming frame.
//! 2. RMS above `threshold` → voice; reload the hangover counter.
//! 3. Below threshold with hangover left → still voice, decrement counter
//!    (keeps word endings from being chopped off).
//! 4. Otherwise → silence.

/// Streaming RMS voice-activity detector.
///
/// # Example
///
/// ```rust
/// use voice_mimic::audio::EnergyVad;
///
/// let mut vad = EnergyVad::new(0.01, 0);
/// assert!(vad.classify(&[0.5_f32; 480]));
/// assert!(!vad.classify(&[0.0_f32; 480]));
/// ```
#[derive(Debug, Clone)]
pub struct EnergyVad {
    /// RMS amplitude threshold; frames below this are considered silence.
    rms_threshold: f32,
    /// Silent frames still reported as voice after real speech ends.
    hangover_frames: u32,
    hangover_counter: u32,
}

impl EnergyVad {
    pub fn new(rms_threshold: f32, hangover_frames: u32) -> Self {
        Self {
            rms_threshold,
            hangover_frames,
            hangover_counter: 0,
        }
    }

    /// RMS threshold currently in use.
    pub fn threshold(&self) -> f32 {
        self.rms_threshold
    }

    fn rms(frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let mean_sq: f32 = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
        mean_sq.sqrt()
    }

    /// Classify one frame; `true` means voice.
    pub fn classify(&mut self, frame: &[f32]) -> bool {
        if Self::rms(frame) > self.rms_threshold {
            self.hangover_counter = self.hangover_frames;
            true
        } else if self.hangover_counter > 0 {
            self.hangover_counter -= 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.hangover_counter = 0;
    }
}

impl Default for EnergyVad {
    /// 0.02 RMS with 8 frames (≈160 ms at 20 ms frames) of hangover.
    fn default() -> Self {
        Self::new(0.02, 8)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_below_threshold() {
        let mut vad = EnergyVad::new(0.02, 0);
        assert!(!vad.classify(&[0.0_f32; 160]));
    }

    #[test]
    fn speech_above_threshold() {
        let mut vad = EnergyVad::new(0.02, 0);
        assert!(vad.classify(&[0.5_f32; 160]));
    }

    #[test]
    fn hangover_extends_speech() {
        let mut vad = EnergyVad::new(0.02, 2);
        assert!(vad.classify(&[0.5_f32; 160]));
        assert!(vad.classify(&[0.0_f32; 160]));
        assert!(vad.classify(&[0.0_f32; 160]));
        assert!(!vad.classify(&[0.0_f32; 160]));
    }

    #[test]
    fn reset_clears_hangover() {
        let mut vad = EnergyVad::new(0.02, 5);
        vad.classify(&[0.5_f32; 160]);
        vad.reset();
        assert!(!vad.classify(&[0.0_f32; 160]));
    }

    #[test]
    fn empty_frame_is_silence() {
        let mut vad = EnergyVad::default();
        assert!(!vad.classify(&[]));
        assert!((vad.threshold() - 0.02).abs() < 1e-7);
    }
}
