//! The frame feed the capture session consumes.
//!
//! [`VoiceSource`] is the only thing the core knows about the host's voice
//! system: something that hands out fixed-duration mono PCM16 frames and says
//! whether the speaker was vocalizing during the last one.

use std::collections::VecDeque;
use std::f32::consts::PI;

/// One fixed-duration frame of mono PCM16 plus its voice-activity flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub samples: Vec<i16>,
    pub talking: bool,
}

impl Frame {
    pub fn new(samples: Vec<i16>, talking: bool) -> Self {
        Self { samples, talking }
    }

    pub fn silence(len: usize) -> Self {
        Self::new(vec![0; len], false)
    }

    /// A sine tone frame, flagged as voice.
    pub fn tone(len: usize, sample_rate: u32, freq_hz: f32, amplitude: f32, offset: usize) -> Self {
        let samples = (0..len)
            .map(|i| {
                let t = (offset + i) as f32 / sample_rate as f32;
                (amplitude * (2.0 * PI * freq_hz * t).sin() * 32_767.0) as i16
            })
            .collect();
        Self::new(samples, true)
    }
}

/// Adapter over the host's voice feed.
pub trait VoiceSource: Send {
    /// Next frame of samples, or `None` when nothing new is available.
    fn read(&mut self) -> Option<Vec<i16>>;

    /// Voice-activity flag for the frame most recently returned by `read`.
    fn is_talking(&self) -> bool;

    /// Convenience: `read` and `is_talking` as one [`Frame`].
    fn next_frame(&mut self) -> Option<Frame> {
        let samples = self.read()?;
        Some(Frame::new(samples, self.is_talking()))
    }
}

/// Deterministic source fed from a queue of prepared frames.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Frame>,
    talking: bool,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) -> &mut Self {
        self.frames.push_back(frame);
        self
    }

    /// Queue `count` constant-amplitude voice frames of `len` samples.
    pub fn push_voice(&mut self, count: usize, len: usize, level: i16) -> &mut Self {
        for _ in 0..count {
            self.frames.push_back(Frame::new(vec![level; len], true));
        }
        self
    }

    /// Queue `count` silent frames of `len` samples.
    pub fn push_silence(&mut self, count: usize, len: usize) -> &mut Self {
        for _ in 0..count {
            self.frames.push_back(Frame::silence(len));
        }
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl VoiceSource for ScriptedSource {
    fn read(&mut self) -> Option<Vec<i16>> {
        let frame = self.frames.pop_front()?;
        self.talking = frame.talking;
        Some(frame.samples)
    }

    fn is_talking(&self) -> bool {
        self.talking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_replays_in_order() {
        let mut src = ScriptedSource::new();
        src.push_voice(2, 4, 100).push_silence(1, 4);
        assert_eq!(src.remaining(), 3);

        assert_eq!(src.next_frame(), Some(Frame::new(vec![100; 4], true)));
        assert_eq!(src.next_frame(), Some(Frame::new(vec![100; 4], true)));
        assert_eq!(src.next_frame(), Some(Frame::silence(4)));
        assert_eq!(src.next_frame(), None);
    }

    #[test]
    fn is_talking_tracks_last_read() {
        let mut src = ScriptedSource::new();
        src.push_voice(1, 2, 1).push_silence(1, 2);
        src.read();
        assert!(src.is_talking());
        src.read();
        assert!(!src.is_talking());
    }

    #[test]
    fn tone_frame_is_voiced_and_bounded() {
        let f = Frame::tone(960, 48_000, 220.0, 0.5, 0);
        assert!(f.talking);
        assert_eq!(f.samples.len(), 960);
        assert!(f.samples.iter().all(|s| s.unsigned_abs() <= 16_384));
        assert!(f.samples.iter().any(|s| *s != 0));
    }
}
