//! Capture session state machine.

/// States of a capture session.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──arm()──▶ Armed ──voice──▶ Capturing
///                                   ──silence timeout / buffer full──▶ Finalizing ──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// Not listening; frames are ignored.
    #[default]
    Idle,

    /// Waiting for the first voiced frame.
    Armed,

    /// Voiced frames are being appended to the capture buffer.
    Capturing,

    /// The clip is being cut from the buffer; lasts a single update step.
    Finalizing,
}

impl CaptureState {
    /// Returns `true` while frames are consumed.
    ///
    /// ```
    /// use voice_mimic::capture::CaptureState;
    ///
    /// assert!(!CaptureState::Idle.is_listening());
    /// assert!(CaptureState::Armed.is_listening());
    /// assert!(CaptureState::Capturing.is_listening());
    /// assert!(!CaptureState::Finalizing.is_listening());
    /// ```
    pub fn is_listening(&self) -> bool {
        matches!(self, CaptureState::Armed | CaptureState::Capturing)
    }

    /// A short human-readable label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::Armed => "Armed",
            CaptureState::Capturing => "Capturing",
            CaptureState::Finalizing => "Finalizing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(CaptureState::default(), CaptureState::Idle);
    }

    #[test]
    fn labels() {
        assert_eq!(CaptureState::Idle.label(), "Idle");
        assert_eq!(CaptureState::Armed.label(), "Armed");
        assert_eq!(CaptureState::Capturing.label(), "Capturing");
        assert_eq!(CaptureState::Finalizing.label(), "Finalizing");
    }
}
