//! Speech-triggered capture.
//!
//! ```text
//! VoiceSource ──frames──▶ CaptureDriver (tick = frame duration)
//!                              │
//!                              ▼
//!                     CaptureSession (Idle → Armed → Capturing → Finalizing)
//!                              │
//!                              ▼
//!                     CaptureBuffer (rate × max seconds, lazily allocated)
//!                              │
//!                              ▼
//!                            Clip ──▶ mpsc::Sender<Clip>
//! ```

pub mod buffer;
pub mod driver;
pub mod session;
pub mod state;

pub use buffer::CaptureBuffer;
pub use driver::CaptureDriver;
pub use session::CaptureSession;
pub use state::CaptureState;
