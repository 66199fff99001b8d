//! Speech capture and synthesis
//!
//! The session controller depends only on the `SpeechCapture` and
//! `SpeechSynthesis` traits; concrete platform bindings are selected at
//! startup (see `capture_binding`). Tests substitute fakes per test case.

mod audio;
mod capture;
mod endpoint;
mod playback;
mod synthesize;
mod transcribe;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub use audio::{MicCapture, SAMPLE_RATE, encode_wav};
pub use capture::{MicSpeechCapture, UnsupportedCapture, capture_binding};
pub use endpoint::{EndpointerState, UtteranceEndpointer};
pub use playback::AudioPlayback;
pub use synthesize::{HttpSpeechSynthesis, VoiceInfo, select_voice};
pub use transcribe::Transcriber;

use crate::Result;

/// Reasons a capture attempt can fail
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The host offers no speech-recognition capability
    #[error("speech recognition is not available on this device")]
    Unsupported,

    /// Capture ran but produced no usable speech
    #[error("could not detect speech")]
    NoSpeech,

    /// Audio or transcription backend failure
    #[error("speech recognition failed: {0}")]
    Backend(String),
}

/// Events emitted during a single capture session
///
/// `Ended` is always the final event once capture has been attempted,
/// regardless of whether `Result` or `Error` fired. `Result` fires at most
/// once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The recognizer began listening
    Started,

    /// Final transcript (best alternative only)
    Result(String),

    /// Capture failed
    Error(CaptureError),

    /// The recognizer stopped listening
    Ended,
}

/// Trait for single-shot speech capture
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Begin capturing exactly one utterance
    ///
    /// Events arrive on the returned channel; the sender is dropped after
    /// the final event. Capture stops automatically after a result,
    /// silence, or error; there is no cancellation.
    async fn start(&self) -> mpsc::Receiver<CaptureEvent>;
}

/// Trait for speech synthesis
#[async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Speak `text`, resolving when playback completes
    ///
    /// Overlapping calls follow platform default behavior; no ordering is
    /// guaranteed across them.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str) -> Result<()>;
}
