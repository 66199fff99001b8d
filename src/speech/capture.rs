//! Speech capture bindings
//!
//! `MicSpeechCapture` is the concrete platform binding: microphone capture
//! with energy endpointing, then HTTP transcription. When the host lacks a
//! usable input device or STT configuration, `capture_binding` injects
//! `UnsupportedCapture` instead, which reports the capability error through
//! the same event contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    CaptureError, CaptureEvent, MicCapture, SAMPLE_RATE, SpeechCapture, Transcriber,
    UtteranceEndpointer, encode_wav,
};
use crate::config::Config;

/// Microphone poll interval
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Hard cap on one capture session, endpointing aside
const MAX_CAPTURE: Duration = Duration::from_secs(15);

/// Captures one utterance from the microphone and transcribes it
pub struct MicSpeechCapture {
    transcriber: Arc<Transcriber>,
}

impl MicSpeechCapture {
    /// Create a new microphone capture binding
    #[must_use]
    pub fn new(transcriber: Transcriber) -> Self {
        Self {
            transcriber: Arc::new(transcriber),
        }
    }
}

#[async_trait]
impl SpeechCapture for MicSpeechCapture {
    async fn start(&self) -> mpsc::Receiver<CaptureEvent> {
        let (tx, rx) = mpsc::channel(8);
        let transcriber = Arc::clone(&self.transcriber);

        tokio::spawn(async move {
            let _ = tx.send(CaptureEvent::Started).await;

            let event = match tokio::task::spawn_blocking(capture_utterance).await {
                Ok(Ok(samples)) => transcribe_samples(&transcriber, &samples).await,
                Ok(Err(e)) => CaptureEvent::Error(e),
                Err(e) => {
                    tracing::error!(error = %e, "capture task failed");
                    CaptureEvent::Error(CaptureError::Backend(e.to_string()))
                }
            };

            let _ = tx.send(event).await;
            let _ = tx.send(CaptureEvent::Ended).await;
        });

        rx
    }
}

/// Block until one utterance has been captured or the session times out
///
/// The microphone stream is released when `mic` drops.
fn capture_utterance() -> std::result::Result<Vec<f32>, CaptureError> {
    let mic = MicCapture::open().map_err(|e| CaptureError::Backend(e.to_string()))?;

    let mut endpointer = UtteranceEndpointer::new();
    let deadline = std::time::Instant::now() + MAX_CAPTURE;

    loop {
        std::thread::sleep(POLL_INTERVAL);

        let samples = mic.take_buffer();
        if endpointer.process(&samples) {
            break Ok(endpointer.take_samples());
        }

        if endpointer.is_timed_out() || std::time::Instant::now() > deadline {
            break Err(CaptureError::NoSpeech);
        }
    }
}

/// Encode and transcribe captured samples
async fn transcribe_samples(transcriber: &Transcriber, samples: &[f32]) -> CaptureEvent {
    let wav = match encode_wav(samples, SAMPLE_RATE) {
        Ok(wav) => wav,
        Err(e) => return CaptureEvent::Error(CaptureError::Backend(e.to_string())),
    };

    match transcriber.transcribe(&wav).await {
        Ok(text) if text.trim().is_empty() => CaptureEvent::Error(CaptureError::NoSpeech),
        Ok(text) => CaptureEvent::Result(text),
        Err(e) => CaptureEvent::Error(CaptureError::Backend(e.to_string())),
    }
}

/// Capture binding for hosts without speech recognition
///
/// Emits the capability error immediately; `Started` never fires, so the
/// listening indicator never lights up.
pub struct UnsupportedCapture;

#[async_trait]
impl SpeechCapture for UnsupportedCapture {
    async fn start(&self) -> mpsc::Receiver<CaptureEvent> {
        let (tx, rx) = mpsc::channel(2);
        let _ = tx.send(CaptureEvent::Error(CaptureError::Unsupported)).await;
        let _ = tx.send(CaptureEvent::Ended).await;
        rx
    }
}

/// Select the speech capture binding for this host
///
/// Probes the STT configuration and the default input device at startup;
/// the session controller only ever sees the trait.
#[must_use]
pub fn capture_binding(config: &Config) -> Arc<dyn SpeechCapture> {
    let transcriber = match Transcriber::new(&config.speech, &config.locale) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "STT unavailable, voice capture disabled");
            return Arc::new(UnsupportedCapture);
        }
    };

    if !MicCapture::probe() {
        tracing::warn!("no usable input device, voice capture disabled");
        return Arc::new(UnsupportedCapture);
    }

    Arc::new(MicSpeechCapture::new(transcriber))
}
