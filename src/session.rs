//! Voice session orchestration
//!
//! Drives one voice interaction through a fixed sequence: capture an
//! utterance, speak an acknowledgment, pause briefly, dispatch the
//! transcript, then surface (and on success speak) the result. Each
//! asynchronous completion carries the session generation it was issued
//! under; completions from a superseded session are discarded.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::dispatch::Dispatch;
use crate::speech::{CaptureEvent, SpeechCapture, SpeechSynthesis};

/// Shown when dispatch fails without server-provided text
const MSG_DEVICE_UNRESPONSIVE: &str = "device did not respond";

/// Logical phase of a voice session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session in progress
    #[default]
    Idle,
    /// Capturing an utterance
    Listening,
    /// Speaking the acknowledgment phrase
    Acknowledging,
    /// Awaiting the dispatched command's result
    Dispatching,
}

/// UI-visible state of the voice session
///
/// After a completed cycle at most one of `response`/`error` is non-empty;
/// both are cleared when a new session starts. `listening` tracks the
/// recognizer's own start/end signals, not the logical phase.
#[derive(Debug, Clone, Default)]
pub struct VoiceSessionState {
    /// Whether the recognizer is currently listening
    pub listening: bool,

    /// Last recognized transcript
    pub transcript: String,

    /// Response body from a successful dispatch
    pub response: String,

    /// User-visible error message
    pub error: String,
}

#[derive(Default)]
struct Inner {
    state: VoiceSessionState,
    phase: SessionPhase,
    generation: u64,
}

/// Orchestrates voice interactions
pub struct VoiceSession {
    capture: Arc<dyn SpeechCapture>,
    synthesis: Arc<dyn SpeechSynthesis>,
    dispatcher: Arc<dyn Dispatch>,
    endpoint: String,
    ack_phrase: String,
    dispatch_delay: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl VoiceSession {
    /// Create a new voice session controller
    #[must_use]
    pub fn new(
        capture: Arc<dyn SpeechCapture>,
        synthesis: Arc<dyn SpeechSynthesis>,
        dispatcher: Arc<dyn Dispatch>,
        config: &Config,
    ) -> Self {
        Self {
            capture,
            synthesis,
            dispatcher,
            endpoint: config.voice_endpoint.clone(),
            ack_phrase: config.ack_phrase.clone(),
            dispatch_delay: Duration::from_millis(config.dispatch_delay_ms),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Snapshot the UI-visible state
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn state(&self) -> VoiceSessionState {
        self.inner.lock().unwrap().state.clone()
    }

    /// Current logical phase
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner.lock().unwrap().phase
    }

    /// Run one voice session to completion
    ///
    /// Ignored while a capture is already in progress. A new session MAY
    /// start while an earlier acknowledgment or dispatch is still pending;
    /// the superseded pipeline discards its remaining updates.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub async fn start_listening(&self) {
        let generation = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state.listening || inner.phase == SessionPhase::Listening {
                tracing::debug!("already listening, trigger ignored");
                return;
            }
            inner.generation += 1;
            inner.phase = SessionPhase::Listening;
            inner.state.transcript.clear();
            inner.state.response.clear();
            inner.state.error.clear();
            inner.generation
        };

        tracing::debug!(generation, "voice session started");

        let mut events = self.capture.start().await;
        let mut transcript: Option<String> = None;

        while let Some(event) = events.recv().await {
            let mut inner = self.inner.lock().unwrap();
            if inner.generation != generation {
                tracing::debug!(generation, "stale capture event discarded");
                continue;
            }

            match event {
                CaptureEvent::Started => {
                    inner.state.listening = true;
                    inner.state.transcript.clear();
                }
                CaptureEvent::Result(text) => {
                    tracing::info!(transcript = %text, "utterance recognized");
                    inner.state.transcript = text.clone();
                    inner.phase = SessionPhase::Acknowledging;
                    transcript = Some(text);
                }
                CaptureEvent::Error(e) => {
                    tracing::warn!(error = %e, "capture failed");
                    inner.state.error = e.to_string();
                    inner.state.listening = false;
                    inner.phase = SessionPhase::Idle;
                    transcript = None;
                }
                CaptureEvent::Ended => {
                    // Authoritative signal for the listening indicator,
                    // decoupled from the logical phase
                    inner.state.listening = false;
                }
            }
        }

        let Some(text) = transcript else {
            return;
        };

        {
            let inner = self.inner.lock().unwrap();
            if inner.generation != generation {
                tracing::debug!(generation, "session superseded before acknowledgment");
                return;
            }
        }

        // Dispatch is causally ordered after acknowledgment completion. A
        // synthesis failure counts as completion so a broken speaker does
        // not disable the remote.
        if let Err(e) = self.synthesis.speak(&self.ack_phrase).await {
            tracing::warn!(error = %e, "acknowledgment synthesis failed");
        }

        // Pacing gap so the acknowledgment finishes before the response
        tokio::time::sleep(self.dispatch_delay).await;

        {
            let mut inner = self.inner.lock().unwrap();
            if inner.generation != generation {
                tracing::debug!(generation, "session superseded before dispatch");
                return;
            }
            inner.phase = SessionPhase::Dispatching;
        }

        let result = self.dispatcher.dispatch(&self.endpoint, Some(&text)).await;

        let spoken_response = {
            let mut inner = self.inner.lock().unwrap();
            if inner.generation != generation {
                tracing::debug!(generation, "stale dispatch result discarded");
                return;
            }
            inner.phase = SessionPhase::Idle;

            if result.ok {
                inner.state.response = result.body.clone();
                Some(result.body)
            } else {
                inner.state.error = if result.body.is_empty() {
                    MSG_DEVICE_UNRESPONSIVE.to_string()
                } else {
                    result.body
                };
                // Failures are displayed, never spoken
                None
            }
        };

        if let Some(body) = spoken_response {
            if !body.is_empty() {
                let synthesis = Arc::clone(&self.synthesis);
                tokio::spawn(async move {
                    if let Err(e) = synthesis.speak(&body).await {
                        tracing::warn!(error = %e, "response synthesis failed");
                    }
                });
            }
        }
    }
}
