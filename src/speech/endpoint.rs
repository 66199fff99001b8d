//! Utterance endpointing
//!
//! Segments a single spoken utterance out of the microphone stream using
//! energy-based voice activity detection. Each capture session is single
//! shot: the endpointer either completes one utterance or times out.

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to accept an utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration to consider end of utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Total samples to wait for speech before giving up
const NO_SPEECH_TIMEOUT_SAMPLES: usize = 96_000; // 6 seconds

/// State of the utterance endpointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointerState {
    /// Waiting for speech
    Idle,
    /// Accumulating an utterance
    Speech,
    /// Utterance complete
    Complete,
}

/// Segments one utterance from an audio stream
pub struct UtteranceEndpointer {
    state: EndpointerState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
    idle_counter: usize,
}

impl UtteranceEndpointer {
    /// Create a new endpointer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: EndpointerState::Idle,
            speech_buffer: Vec::new(),
            silence_counter: 0,
            idle_counter: 0,
        }
    }

    /// Process audio samples
    ///
    /// Returns true once the utterance is complete (speech followed by
    /// sufficient trailing silence). Further samples are ignored after
    /// completion.
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            EndpointerState::Idle => {
                if is_speech {
                    self.state = EndpointerState::Speech;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected");
                } else {
                    self.idle_counter += samples.len();
                }
            }
            EndpointerState::Speech => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_buffer.len() > MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                    self.state = EndpointerState::Complete;
                    return true;
                }

                // Brief noise that never became real speech
                if self.silence_counter > SILENCE_SAMPLES * 2
                    && self.speech_buffer.len() <= MIN_SPEECH_SAMPLES
                {
                    tracing::trace!("noise blip, resetting");
                    self.state = EndpointerState::Idle;
                    self.speech_buffer.clear();
                    self.silence_counter = 0;
                }
            }
            EndpointerState::Complete => {}
        }

        false
    }

    /// Whether the no-speech timeout has elapsed without an utterance
    #[must_use]
    pub const fn is_timed_out(&self) -> bool {
        matches!(self.state, EndpointerState::Idle) && self.idle_counter > NO_SPEECH_TIMEOUT_SAMPLES
    }

    /// Take the accumulated utterance samples, clearing the buffer
    pub fn take_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.speech_buffer)
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> EndpointerState {
        self.state
    }
}

impl Default for UtteranceEndpointer {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
