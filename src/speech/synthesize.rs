//! Text-to-speech over HTTP

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{AudioPlayback, SpeechSynthesis};
use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Pitch for all synthesized speech (raised above neutral)
const TTS_PITCH: f32 = 1.2;

/// Rate for all synthesized speech (neutral)
const TTS_RATE: f32 = 1.0;

/// A voice offered by the TTS service
#[derive(Debug, Clone, serde::Deserialize)]
pub struct VoiceInfo {
    /// Voice identifier
    pub name: String,

    /// Locale the voice speaks (BCP 47)
    pub lang: String,
}

/// Pick a preferred voice from the service's list
///
/// Prefers a voice matching the target locale whose name hints at a
/// specific gender. This is a soft preference: `None` means the service
/// default voice should be used.
#[must_use]
pub fn select_voice<'a>(voices: &'a [VoiceInfo], locale: &str) -> Option<&'a VoiceInfo> {
    voices
        .iter()
        .find(|v| v.lang == locale && v.name.to_lowercase().contains("female"))
}

/// Synthesizes and plays speech via the configured TTS service
pub struct HttpSpeechSynthesis {
    client: reqwest::Client,
    url: String,
    voices_url: Option<String>,
    api_key: String,
    model: String,
    locale: String,
    // Resolved once per process; inner None = service default voice
    voice: OnceCell<Option<String>>,
}

#[derive(serde::Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
    pitch: f32,
    speed: f32,
}

impl HttpSpeechSynthesis {
    /// Create a new synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured
    pub fn new(config: &SpeechConfig, locale: &str) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("speech API key required for TTS".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            url: config.tts_url.clone(),
            voices_url: config.voices_url.clone(),
            api_key,
            model: config.tts_model.clone(),
            locale: locale.to_string(),
            voice: OnceCell::new(),
        })
    }

    /// Resolve the preferred voice, fetching the service's list once
    ///
    /// Absence of a matching voice (or of the list itself) is not an
    /// error; the service default is used instead.
    async fn resolve_voice(&self) -> Option<String> {
        self.voice
            .get_or_init(|| async {
                let url = self.voices_url.as_ref()?;

                let voices: Vec<VoiceInfo> = match self.fetch_voices(url).await {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::debug!(error = %e, "voice list unavailable, using default voice");
                        return None;
                    }
                };

                let selected = select_voice(&voices, &self.locale).map(|v| v.name.clone());
                match &selected {
                    Some(name) => tracing::debug!(voice = %name, "selected voice"),
                    None => tracing::debug!(locale = %self.locale, "no matching voice, using default"),
                }
                selected
            })
            .await
            .clone()
    }

    async fn fetch_voices(&self, url: &str) -> Result<Vec<VoiceInfo>> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Tts(format!(
                "voice list error {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    /// Synthesize text to MP3 bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let voice = self.resolve_voice().await;

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: voice.as_deref(),
            pitch: TTS_PITCH,
            speed: TTS_RATE,
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesis for HttpSpeechSynthesis {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "speaking");

        let audio = self.synthesize(text).await?;

        // cpal playback blocks until the clip finishes
        let audio = Arc::new(audio);
        tokio::task::spawn_blocking(move || {
            let playback = AudioPlayback::new()?;
            playback.play_mp3(&audio)
        })
        .await
        .map_err(|e| Error::Tts(format!("playback task failed: {e}")))?
    }
}
