//! Speech-to-text over HTTP

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Response from the transcription API
#[derive(Debug, serde::Deserialize)]
struct TranscriptionResponse {
    results: TranscriptionResults,
}

#[derive(Debug, serde::Deserialize)]
struct TranscriptionResults {
    channels: Vec<TranscriptionChannel>,
}

#[derive(Debug, serde::Deserialize)]
struct TranscriptionChannel {
    alternatives: Vec<TranscriptionAlternative>,
}

#[derive(Debug, serde::Deserialize)]
struct TranscriptionAlternative {
    transcript: String,
}

/// Transcribes speech to text via the configured STT service
pub struct Transcriber {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    language: String,
}

impl Transcriber {
    /// Create a new transcriber
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured
    pub fn new(config: &SpeechConfig, locale: &str) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("speech API key required for STT".to_string()))?;

        // STT services take a bare language code, not a full locale
        let language = locale.split('-').next().unwrap_or(locale).to_string();

        Ok(Self {
            client: reqwest::Client::new(),
            url: config.stt_url.clone(),
            api_key,
            model: config.stt_model.clone(),
            language,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// Returns the best transcript only: the first alternative of the
    /// first channel.
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let url = format!(
            "{}?model={}&language={}&punctuate=true",
            self.url, self.model, self.language
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "STT request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "STT API error");
            return Err(Error::Stt(format!("STT API error {status}: {body}")));
        }

        let body = response.text().await?;
        let parsed: TranscriptionResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "failed to parse STT response");
            e
        })?;

        let transcript = best_transcript(parsed);
        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }
}

/// Pull the best transcript out of a response: the first alternative of
/// the first channel
fn best_transcript(response: TranscriptionResponse) -> String {
    response
        .results
        .channels
        .into_iter()
        .next()
        .and_then(|c| c.alternatives.into_iter().next())
        .map(|a| a.transcript)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_transcript_takes_first_alternative_of_first_channel() {
        let parsed: TranscriptionResponse = serde_json::from_str(
            r#"{"results":{"channels":[
                {"alternatives":[
                    {"transcript":"turn on the lamp"},
                    {"transcript":"turn off the lamp"}
                ]},
                {"alternatives":[{"transcript":"other channel"}]}
            ]}}"#,
        )
        .unwrap();

        assert_eq!(best_transcript(parsed), "turn on the lamp");
    }

    #[test]
    fn empty_results_yield_empty_transcript() {
        let parsed: TranscriptionResponse =
            serde_json::from_str(r#"{"results":{"channels":[]}}"#).unwrap();

        assert!(best_transcript(parsed).is_empty());
    }

    #[test]
    fn malformed_response_maps_to_serialization_error() {
        let err = serde_json::from_str::<TranscriptionResponse>("not json").unwrap_err();
        assert!(matches!(Error::from(err), Error::Serialization(_)));
    }
}
