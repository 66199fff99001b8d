//! Configuration for the Lumen remote
//!
//! Defaults are overlaid by `~/.config/lumen/config.toml` (all fields
//! optional), then by environment variables. Device endpoint addresses are
//! static configuration data; nothing here is persisted at runtime.

use std::path::PathBuf;

use serde::Deserialize;

/// Default base URL for device endpoints
const DEFAULT_DEVICE_HOST: &str = "http://192.168.1.13:80";

/// Lumen remote configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Recognition / synthesis locale (BCP 47, e.g. "en-US")
    pub locale: String,

    /// Phrase spoken to acknowledge a recognized command
    pub ack_phrase: String,

    /// Pacing gap between acknowledgment completion and dispatch (ms)
    pub dispatch_delay_ms: u64,

    /// HTTP timeout for command dispatch (seconds)
    pub dispatch_timeout_secs: u64,

    /// Endpoint receiving voice-command transcripts
    pub voice_endpoint: String,

    /// Known device toggle endpoints
    pub devices: Vec<DeviceEndpoint>,

    /// Speech service configuration
    pub speech: SpeechConfig,
}

/// A named device toggle endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEndpoint {
    /// Display name (e.g. "Living Room")
    pub name: String,

    /// Toggle endpoint URL
    pub endpoint: String,
}

/// Speech service (STT/TTS) configuration
#[derive(Debug, Clone, Default)]
pub struct SpeechConfig {
    /// STT service URL
    pub stt_url: String,

    /// STT model identifier
    pub stt_model: String,

    /// TTS service URL
    pub tts_url: String,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice-list URL (optional; used for voice preference only)
    pub voices_url: Option<String>,

    /// API key for the speech services
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            ack_phrase: "Okay, on it".to_string(),
            dispatch_delay_ms: 200,
            dispatch_timeout_secs: 10,
            voice_endpoint: format!("{DEFAULT_DEVICE_HOST}/voice"),
            devices: vec![
                DeviceEndpoint {
                    name: "All Lamps".to_string(),
                    endpoint: format!("{DEFAULT_DEVICE_HOST}/all-on"),
                },
                DeviceEndpoint {
                    name: "Living Room".to_string(),
                    endpoint: format!("{DEFAULT_DEVICE_HOST}/living-room"),
                },
                DeviceEndpoint {
                    name: "Bedroom".to_string(),
                    endpoint: format!("{DEFAULT_DEVICE_HOST}/bedroom"),
                },
                DeviceEndpoint {
                    name: "Kitchen".to_string(),
                    endpoint: format!("{DEFAULT_DEVICE_HOST}/kitchen"),
                },
            ],
            speech: SpeechConfig {
                stt_url: "https://api.deepgram.com/v1/listen".to_string(),
                stt_model: "nova-2".to_string(),
                tts_url: "https://api.openai.com/v1/audio/speech".to_string(),
                tts_model: "tts-1".to_string(),
                voices_url: None,
                api_key: None,
            },
        }
    }
}

impl Config {
    /// Load configuration: defaults, overlaid by the config file, then env
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly supplied config path cannot be read
    /// or parsed. The default config file degrades to defaults instead.
    pub fn load(path: Option<&PathBuf>) -> crate::Result<Self> {
        let file = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content)?
            }
            None => load_config_file(),
        };

        let mut config = Self::default();
        config.apply_file(file);
        config.apply_env();
        Ok(config)
    }

    /// Overlay values from the config file
    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(locale) = file.locale {
            self.locale = locale;
        }
        if let Some(phrase) = file.ack_phrase {
            self.ack_phrase = phrase;
        }
        if let Some(delay) = file.dispatch_delay_ms {
            self.dispatch_delay_ms = delay;
        }
        if let Some(timeout) = file.dispatch_timeout_secs {
            self.dispatch_timeout_secs = timeout;
        }
        if let Some(endpoint) = file.voice_endpoint {
            self.voice_endpoint = endpoint;
        }
        if let Some(devices) = file.devices {
            self.devices = devices;
        }

        let speech = file.speech;
        if let Some(url) = speech.stt_url {
            self.speech.stt_url = url;
        }
        if let Some(model) = speech.stt_model {
            self.speech.stt_model = model;
        }
        if let Some(url) = speech.tts_url {
            self.speech.tts_url = url;
        }
        if let Some(model) = speech.tts_model {
            self.speech.tts_model = model;
        }
        if speech.voices_url.is_some() {
            self.speech.voices_url = speech.voices_url;
        }
        if speech.api_key.is_some() {
            self.speech.api_key = speech.api_key;
        }
    }

    /// Overlay values from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("LUMEN_SPEECH_API_KEY") {
            if !key.is_empty() {
                self.speech.api_key = Some(key);
            }
        }
        if let Ok(endpoint) = std::env::var("LUMEN_VOICE_ENDPOINT") {
            if !endpoint.is_empty() {
                self.voice_endpoint = endpoint;
            }
        }
        if let Ok(locale) = std::env::var("LUMEN_LOCALE") {
            if !locale.is_empty() {
                self.locale = locale;
            }
        }
    }

    /// Look up a device endpoint by name (case-insensitive)
    #[must_use]
    pub fn find_device(&self, name: &str) -> Option<&DeviceEndpoint> {
        self.devices
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }
}

/// Top-level TOML configuration file schema
///
/// All fields are optional; the file is a partial overlay on top of
/// defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    locale: Option<String>,

    #[serde(default)]
    ack_phrase: Option<String>,

    #[serde(default)]
    dispatch_delay_ms: Option<u64>,

    #[serde(default)]
    dispatch_timeout_secs: Option<u64>,

    #[serde(default)]
    voice_endpoint: Option<String>,

    #[serde(default)]
    devices: Option<Vec<DeviceEndpoint>>,

    #[serde(default)]
    speech: SpeechFileConfig,
}

/// Speech service section of the config file
#[derive(Debug, Default, Deserialize)]
struct SpeechFileConfig {
    stt_url: Option<String>,
    stt_model: Option<String>,
    tts_url: Option<String>,
    tts_model: Option<String>,
    voices_url: Option<String>,
    api_key: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be
/// parsed.
fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/lumen/config.toml`
fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("lumen").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_devices_and_voice_endpoint() {
        let config = Config::default();
        assert_eq!(config.devices.len(), 4);
        assert!(config.voice_endpoint.ends_with("/voice"));
        assert_eq!(config.locale, "en-US");
    }

    #[test]
    fn partial_overlay_keeps_unnamed_fields() {
        let file: ConfigFile = toml::from_str(
            r#"
            locale = "id-ID"

            [[devices]]
            name = "Porch"
            endpoint = "http://10.0.0.2/porch"
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        let default_phrase = config.ack_phrase.clone();
        config.apply_file(file);

        assert_eq!(config.locale, "id-ID");
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].name, "Porch");
        // Untouched by the overlay
        assert_eq!(config.ack_phrase, default_phrase);
        assert_eq!(config.dispatch_delay_ms, 200);
    }

    #[test]
    fn speech_section_overlay() {
        let file: ConfigFile = toml::from_str(
            r#"
            [speech]
            api_key = "test-key"
            stt_model = "nova-3"
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_file(file);

        assert_eq!(config.speech.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.speech.stt_model, "nova-3");
        // Untouched by the overlay
        assert!(config.speech.tts_url.contains("api.openai.com"));
    }

    #[test]
    fn find_device_is_case_insensitive() {
        let config = Config::default();
        assert!(config.find_device("kitchen").is_some());
        assert!(config.find_device("KITCHEN").is_some());
        assert!(config.find_device("garage").is_none());
    }
}
