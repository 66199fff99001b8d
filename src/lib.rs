//! Lumen Remote - voice and button remote for networked lighting devices
//!
//! This library provides the core functionality for the Lumen remote:
//! - Voice session pipeline (speech capture, STT, dispatch, spoken feedback)
//! - One-shot device toggle commands
//! - HTTP dispatch to device endpoints
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Front end (CLI)                    │
//! │        toggle commands  │  voice sessions            │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Lumen Remote                        │
//! │  Capture │ Endpointing │ STT │ TTS │ Dispatch       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │          Device endpoints (HTTP, plain text)         │
//! │   toggle endpoints per device  │  voice endpoint     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod session;
pub mod speech;
pub mod toggle;

pub use config::{Config, DeviceEndpoint};
pub use dispatch::{CommandResult, Dispatch, HttpDispatcher};
pub use error::{Error, Result};
pub use session::{SessionPhase, VoiceSession, VoiceSessionState};
pub use speech::{CaptureError, CaptureEvent, SpeechCapture, SpeechSynthesis};
pub use toggle::{DeviceToggle, ToggleState};
