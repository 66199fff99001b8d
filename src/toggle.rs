//! Device toggle controller
//!
//! The simple sibling of the voice session: one button, one request, one
//! status line. At most one dispatch is outstanding per device; re-entrant
//! triggers are ignored, not queued.

use std::sync::{Arc, Mutex};

use crate::dispatch::Dispatch;

/// Shown when a toggle fails for any reason
const MSG_DEVICE_UNRESPONSIVE: &str = "device did not respond";

/// UI-visible state of one device card
#[derive(Debug, Clone, Default)]
pub struct ToggleState {
    /// Whether a dispatch is outstanding
    pub loading: bool,

    /// Last result text, if any
    pub status: Option<String>,
}

/// Fires toggle commands for a fixed device endpoint
pub struct DeviceToggle {
    name: String,
    endpoint: String,
    dispatcher: Arc<dyn Dispatch>,
    state: Arc<Mutex<ToggleState>>,
}

impl DeviceToggle {
    /// Create a toggle controller for one device
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        dispatcher: Arc<dyn Dispatch>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            dispatcher,
            state: Arc::new(Mutex::new(ToggleState::default())),
        }
    }

    /// Device display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot the UI-visible state
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn state(&self) -> ToggleState {
        self.state.lock().unwrap().clone()
    }

    /// Fire the toggle command
    ///
    /// Ignored while a dispatch is already outstanding. Success shows the
    /// response body; any failure (transport or HTTP-level) shows a fixed
    /// message.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub async fn trigger(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if state.loading {
                tracing::debug!(device = %self.name, "toggle ignored, dispatch outstanding");
                return;
            }
            state.loading = true;
            state.status = None;
        }

        tracing::info!(device = %self.name, endpoint = %self.endpoint, "toggling device");
        let result = self.dispatcher.dispatch(&self.endpoint, None).await;

        let mut state = self.state.lock().unwrap();
        state.status = Some(if result.ok {
            result.body
        } else {
            MSG_DEVICE_UNRESPONSIVE.to_string()
        });
        state.loading = false;
    }
}
