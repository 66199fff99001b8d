//! Shared fakes for controller tests
//!
//! All fakes record into one chronological event log so tests can assert
//! ordering across collaborators (e.g. acknowledgment before dispatch).

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use lumen_remote::dispatch::{CommandResult, Dispatch};
use lumen_remote::speech::{CaptureError, CaptureEvent, SpeechCapture, SpeechSynthesis};
use lumen_remote::{Config, Error, Result};

/// Chronological log of fake collaborator activity
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Config with a fixed endpoint and short pacing delay for tests
pub fn test_config() -> Config {
    Config {
        voice_endpoint: "http://device.test/voice".to_string(),
        ack_phrase: "okay".to_string(),
        dispatch_delay_ms: 200,
        ..Config::default()
    }
}

/// Capture fake replaying scripted events, one script per `start` call
pub struct ScriptedCapture {
    scripts: Mutex<VecDeque<Vec<CaptureEvent>>>,
    listen_time: Duration,
    hold_open: Duration,
    starts: Mutex<usize>,
}

impl ScriptedCapture {
    pub fn with_scripts(scripts: Vec<Vec<CaptureEvent>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            listen_time: Duration::ZERO,
            hold_open: Duration::ZERO,
            starts: Mutex::new(0),
        }
    }

    /// One session producing a successful transcript
    pub fn utterance(text: &str) -> Self {
        Self::with_scripts(vec![vec![
            CaptureEvent::Started,
            CaptureEvent::Result(text.to_string()),
            CaptureEvent::Ended,
        ]])
    }

    /// One session ending in a capture error
    pub fn failure(error: CaptureError) -> Self {
        Self::with_scripts(vec![vec![
            CaptureEvent::Started,
            CaptureEvent::Error(error),
            CaptureEvent::Ended,
        ]])
    }

    /// Host without speech recognition: no `Started`, error right away
    pub fn unsupported() -> Self {
        Self::with_scripts(vec![vec![
            CaptureEvent::Error(CaptureError::Unsupported),
            CaptureEvent::Ended,
        ]])
    }

    /// Hold the session in the listening state for `duration` between the
    /// first event and the rest
    pub fn listen_time(mut self, duration: Duration) -> Self {
        self.listen_time = duration;
        self
    }

    /// Keep the event channel open for `duration` after the final event
    pub fn hold_open(mut self, duration: Duration) -> Self {
        self.hold_open = duration;
        self
    }

    /// Number of capture sessions actually started
    pub fn starts(&self) -> usize {
        *self.starts.lock().unwrap()
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn start(&self) -> mpsc::Receiver<CaptureEvent> {
        *self.starts.lock().unwrap() += 1;
        let mut events = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("no capture script left");
        let (tx, rx) = mpsc::channel(8);
        let listen_time = self.listen_time;
        let hold_open = self.hold_open;

        tokio::spawn(async move {
            if !events.is_empty() {
                let first = events.remove(0);
                let _ = tx.send(first).await;
            }
            tokio::time::sleep(listen_time).await;
            for event in events {
                let _ = tx.send(event).await;
            }
            tokio::time::sleep(hold_open).await;
        });

        rx
    }
}

/// Synthesis fake that records every phrase and its completion
pub struct RecordingSynthesis {
    log: EventLog,
    delay: Duration,
    fail: bool,
}

impl RecordingSynthesis {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            delay: Duration::from_millis(10),
            fail: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every `speak` call fails after the playback delay
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl SpeechSynthesis for RecordingSynthesis {
    async fn speak(&self, text: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("speak:{text}"));
        tokio::time::sleep(self.delay).await;
        if self.fail {
            self.log.lock().unwrap().push(format!("speak-error:{text}"));
            return Err(Error::Tts("fake synthesis failure".to_string()));
        }
        self.log.lock().unwrap().push(format!("spoke:{text}"));
        Ok(())
    }
}

/// Dispatcher fake returning scripted results
pub struct ScriptedDispatcher {
    results: Mutex<VecDeque<CommandResult>>,
    fallback: CommandResult,
    delay: Duration,
    log: EventLog,
    payloads: Mutex<Vec<Option<String>>>,
}

impl ScriptedDispatcher {
    pub fn new(log: EventLog, result: CommandResult) -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            fallback: result,
            delay: Duration::ZERO,
            log,
            payloads: Mutex::new(Vec::new()),
        }
    }

    /// Queue results for successive calls; the constructor result is the
    /// fallback once the queue is empty
    pub fn with_queued(self, results: Vec<CommandResult>) -> Self {
        *self.results.lock().unwrap() = results.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<Option<String>> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatch for ScriptedDispatcher {
    async fn dispatch(&self, _endpoint: &str, payload: Option<&str>) -> CommandResult {
        self.log
            .lock()
            .unwrap()
            .push(format!("dispatch:{}", payload.unwrap_or("-")));
        self.payloads
            .lock()
            .unwrap()
            .push(payload.map(String::from));
        tokio::time::sleep(self.delay).await;
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
