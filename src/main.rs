use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use lumen_remote::speech::{self, HttpSpeechSynthesis, SpeechSynthesis};
use lumen_remote::{Config, DeviceToggle, HttpDispatcher, VoiceSession};

/// Lumen - voice and button remote for networked lighting devices
#[derive(Parser)]
#[command(name = "lumen", version, about)]
struct Cli {
    /// Path to a config file (defaults to ~/.config/lumen/config.toml)
    #[arg(short, long, env = "LUMEN_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List known device endpoints
    Devices,
    /// Toggle a device by name
    Toggle {
        /// Device name (e.g. "kitchen")
        name: String,
    },
    /// Run a single voice session
    Voice,
    /// Test TTS output
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,lumen_remote=info",
        1 => "info,lumen_remote=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_ref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Some(Command::Devices) => {
            list_devices(&config);
            Ok(())
        }
        Some(Command::Toggle { name }) => toggle_device(&config, &name).await,
        Some(Command::Voice) => {
            voice_session(&config).await;
            Ok(())
        }
        Some(Command::Say { text }) => say(&config, &text).await,
        None => console(&config).await,
    }
}

/// Print the known device endpoints
fn list_devices(config: &Config) {
    for device in &config.devices {
        println!("{:<16} {}", device.name, device.endpoint);
    }
}

/// Fire one toggle command and print the result
async fn toggle_device(config: &Config, name: &str) -> anyhow::Result<()> {
    let device = config
        .find_device(name)
        .ok_or_else(|| anyhow::anyhow!("unknown device: {name}"))?;

    let dispatcher = Arc::new(HttpDispatcher::new(Duration::from_secs(
        config.dispatch_timeout_secs,
    ))?);
    let toggle = DeviceToggle::new(device.name.clone(), device.endpoint.clone(), dispatcher);

    toggle.trigger().await;

    if let Some(status) = toggle.state().status {
        println!("{}: {status}", toggle.name());
    }
    Ok(())
}

/// Run a single voice session and print the outcome
async fn voice_session(config: &Config) {
    let session = match build_session(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "could not set up voice session");
            return;
        }
    };

    println!("Listening...");
    session.start_listening().await;

    let state = session.state();
    if !state.transcript.is_empty() {
        println!("You said: \"{}\"", state.transcript);
    }
    if !state.response.is_empty() {
        println!("{}", state.response);
    }
    if !state.error.is_empty() {
        println!("error: {}", state.error);
    }

    // Let the spoken response finish before the process exits
    tokio::time::sleep(Duration::from_millis(200)).await;
}

/// Test TTS output
async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Speaking: \"{text}\"");
    let synthesis = HttpSpeechSynthesis::new(&config.speech, &config.locale)?;
    synthesis.speak(text).await?;
    Ok(())
}

/// Interactive console: toggles by number, voice sessions on demand
async fn console(config: &Config) -> anyhow::Result<()> {
    println!("Lumen remote");
    for (i, device) in config.devices.iter().enumerate() {
        println!("  [{}] {}", i + 1, device.name);
    }
    println!("  [v] voice command   [q] quit");

    let dispatcher = Arc::new(HttpDispatcher::new(Duration::from_secs(
        config.dispatch_timeout_secs,
    ))?);
    let toggles: Vec<DeviceToggle> = config
        .devices
        .iter()
        .map(|d| {
            DeviceToggle::new(d.name.clone(), d.endpoint.clone(), Arc::clone(&dispatcher) as _)
        })
        .collect();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        use std::io::Write as _;
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "q" | "quit" => break,
            "v" | "voice" | "" => voice_session(config).await,
            input => {
                let Some(toggle) = input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| toggles.get(i))
                else {
                    println!("unknown command: {input}");
                    continue;
                };

                toggle.trigger().await;
                if let Some(status) = toggle.state().status {
                    println!("{}: {status}", toggle.name());
                }
            }
        }
    }

    Ok(())
}

/// Wire up a voice session from config
///
/// Capture falls back to the unsupported binding on its own; synthesis
/// falls back to printing when the TTS service is not configured.
fn build_session(config: &Config) -> anyhow::Result<VoiceSession> {
    let dispatcher = Arc::new(HttpDispatcher::new(Duration::from_secs(
        config.dispatch_timeout_secs,
    ))?);

    let capture = speech::capture_binding(config);

    let synthesis: Arc<dyn SpeechSynthesis> =
        match HttpSpeechSynthesis::new(&config.speech, &config.locale) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                tracing::warn!(error = %e, "TTS unavailable, printing instead of speaking");
                Arc::new(PrintSynthesis)
            }
        };

    Ok(VoiceSession::new(capture, synthesis, dispatcher, config))
}

/// Synthesis fallback that prints rather than speaks
struct PrintSynthesis;

#[async_trait::async_trait]
impl SpeechSynthesis for PrintSynthesis {
    async fn speak(&self, text: &str) -> lumen_remote::Result<()> {
        println!("(speech) {text}");
        Ok(())
    }
}
