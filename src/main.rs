use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use speak_selection::config::SettingsOverrides;
use speak_selection::{
    AppError, CredentialResolver, DirectoryDownloads, EventReport, FileCredentialStore,
    PlaybackSession, ProcessSurface, ProviderId, ProviderRegistry, Settings, SpeakOutcome,
    SpeechController, SpeechOptions, StatusObserver, SynthesisOrchestrator, TerminalPrompt,
};

/// speak-selection - read selected text aloud
#[derive(Parser, Debug)]
#[command(name = "speak-selection")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Text to speak (read from stdin when absent)
    text: Option<String>,

    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Speech provider: openai, elevenlabs, azure or local
    #[arg(short = 'p', long)]
    provider: Option<String>,

    /// Voice name or id
    #[arg(short = 'v', long)]
    voice: Option<String>,

    /// Speaking rate multiplier (0.25 to 4.0)
    #[arg(short = 's', long)]
    speed: Option<f32>,

    /// Longest selection accepted, in characters
    #[arg(long, value_name = "N")]
    max_chars: Option<usize>,

    /// Write the audio to FILE instead of playing it
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// List the available providers and exit
    #[arg(long)]
    list_providers: bool,
}

/// Keys typed while audio is playing.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Pause,
    Resume,
    Stop,
    Download(Option<PathBuf>),
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (key, rest) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "s" | "stop" => Some(Self::Stop),
            "d" | "download" => {
                let rest = rest.trim();
                Some(Self::Download((!rest.is_empty()).then(|| PathBuf::from(rest))))
            }
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

struct StatusLine;

impl StatusObserver for StatusLine {
    fn on_status(&self, active: bool) {
        if active {
            eprintln!("Speaking. Commands: [p]ause [r]esume [s]top [d]ownload [PATH] [q]uit");
        } else {
            eprintln!("Done.");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists (must be done before settings loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app) => eprintln!("{}", app.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.list_providers {
        list_providers();
        return Ok(());
    }

    let settings = Settings::load(cli.config.as_deref())
        .and_then(|s| {
            s.with_overrides(SettingsOverrides {
                provider: cli.provider,
                voice: cli.voice,
                speed: cli.speed,
                max_chars: cli.max_chars,
            })
        })
        .map_err(AppError::from)?;
    info!(provider = %settings.provider, voice = %settings.effective_voice(), "Settings loaded");

    let text = match cli.text {
        Some(text) => text,
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read text from stdin")?;
            text
        }
    };

    let mut controller = build_controller(&settings)?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            ctrl_c.cancel();
        }
    });

    if let Some(dest) = cli.save {
        return match controller.synthesize_to_file(&text, &dest, &cancel).await? {
            Some(bytes) => {
                eprintln!("Saved {bytes} bytes to {}", dest.display());
                Ok(())
            }
            None => {
                eprintln!("Cancelled.");
                Ok(())
            }
        };
    }

    let on_stop = Box::new(|| debug!("Audio released"));
    if controller.speak(&text, &cancel, on_stop).await? == SpeakOutcome::Cancelled {
        eprintln!("Cancelled.");
        return Ok(());
    }

    let mut commands = spawn_command_reader();
    let mut commands_open = true;

    while controller.session().is_active() {
        tokio::select! {
            _ = cancel.cancelled() => {
                controller.dispose();
                break;
            }
            event = controller.next_event() => {
                if let Some(event) = event {
                    report_event(controller.process_event(event).await);
                }
            }
            command = commands.recv(), if commands_open => match command {
                Some(Command::Pause) => controller.pause(),
                Some(Command::Resume) => controller.resume(),
                Some(Command::Stop) => controller.stop(),
                Some(Command::Download(Some(dest))) => match controller.save_current(&dest).await {
                    Ok(bytes) => eprintln!("Saved {bytes} bytes to {}", dest.display()),
                    Err(e) => eprintln!("{}", e.user_message()),
                },
                Some(Command::Download(None)) => match controller.download().await {
                    Ok(Some(dest)) => eprintln!("Saved to {}", dest.display()),
                    Ok(None) => {}
                    Err(e) => eprintln!("{}", e.user_message()),
                },
                Some(Command::Quit) => {
                    controller.dispose();
                    break;
                }
                None => commands_open = false,
            },
        }
    }

    controller.dispose();
    Ok(())
}

fn report_event(report: EventReport) {
    match report {
        EventReport::Downloaded(dest) => eprintln!("Saved to {}", dest.display()),
        EventReport::DownloadFailed(e) => eprintln!("{}", e.user_message()),
        EventReport::Applied(_) | EventReport::DownloadDeclined => {}
    }
}

fn build_controller(settings: &Settings) -> anyhow::Result<SpeechController> {
    let store_path = settings
        .credentials_path
        .clone()
        .or_else(FileCredentialStore::default_path)
        .ok_or_else(|| anyhow!("No configuration directory available for the credential store"))?;
    let credentials = CredentialResolver::new(
        Arc::new(FileCredentialStore::new(store_path)),
        Arc::new(TerminalPrompt),
    );

    let registry = ProviderRegistry::new().with_endpoints(&settings.endpoints);
    let orchestrator = SynthesisOrchestrator::new(Arc::new(registry), credentials)
        .with_backend_defaults(settings.backend_defaults());

    let surface = ProcessSurface::new(settings.player.clone());
    let mut session = PlaybackSession::new(Box::new(surface), settings.temp_dir.clone());
    session.add_observer(Arc::new(StatusLine));

    Ok(SpeechController::new(
        orchestrator,
        session,
        Arc::new(DirectoryDownloads::user_default()),
        SpeechOptions::from(settings),
    ))
}

/// Forward typed commands from a blocking stdin reader.
fn spawn_command_reader() -> mpsc::UnboundedReceiver<Command> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match Command::parse(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => eprintln!("Unknown command '{}'", line.trim()),
            }
        }
    });
    rx
}

fn list_providers() {
    for provider in ProviderId::all() {
        let credential = provider
            .credential_env_var()
            .map(|var| format!("API key ({var})"))
            .unwrap_or_else(|| "no credential".to_string());
        println!(
            "{:<12} {:<22} default voice: {:<22} {}",
            provider.as_str(),
            provider.display_name(),
            provider.default_voice(),
            credential
        );
    }
}
