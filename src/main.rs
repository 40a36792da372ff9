//! EyeBreak CLI - periodic eye-rest reminders
//!
//! Every work interval the daemon starts a short break:
//! - 20 minutes of work by default
//! - 60 seconds of break, showing the selected media
//! - Competing media playback is paused for the break

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use eyebreak::cli::{Cli, Commands, Display, IpcClient, MediaCommands, SetCommands};
use eyebreak::daemon::{IpcServer, RequestHandler, TimerEngine, TimerEvent};
use eyebreak::playlist::{default_candidates, PlaylistResolver};
use eyebreak::settings::{PlistSettingsStore, SettingsStore};
use eyebreak::types::SystemSignal;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Status) => {
            let client = IpcClient::new()?;
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Break) => {
            let client = IpcClient::new()?;
            Display::show_success(&client.start_break().await?);
        }
        Some(Commands::Skip) => {
            let client = IpcClient::new()?;
            Display::show_success(&client.skip_break().await?);
        }
        Some(Commands::Media(MediaCommands::Select { path })) => {
            let client = IpcClient::new()?;
            Display::show_success(&client.select_media(&path).await?);
        }
        Some(Commands::Media(MediaCommands::Clear)) => {
            let client = IpcClient::new()?;
            Display::show_success(&client.clear_media().await?);
        }
        Some(Commands::Set(SetCommands::Work { minutes })) => {
            let client = IpcClient::new()?;
            Display::show_success(&client.set_work_minutes(minutes).await?);
        }
        Some(Commands::Set(SetCommands::Break { seconds })) => {
            let client = IpcClient::new()?;
            Display::show_success(&client.set_break_seconds(seconds).await?);
        }
        Some(Commands::Sleep) => {
            let client = IpcClient::new()?;
            Display::show_success(&client.sleep().await?);
        }
        Some(Commands::Wake) => {
            let client = IpcClient::new()?;
            Display::show_success(&client.wake().await?);
        }
        Some(Commands::Daemon { socket }) => {
            run_daemon(socket).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

// ============================================================================
// Daemon
// ============================================================================

/// Runs the engine, the IPC server and the signal listeners until terminated.
async fn run_daemon(socket: Option<PathBuf>) -> Result<()> {
    let socket_path = match socket {
        Some(path) => path,
        None => IpcClient::default_socket_path()?,
    };

    let settings_path = PlistSettingsStore::default_path()?;
    let settings: Arc<dyn SettingsStore> = Arc::new(PlistSettingsStore::new(settings_path));

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let defaults = default_candidates(exe_dir.as_deref(), dirs::home_dir().as_deref());

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut engine =
        TimerEngine::new(build_resolver(), settings, event_tx).with_default_media(defaults);
    engine.start_work(true)?;
    let (handle, engine_task) = engine.spawn();
    tokio::spawn(log_events(event_rx));

    let mut will_sleep =
        signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;
    let mut did_wake =
        signal(SignalKind::user_defined2()).context("Failed to install SIGUSR2 handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    // Signal handlers must exist before the socket does.
    let server = IpcServer::new(&socket_path)?;
    let handler = RequestHandler::new(handle.clone());
    info!("Daemon listening on {}", socket_path.display());

    let result = {
        let serve = server.serve(&handler);
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(serve, interrupt);

        loop {
            tokio::select! {
                result = &mut serve => break result,
                _ = will_sleep.recv() => handle.signal(SystemSignal::WillSleep),
                _ = did_wake.recv() => handle.signal(SystemSignal::DidWake),
                _ = &mut interrupt => {
                    info!("Interrupted, shutting down");
                    break Ok(());
                }
                _ = terminate.recv() => {
                    info!("Terminated, shutting down");
                    break Ok(());
                }
            }
        }
    };

    // Closing every sender stops the engine, which releases its grants.
    drop(handler);
    drop(handle);
    drop(server);
    engine_task.await.context("Timer engine task panicked")??;

    result
}

/// Builds the playlist resolver for the current platform.
#[cfg(target_os = "macos")]
fn build_resolver() -> PlaylistResolver {
    use eyebreak::access::{ScopeRegistry, SecurityScopedAccess};
    use eyebreak::bookmark::SecurityScopedBookmarks;

    let registry = Arc::new(ScopeRegistry::default());
    PlaylistResolver::new(
        Arc::new(SecurityScopedAccess::new(registry.clone())),
        Arc::new(SecurityScopedBookmarks::new(registry)),
    )
}

/// Builds the playlist resolver for the current platform.
#[cfg(not(target_os = "macos"))]
fn build_resolver() -> PlaylistResolver {
    use eyebreak::access::AmbientAccess;
    use eyebreak::bookmark::FileBookmarks;

    PlaylistResolver::new(Arc::new(AmbientAccess::new()), Arc::new(FileBookmarks::new()))
}

/// Logs timer events until the engine goes away.
async fn log_events(mut events: mpsc::UnboundedReceiver<TimerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            TimerEvent::WorkStarted { remaining_seconds } => {
                info!("Work started, next break in {}s", remaining_seconds)
            }
            TimerEvent::BreakStarted { media } => match media.path() {
                Some(path) => info!("Break started with {}", path.display()),
                None => info!("Break started without media"),
            },
            TimerEvent::BreakCompleted { total_breaks } => {
                info!("Break completed ({} total)", total_breaks)
            }
            TimerEvent::BreakSkipped => info!("Break skipped"),
            TimerEvent::Paused { remaining_seconds } => {
                info!("Paused for sleep with {}s left", remaining_seconds)
            }
            TimerEvent::Resumed { remaining_seconds } => {
                info!("Resumed after wake with {}s left", remaining_seconds)
            }
            TimerEvent::Tick { remaining_seconds } => debug!("Break tick: {}s", remaining_seconds),
            TimerEvent::MediaUnsupported { path } => {
                warn!("Media format is not supported: {}", path.display())
            }
            TimerEvent::SelectionNotPersisted { reason } => {
                warn!("Media selection will not survive a restart: {}", reason)
            }
        }
    }
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
