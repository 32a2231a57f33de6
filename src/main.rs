//! Meditation Timer CLI
//!
//! A countdown for sitting practice that keeps its end time on disk:
//! - `meditate sit` runs the timer in the terminal
//! - one-shot commands (`start`, `pause`, `status`, ...) work on the stored session
//! - a session that ended while nobody was watching rings on the next launch

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tokio::sync::mpsc;
use tokio::time::Duration;

use meditation_timer::cli::{
    forward_input, spawn_stdin_lines, Cli, Commands, Display, DurationArgs,
};
use meditation_timer::engine::{
    Countdown, LifecycleSignal, MeditationSession, SessionCommand, TimerEngine, TimerEvent,
};
use meditation_timer::sound::{create_cue_player, GONG_DURATION};
use meditation_timer::store::FileKeyValueStore;
use meditation_timer::{MeditationConfig, SystemClock};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let config = cli.to_config()?;
    config.validate().map_err(anyhow::Error::msg)?;

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command.clone() {
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            Ok(())
        }
        Some(Commands::Sit(args)) => sit(&config, args).await,
        None => sit(&config, DurationArgs::default()).await,
        Some(command) => run_once(&config, command).await,
    }
}

/// Builds an engine over the on-disk store for this configuration.
fn build_engine(config: &MeditationConfig) -> (TimerEngine, mpsc::UnboundedReceiver<TimerEvent>) {
    let data_dir = config.resolve_data_dir();
    tracing::debug!("Using data directory {}", data_dir.display());

    let store = Arc::new(FileKeyValueStore::new(data_dir));
    let cue = create_cue_player(config);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let engine = TimerEngine::new(config, store, cue, Arc::new(SystemClock), event_tx);
    (engine, event_rx)
}

/// Runs one operation against the stored session and exits.
async fn run_once(config: &MeditationConfig, command: Commands) -> Result<()> {
    let (mut engine, mut events) = build_engine(config);
    let restored = engine.restore();
    let shows_status = matches!(command, Commands::Status);

    match command {
        Commands::Status => Display::show_status(engine.get_state(), restored),
        Commands::Start(args) => {
            if let Some(minutes) = args.minutes {
                engine.select_duration(minutes)?;
            }
            engine.start().context("Cannot start meditation")?;
            Display::show_start_success(engine.get_state());
        }
        Commands::Pause => {
            engine.pause().context("Cannot pause meditation")?;
            Display::show_pause_success(engine.get_state());
        }
        Commands::Reset => {
            engine.reset();
            Display::show_reset_success(engine.get_state());
        }
        Commands::Duration { minutes } => {
            engine.select_duration(minutes)?;
            Display::show_duration_selected(minutes);
        }
        Commands::Presets => Display::show_presets(engine.selected_minutes()),
        Commands::Sit(_) | Commands::Completions { .. } => {}
    }

    if restored == Countdown::Finished && !shows_status {
        println!("Your meditation finished while you were away");
    }

    // Let an audible cue finish before the process exits
    let mut rang = false;
    while let Ok(event) = events.try_recv() {
        rang |= matches!(
            event,
            TimerEvent::Started { .. } | TimerEvent::Completed { .. }
        );
    }
    if rang && config.sound_enabled {
        tokio::time::sleep(GONG_DURATION).await;
    }
    Ok(())
}

/// Sits with the timer until `q`, end of input or Ctrl-C.
async fn sit(config: &MeditationConfig, args: DurationArgs) -> Result<()> {
    let (engine, mut events) = build_engine(config);
    let signal = LifecycleSignal::new();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    if let Some(minutes) = args.minutes {
        cmd_tx
            .send(SessionCommand::SelectDuration(minutes))
            .context("Session closed before it started")?;
    }

    Display::show_sit_help();
    let renderer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            Display::show_event(&event);
        }
    });
    tokio::spawn(forward_input(spawn_stdin_lines(), cmd_tx));

    #[cfg(unix)]
    {
        let signal = signal.clone();
        tokio::spawn(async move {
            if let Err(e) = meditation_timer::cli::forward_resume_signals(signal).await {
                tracing::warn!("Cannot watch for resume signals: {}", e);
            }
        });
    }

    let session = MeditationSession::new(engine, config.tick_interval());
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let engine = session.run(&signal, cmd_rx, shutdown).await;

    // The engine owns the event sender; dropping it ends the renderer
    let state = engine.get_state().clone();
    drop(engine);
    let _ = tokio::time::timeout(Duration::from_millis(200), renderer).await;

    println!();
    println!("{}", Display::status_line(&state));
    Ok(())
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
