//! Terminal host for a sitting.
//!
//! Turns stdin lines into session commands and process resume signals
//! into lifecycle transitions.

use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::{HostState, LifecycleSignal, SessionCommand};
use crate::types::parse_custom_duration;

use super::display::Display;

/// What a line typed during a sitting asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Command(SessionCommand),
    Help,
    Quit,
    /// Input that is neither a key nor a positive number.
    Ignored,
}

/// Interprets one input line.
pub fn parse_input(line: &str) -> InputAction {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "p" => InputAction::Command(SessionCommand::Toggle),
        "s" => InputAction::Command(SessionCommand::Start),
        "r" => InputAction::Command(SessionCommand::Reset),
        "q" | "quit" => InputAction::Quit,
        "h" | "?" | "help" => InputAction::Help,
        other => match parse_custom_duration(other) {
            Some(minutes) => InputAction::Command(SessionCommand::SelectDuration(minutes)),
            None => InputAction::Ignored,
        },
    }
}

/// Reads stdin lines on a dedicated thread.
///
/// A blocked read never holds up runtime shutdown; the thread dies with
/// the process.
pub fn spawn_stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("Stopped reading input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Forwards typed commands to the session until `q`, end of input, or the
/// session going away.
///
/// Returning drops `commands`, which ends the session once no other
/// sender is left.
pub async fn forward_input(
    mut lines: mpsc::UnboundedReceiver<String>,
    commands: mpsc::UnboundedSender<SessionCommand>,
) {
    while let Some(line) = lines.recv().await {
        match parse_input(&line) {
            InputAction::Command(command) => {
                if commands.send(command).is_err() {
                    break;
                }
            }
            InputAction::Help => Display::show_sit_help(),
            InputAction::Quit => break,
            InputAction::Ignored => debug!("Ignoring input {:?}", line),
        }
    }
}

/// Reports every SIGCONT as a trip through the background.
///
/// The process cannot observe being stopped, only being continued, so
/// both transitions are emitted on resume.
#[cfg(unix)]
pub async fn forward_resume_signals(signal: LifecycleSignal) -> std::io::Result<()> {
    use tokio::signal::unix::{signal as unix_signal, SignalKind};

    let mut resumed = unix_signal(SignalKind::from_raw(libc::SIGCONT))?;
    while resumed.recv().await.is_some() {
        debug!("Process continued");
        report_resume(&signal);
    }
    Ok(())
}

#[cfg_attr(not(unix), allow(dead_code))]
fn report_resume(signal: &LifecycleSignal) {
    signal.emit(HostState::Background);
    signal.emit(HostState::Foreground);
}
