//! Display utilities for the meditation timer CLI.
//!
//! This module provides formatted output for:
//! - Countdown rendering
//! - Status display
//! - Timer events during a sitting
//! - Error messages

use std::io::{self, Write};

use crate::engine::{Countdown, TimerEvent};
use crate::types::{TimerState, DURATION_PRESETS};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a cold start and the current state.
    pub fn show_status(state: &TimerState, restored: Countdown) {
        println!("Meditation Timer Status");
        println!("───────────────────────");
        if restored == Countdown::Finished {
            println!("Your meditation finished while you were away");
        }
        println!("{}", Self::status_line(state));
    }

    /// Shows a success message for timer start.
    pub fn show_start_success(state: &TimerState) {
        println!("* Meditation started");
        println!("  Time left: {}", Self::format_time(state.time_left));
    }

    /// Shows a success message for timer pause.
    pub fn show_pause_success(state: &TimerState) {
        println!("|| Meditation paused");
        println!("  Time left: {}", Self::format_time(state.time_left));
    }

    /// Shows a success message for timer reset.
    pub fn show_reset_success(state: &TimerState) {
        println!("[] Timer reset to {}", Self::format_time(state.time_left));
    }

    /// Shows the newly selected duration.
    pub fn show_duration_selected(minutes: u32) {
        println!("* Session length set to {} min", minutes);
    }

    /// Lists the preset durations, marking the selected one.
    pub fn show_presets(selected: u32) {
        for line in Self::preset_lines(selected) {
            println!("{}", line);
        }
    }

    /// Shows the keys accepted during a sitting.
    pub fn show_sit_help() {
        println!("Enter: start/pause   r: reset   <minutes>: set duration   q: quit");
    }

    /// Renders a timer event during a sitting.
    ///
    /// Ticks rewrite the countdown line in place.
    pub fn show_event(event: &TimerEvent) {
        match event {
            TimerEvent::Tick { time_left } => {
                print!("\r  {}   ", Self::format_time(*time_left));
                let _ = io::stdout().flush();
            }
            other => println!("\r{}", Self::describe_event(other)),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// One-line summary of the timer state.
    pub fn status_line(state: &TimerState) -> String {
        let session = format!("({} min session)", state.selected_minutes);
        if state.is_active {
            format!(
                "Meditating: {} left {}",
                Self::format_time(state.time_left),
                session
            )
        } else if state.time_left == 0 {
            format!("Finished {}", session)
        } else if state.time_left < state.full_duration_seconds() {
            format!(
                "Paused: {} left {}",
                Self::format_time(state.time_left),
                session
            )
        } else {
            format!("Ready: {} {}", Self::format_time(state.time_left), session)
        }
    }

    /// Describes a timer event for the sitting log.
    pub fn describe_event(event: &TimerEvent) -> String {
        match event {
            TimerEvent::DurationSelected { minutes } => {
                format!("* Session length set to {} min", minutes)
            }
            TimerEvent::Started { time_left, .. } => {
                format!("* Started, {} left", Self::format_time(*time_left))
            }
            TimerEvent::Paused { time_left } => {
                format!("|| Paused at {}", Self::format_time(*time_left))
            }
            TimerEvent::Reset { time_left } => {
                format!("[] Reset to {}", Self::format_time(*time_left))
            }
            TimerEvent::Restored { time_left, .. } => {
                format!("> Resumed, {} left", Self::format_time(*time_left))
            }
            TimerEvent::Tick { time_left } => Self::format_time(*time_left),
            TimerEvent::Completed { source } if source.while_away() => {
                "Meditation complete (finished while you were away)".to_string()
            }
            TimerEvent::Completed { .. } => "Meditation complete".to_string(),
        }
    }

    /// Formats seconds as `m:ss`.
    pub fn format_time(total_seconds: u32) -> String {
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    fn preset_lines(selected: u32) -> Vec<String> {
        DURATION_PRESETS
            .iter()
            .map(|&minutes| {
                let marker = if minutes == selected { "*" } else { " " };
                format!("{} {:>2} min", marker, minutes)
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
