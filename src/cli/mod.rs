//! CLI module for the meditation timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `host`: stdin commands and resume signals during a sitting

pub mod commands;
pub mod display;
pub mod host;

pub use commands::{Cli, Commands, DurationArgs};
pub use display::Display;
pub use host::{forward_input, parse_input, spawn_stdin_lines, InputAction};

#[cfg(unix)]
pub use host::forward_resume_signals;
