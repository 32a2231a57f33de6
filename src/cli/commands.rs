//! Command definitions for the meditation timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::types::MeditationConfig;

/// Largest accepted session length in minutes (one day).
const MAX_MINUTES: i64 = 1440;

// ============================================================================
// CLI Structure
// ============================================================================

/// Meditation Timer CLI - a quiet countdown with a gong
#[derive(Parser, Debug)]
#[command(
    name = "meditate",
    version,
    about = "Meditation session timer",
    long_about = "A meditation countdown that survives suspension and restarts.\n\
                  The end time is stored on disk, so closing the terminal or suspending\n\
                  the process never loses a running session.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute (defaults to `sit`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the persisted timer state
    #[arg(long, global = true, env = "MEDITATE_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true, env = "MEDITATE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable the session cue
    #[arg(long, global = true)]
    pub no_sound: bool,

    /// Audio file to play as the session cue
    #[arg(long, global = true, value_name = "FILE")]
    pub sound: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the configuration: file first, then command-line overrides.
    pub fn to_config(&self) -> Result<MeditationConfig> {
        let mut config = match &self.config {
            Some(path) => MeditationConfig::from_file(path)?,
            None => MeditationConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        if let Some(sound) = &self.sound {
            config = config.with_sound_path(sound);
        }
        if self.no_sound {
            config = config.with_sound_enabled(false);
        }
        Ok(config)
    }
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sit with the timer in this terminal
    Sit(DurationArgs),

    /// Show the current timer status
    Status,

    /// Start (or resume) the countdown and return
    Start(DurationArgs),

    /// Pause the running countdown
    Pause,

    /// Stop the countdown and restore the full duration
    Reset,

    /// Select the session length in minutes
    Duration {
        /// Minutes (a preset or any custom value)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_MINUTES))]
        minutes: u32,
    },

    /// List the preset durations
    Presets,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Duration Arguments
// ============================================================================

/// Optional duration selection before a command runs
#[derive(Args, Debug, Clone, Default)]
pub struct DurationArgs {
    /// Select this many minutes first
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=MAX_MINUTES)
    )]
    pub minutes: Option<u32>,
}

// ============================================================================
// Tests
// ============================================================================
