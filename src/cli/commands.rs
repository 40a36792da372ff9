//! Command definitions for the EyeBreak CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// EyeBreak CLI - periodic eye-rest reminders
#[derive(Parser, Debug)]
#[command(
    name = "eyebreak",
    version,
    about = "目の休憩リマインダーCLI",
    long_about = "一定の作業時間ごとに短い休憩を促すタイマー。\n\
                  休憩中は選択した動画や画像を表示し、再生中のメディアを一時停止します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show current timer status
    Status,

    /// Start a break now
    Break,

    /// Skip the current break
    Skip,

    /// Manage break media
    #[command(subcommand)]
    Media(MediaCommands),

    /// Change interval settings
    #[command(subcommand)]
    Set(SetCommands),

    /// Notify the daemon that the system is going to sleep
    Sleep,

    /// Notify the daemon that the system woke up
    Wake,

    /// Run as daemon (background service)
    #[command(hide = true)]
    Daemon {
        /// Socket path to listen on
        #[arg(long)]
        socket: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Media subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum MediaCommands {
    /// Select a media file or folder
    Select {
        /// Video or image file, or a folder containing them
        #[arg(value_parser = validate_media_path)]
        path: PathBuf,
    },

    /// Forget the selected media
    Clear,
}

/// Interval subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SetCommands {
    /// Work interval in minutes (5-60)
    Work {
        #[arg(value_parser = clap::value_parser!(u32).range(5..=60))]
        minutes: u32,
    },

    /// Break interval in seconds (20-300)
    Break {
        #[arg(value_parser = clap::value_parser!(u32).range(20..=300))]
        seconds: u32,
    },
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the media path and makes it absolute.
///
/// The daemon may run with a different working directory, so relative paths
/// are resolved here. Missing paths are rejected before any daemon contact.
fn validate_media_path(s: &str) -> Result<PathBuf, String> {
    if s.trim().is_empty() {
        return Err("パスは空にできません".to_string());
    }
    let path = std::path::absolute(s).map_err(|e| format!("パスを解決できません: {}", e))?;
    if !path.exists() {
        return Err(format!("メディアが見つかりません: {}", path.display()));
    }
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
