//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use notehub_core::autosave::ConflictResolution;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notehub")]
#[command(version)]
#[command(about = "Markdown notes in a GitHub repository, from the terminal", long_about = None)]
pub struct Cli {
    /// Show debug logging (request lines, saves)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the configured branch
    #[arg(short, long, global = true)]
    pub branch: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the configuration file
    Init {
        /// Repository owner (user or organization)
        #[arg(long)]
        owner: String,

        /// Repository name
        #[arg(long)]
        repo: String,

        /// Access token (prefer the NOTEHUB_GITHUB_TOKEN environment variable)
        #[arg(long)]
        token: Option<String>,

        /// Folder for daily notes (e.g., "Daily" or "Journal/Daily")
        #[arg(long)]
        daily_folder: Option<String>,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// List a folder
    Ls {
        /// Folder to list (default: repository root)
        #[arg(default_value = "")]
        path: String,
    },

    /// Show the folder tree
    Tree {
        /// Folder to start from (default: repository root)
        #[arg(default_value = "")]
        path: String,

        /// Levels to expand
        #[arg(short, long, default_value_t = 2)]
        depth: usize,
    },

    /// Print a note
    Cat {
        path: String,
    },

    /// Write a note from a file or stdin
    Put {
        path: String,

        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Commit message (default: "Create <path>" or "Update <path>")
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Delete a note, or a folder with --recursive
    Rm {
        path: String,

        /// Delete a folder and everything beneath it
        #[arg(short, long)]
        recursive: bool,
    },

    /// Create a folder
    Mkdir {
        path: String,
    },

    /// Show today's daily note
    Today,

    /// Show recent daily notes, newest first
    Daily {
        /// Number of days to show (default: config's recent_days)
        #[arg(short = 'n', long)]
        days: Option<usize>,

        /// Show a single day ("yesterday", "3 days ago", "2024-01-15")
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Append a timestamped entry to today's daily note
    Append {
        /// Text to append
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Search notes (ranking is the backend's)
    Search {
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// Edit a note from stdin with autosave; each line is appended to the
    /// document and saved once input pauses
    Capture {
        path: String,

        /// What to do if the note changes remotely while capturing
        #[arg(long, default_value = "skip", value_parser = parse_resolution)]
        on_conflict: ConflictResolution,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Set a configuration value
    Set {
        /// One of: owner, repo, token, branch, api_base_url, daily_folder,
        /// autosave_debounce_ms, recent_days, request_timeout_secs
        key: String,
        value: String,
    },

    /// Print the configuration file path
    Path,
}

fn parse_resolution(s: &str) -> Result<ConflictResolution, String> {
    s.parse()
        .map_err(|_| format!("'{}' is not one of keep-local, keep-remote, skip", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_append_collects_words() {
        let cli = Cli::parse_from(["notehub", "append", "went", "for", "a", "run"]);
        match cli.command {
            Commands::Append { text } => assert_eq!(text.join(" "), "went for a run"),
            _ => panic!("expected append"),
        }
    }

    #[test]
    fn test_capture_conflict_flag() {
        let cli = Cli::parse_from(["notehub", "capture", "Notes/a.md", "--on-conflict", "keep-local"]);
        match cli.command {
            Commands::Capture { on_conflict, .. } => {
                assert_eq!(on_conflict, ConflictResolution::KeepLocal)
            }
            _ => panic!("expected capture"),
        }
    }
}
