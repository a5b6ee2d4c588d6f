//! CLI - Command Line Interface for EmberTV
//!
//! Every session operation is scriptable. Output is JSON when requested or
//! when stdout is not a terminal.
//!
//! # Examples
//!
//! ```bash
//! embertv login --email me@example.com
//! embertv rentals --json
//! embertv play f1 --player vlc
//! embertv progress set f1 125
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::stream::PlayerType;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network or server error
    NetworkError = 3,
    /// Login rejected
    InvalidCredentials = 4,
    /// No stored session
    NotLoggedIn = 5,
    /// Backend denied playback
    NoAccess = 6,
    /// Local player failed
    PlayerFailed = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// EmberTV - rent, stream, resume
#[derive(Parser, Debug)]
#[command(
    name = "embertv",
    version,
    about = "EmberTV rental client",
    long_about = "Log in to EmberTV, list your active rentals and play them \
                  in a local player, resuming where you left off.",
    after_help = "EXAMPLES:\n\
                  embertv login --email me@example.com   Log in (prompts via EMBER_PASSWORD)\n\
                  embertv rentals                        List active rentals\n\
                  embertv play f1                        Play or resume a rental\n\
                  embertv progress list                  Show saved resume points"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginCmd),

    /// Forget the stored session
    Logout,

    /// Show whether a session is stored
    Status,

    /// List active rentals
    #[command(visible_alias = "r")]
    Rentals(RentalsCmd),

    /// List the public film catalog
    Films(FilmsCmd),

    /// Ask the backend for playback authorization
    #[command(visible_alias = "pb")]
    Playback(PlaybackCmd),

    /// Play a rental in a local player, resuming if possible
    Play(PlayCmd),

    /// Inspect or edit saved resume points
    #[command(subcommand)]
    Progress(ProgressCmd),
}

// =============================================================================
// Session Commands
// =============================================================================

/// Log in with email and password
#[derive(Args, Debug)]
pub struct LoginCmd {
    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Account password
    #[arg(long, short = 'p', env = "EMBER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// List rentals
#[derive(Args, Debug)]
pub struct RentalsCmd {
    /// Hide rentals whose expiry has passed
    #[arg(long)]
    pub active_only: bool,
}

/// List catalog films
#[derive(Args, Debug)]
pub struct FilmsCmd {
    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "50")]
    pub limit: usize,
}

/// Fetch playback authorization for a film
#[derive(Args, Debug)]
pub struct PlaybackCmd {
    /// Film id
    #[arg(required = true)]
    pub film_id: String,
}

// =============================================================================
// Play Command
// =============================================================================

/// Play a rented film locally
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Film id
    #[arg(required = true)]
    pub film_id: String,

    /// Player to use (defaults to config, then mpv)
    #[arg(long, short = 'P', value_enum)]
    pub player: Option<PlayerChoice>,

    /// Ignore any saved position
    #[arg(long)]
    pub from_start: bool,

    /// Print the stream URL instead of launching a player
    #[arg(long)]
    pub print_url: bool,
}

/// Player choice for local playback
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerChoice {
    /// mpv media player
    Mpv,
    /// VLC media player
    Vlc,
}

impl From<PlayerChoice> for PlayerType {
    fn from(choice: PlayerChoice) -> Self {
        match choice {
            PlayerChoice::Mpv => PlayerType::Mpv,
            PlayerChoice::Vlc => PlayerType::Vlc,
        }
    }
}

// =============================================================================
// Progress Commands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum ProgressCmd {
    /// Show the saved position for a film
    Get {
        film_id: String,
    },

    /// Save a position for a film (seconds or [h:]mm:ss)
    Set {
        film_id: String,
        position: String,
    },

    /// Remove the saved position for a film
    Clear {
        film_id: String,
    },

    /// List every saved position
    List,
}

/// Parse a position given as seconds ("125", "125.5") or a timestamp
/// ("2:05", "1:02:05")
pub fn parse_position(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.contains(':') {
        let parts: Vec<&str> = s.split(':').collect();
        let nums: Option<Vec<f64>> = parts.iter().map(|p| p.parse::<f64>().ok()).collect();
        let nums = nums?;
        let secs = match nums.as_slice() {
            [m, s] => m * 60.0 + s,
            [h, m, s] => h * 3600.0 + m * 60.0 + s,
            _ => return None,
        };
        return Some(secs).filter(|v| v.is_finite() && *v >= 0.0);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Format seconds as h:mm:ss or m:ss
pub fn format_position(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Status OK response
#[derive(Debug, Serialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl Default for StatusOk {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data; `text` renders the human-readable form
    pub fn print<T: Serialize>(&self, data: T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", text(&data));
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "embertv",
            "--json",
            "--quiet",
            "--api-url",
            "http://localhost:9000",
            "status",
        ]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000"));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("125"), Some(125.0));
        assert_eq!(parse_position("125.5"), Some(125.5));
        assert_eq!(parse_position("2:05"), Some(125.0));
        assert_eq!(parse_position("1:02:05"), Some(3725.0));
        assert_eq!(parse_position("-4"), None);
        assert_eq!(parse_position("abc"), None);
        assert_eq!(parse_position("1:2:3:4"), None);
        assert_eq!(parse_position("NaN"), None);
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(125.9), "2:05");
        assert_eq!(format_position(3725.0), "1:02:05");
        assert_eq!(format_position(0.0), "0:00");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::InvalidArgs), 2);
        assert_eq!(i32::from(ExitCode::NetworkError), 3);
        assert_eq!(i32::from(ExitCode::InvalidCredentials), 4);
        assert_eq!(i32::from(ExitCode::NotLoggedIn), 5);
        assert_eq!(i32::from(ExitCode::NoAccess), 6);
        assert_eq!(i32::from(ExitCode::PlayerFailed), 7);
    }

    #[test]
    fn test_json_output_shape() {
        let ok = serde_json::to_value(JsonOutput::success(StatusOk::default())).unwrap();
        assert_eq!(ok["data"]["status"], "ok");
        assert!(ok.get("exit_code").is_none());

        let err = serde_json::to_value(JsonOutput::<()>::error_msg("nope", ExitCode::NoAccess)).unwrap();
        assert_eq!(err["error"], "nope");
        assert_eq!(err["exit_code"], 6);
    }
}
