//! Local Player - mpv/VLC playback
//!
//! Opens an authorized stream in an external player, optionally starting
//! part-way through, and reports how long it ran and how it exited.

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::{Child, Command};

/// Supported local players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerType {
    /// mpv media player (default)
    #[default]
    Mpv,
    /// VLC media player
    Vlc,
}

impl PlayerType {
    /// Get the command name for this player
    pub fn command(&self) -> &'static str {
        match self {
            PlayerType::Vlc => {
                // On macOS, VLC is an app bundle
                #[cfg(target_os = "macos")]
                if std::path::Path::new("/Applications/VLC.app").exists() {
                    return "/Applications/VLC.app/Contents/MacOS/VLC";
                }
                "vlc"
            }
            PlayerType::Mpv => "mpv",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "VLC",
            PlayerType::Mpv => "mpv",
        }
    }

    /// Player arguments for a stream and optional start offset
    pub fn args(&self, stream_url: &str, start_secs: Option<f64>) -> Vec<String> {
        let mut args = vec![stream_url.to_string()];
        match self {
            PlayerType::Mpv => {
                if let Some(start) = start_secs {
                    args.push(format!("--start={:.3}", start));
                }
                args.push("--force-window=immediate".to_string());
            }
            PlayerType::Vlc => {
                if let Some(start) = start_secs {
                    args.push(format!("--start-time={:.3}", start));
                }
                args.push("--no-video-title-show".to_string());
                args.push("--play-and-exit".to_string());
            }
        }
        args
    }
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for PlayerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mpv" => Ok(PlayerType::Mpv),
            "vlc" => Ok(PlayerType::Vlc),
            other => Err(format!("Unknown player '{}' (expected mpv or vlc)", other)),
        }
    }
}

/// Errors from local player operations
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Player '{0}' not found. Install it first.")]
    NotFound(String),
    #[error("Failed to start player: {0}")]
    StartFailed(#[from] std::io::Error),
}

/// How a playback session ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOutcome {
    /// Offset the player was asked to start at
    pub start_secs: Option<f64>,
    /// Wall-clock time the player was open
    pub elapsed: Duration,
    pub exit_success: bool,
    /// The player reported that the stream played to its end
    pub reached_end: bool,
}

/// mpv's exit line when the file played through
const MPV_END_OF_FILE: &str = "Exiting... (End of file)";

/// Whether player output says playback reached the end of the stream.
/// Only mpv reports this; VLC output never matches.
pub fn reached_end_of_file(output: &str) -> bool {
    output.lines().any(|line| line.trim() == MPV_END_OF_FILE)
}

/// Local player for authorized streams
#[derive(Debug, Clone, Copy)]
pub struct LocalPlayer {
    player_type: PlayerType,
}

impl LocalPlayer {
    pub fn new(player_type: PlayerType) -> Self {
        Self { player_type }
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    /// Check if the player is available on the system
    pub async fn is_available(&self) -> bool {
        let cmd = self.player_type.command();

        if cmd.starts_with('/') {
            return std::path::Path::new(cmd).exists();
        }

        Command::new("which")
            .arg(cmd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Spawn the player on `stream_url`, seeking to `start_secs` if given
    pub fn play(&self, stream_url: &str, start_secs: Option<f64>) -> Result<Child, PlayerError> {
        let mut cmd = Command::new(self.player_type.command());
        cmd.args(self.player_type.args(stream_url, start_secs));
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(player = %self.player_type, start = ?start_secs, "starting player");

        cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlayerError::NotFound(self.player_type.command().to_string())
            } else {
                PlayerError::StartFailed(e)
            }
        })
    }

    /// Play a stream and wait for the player to close
    pub async fn play_and_wait(
        &self,
        stream_url: &str,
        start_secs: Option<f64>,
    ) -> Result<PlaybackOutcome, PlayerError> {
        let started = Instant::now();
        let child = self.play(stream_url, start_secs)?;
        let output = child.wait_with_output().await?;
        let elapsed = started.elapsed();

        let reached_end = reached_end_of_file(&String::from_utf8_lossy(&output.stdout))
            || reached_end_of_file(&String::from_utf8_lossy(&output.stderr));

        tracing::debug!(
            player = %self.player_type,
            ?elapsed,
            success = output.status.success(),
            reached_end,
            "player exited"
        );

        Ok(PlaybackOutcome {
            start_secs,
            elapsed,
            exit_success: output.status.success(),
            reached_end,
        })
    }
}
