//! Playback plumbing
//!
//! - Player: hands a stream URL to mpv or VLC
//! - Resume: when to offer "Resume", where to seek, what to store afterwards

pub mod player;
pub mod resume;

pub use player::{LocalPlayer, PlaybackOutcome, PlayerError, PlayerType};
pub use resume::{ProgressUpdate, ResumePoint};
