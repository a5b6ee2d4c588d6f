//! Resume policy
//!
//! Turns a stored offset and a film's duration into the decisions the
//! detail screen and the player make: which button to show, where to seek,
//! and what to write back once the player stops.

use serde::Serialize;

use super::player::PlaybackOutcome;

/// Offsets above this offer "Resume" instead of "Watch Now"
pub const RESUME_PROMPT_SECS: f64 = 60.0;

/// The player only seeks for offsets above this
pub const SEEK_THRESHOLD_SECS: f64 = 10.0;

/// Resume state for one film
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResumePoint {
    pub progress_secs: Option<f64>,
    pub duration_secs: Option<f64>,
}

impl ResumePoint {
    pub fn new(progress_secs: Option<f64>, duration_minutes: Option<u32>) -> Self {
        Self {
            progress_secs: progress_secs.filter(|s| s.is_finite() && *s > 0.0),
            duration_secs: duration_minutes.map(|m| f64::from(m) * 60.0),
        }
    }

    pub fn should_offer_resume(&self) -> bool {
        self.progress_secs
            .map(|s| s > RESUME_PROMPT_SECS)
            .unwrap_or(false)
    }

    /// Where the player should start, if anywhere but the beginning
    pub fn seek_offset(&self) -> Option<f64> {
        self.progress_secs.filter(|s| *s > SEEK_THRESHOLD_SECS)
    }

    /// Whole percent watched, truncated
    pub fn watched_percent(&self) -> Option<u32> {
        let progress = self.progress_secs?;
        let total = self.duration_secs.filter(|t| *t > 0.0)?;
        Some(((progress / total) * 100.0) as u32)
    }

    pub fn action_label(&self) -> &'static str {
        if self.should_offer_resume() {
            "Resume"
        } else {
            "Watch Now"
        }
    }

    /// One-line hint shown under the play action
    pub fn summary(&self) -> String {
        match (self.should_offer_resume(), self.progress_secs) {
            (true, Some(progress)) => match self.watched_percent() {
                Some(pct) => format!(
                    "Resume from where you left off · about {}% watched.",
                    pct
                ),
                None => format!("Resume from about {} minutes in.", (progress / 60.0) as u64),
            },
            _ => "You'll have 24 hours of access until your rental expires.".to_string(),
        }
    }
}

/// What to do with stored progress after the player exits
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    /// Save this offset
    Save(f64),
    /// Playback reached the end, forget the offset
    Clear,
    /// Nothing usable to record
    Keep,
}

impl ProgressUpdate {
    /// Decide from how the player exited and where it started.
    ///
    /// Only a player that reported the end of the stream clears progress.
    /// Otherwise the position is estimated as `start + elapsed`, capped at a
    /// known duration since paused time counts as elapsed. A player that
    /// exited with an error leaves stored progress untouched.
    pub fn from_outcome(outcome: &PlaybackOutcome, duration_minutes: Option<u32>) -> Self {
        if !outcome.exit_success {
            return ProgressUpdate::Keep;
        }
        if outcome.reached_end {
            return ProgressUpdate::Clear;
        }

        let mut position = outcome.start_secs.unwrap_or(0.0) + outcome.elapsed.as_secs_f64();
        if let Some(total) = duration_minutes
            .map(|m| f64::from(m) * 60.0)
            .filter(|t| *t > 0.0)
        {
            position = position.min(total);
        }

        if position.is_finite() && position > 0.0 {
            ProgressUpdate::Save(position)
        } else {
            ProgressUpdate::Keep
        }
    }
}
