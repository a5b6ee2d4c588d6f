//! Data structures and types for EmberTV
//!
//! Contains the shared models organized by domain:
//! - **Auth**: login credentials and token response
//! - **Catalog**: films from the public catalog
//! - **Rentals**: active entitlements and their film summaries
//! - **Playback**: backend authorization to stream a film

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// =============================================================================
// Auth Models
// =============================================================================

/// Email/password pair used only to build a login request body
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

// =============================================================================
// Envelope
// =============================================================================

/// Paginated list envelope (`{"data": [...]}`); other fields are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
}

// =============================================================================
// Catalog Models
// =============================================================================

/// Film from the public catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Film {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub genre: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub poster_url: Option<String>,
}

impl fmt::Display for Film {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(mins) = self.runtime_minutes {
            write!(f, " - {}", format_minutes(mins))?;
        }
        if let Some(genre) = self.genre.as_deref().filter(|g| !g.is_empty()) {
            write!(f, " [{}]", genre)?;
        }
        Ok(())
    }
}

// =============================================================================
// Rental Models
// =============================================================================

/// Film summary embedded in a rental
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RentalFilm {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub slug: Option<String>,
    pub poster_url: Option<String>,
    pub hls_url: Option<String>,
    pub long_description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub genre: Option<String>,
}

/// One active entitlement for the current user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rental {
    pub film: RentalFilm,
    pub status: Option<String>,
    pub purchased_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Rental {
    pub fn film_id(&self) -> &str {
        &self.film.id
    }

    /// Time left before the rental expires. Zero once expired, `None` when
    /// the backend sent no expiry.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|expires| (expires - now).max(Duration::zero()))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|e| e <= now).unwrap_or(false)
    }

    /// Human label for the remaining time, e.g. "Expires in 23 hr, 5 min"
    pub fn remaining_label(&self, now: DateTime<Utc>) -> Option<String> {
        let remaining = self.time_remaining(now)?;
        if remaining == Duration::zero() {
            return Some("Expired".to_string());
        }
        let hours = remaining.num_hours();
        let mins = remaining.num_minutes() % 60;
        Some(if hours > 0 {
            format!("Expires in {} hr, {} min", hours, mins)
        } else {
            format!("Expires in {} min", mins)
        })
    }
}

impl fmt::Display for Rental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.film.title, self.film.id)?;
        if let Some(mins) = self.film.duration_minutes {
            write!(f, " - {}", format_minutes(mins))?;
        }
        if let Some(status) = &self.status {
            write!(f, " [{}]", status)?;
        }
        Ok(())
    }
}

// =============================================================================
// Playback Models
// =============================================================================

/// Backend decision on whether the session may stream a film right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackAuthorization {
    pub has_access: bool,
    /// Legacy stream URL, used only when `hls_url` is missing
    pub playback_url: Option<String>,
    /// Preferred HLS stream URL
    pub hls_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PlaybackAuthorization {
    /// Resolved stream URL, preferring HLS. Says nothing about access.
    pub fn stream_url(&self) -> Option<&str> {
        self.hls_url.as_deref().or(self.playback_url.as_deref())
    }

    /// Stream URL gated on `has_access`. Use this to start playback.
    pub fn playable_url(&self) -> Option<&str> {
        if self.has_access {
            self.stream_url()
        } else {
            None
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Format a runtime like "1h 52m" or "48m"
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Ids arrive as strings from rentals but as integers from the catalog
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
