//! CLI Command Handlers
//!
//! Implements all CLI commands on top of `SessionClient` and `ProgressStore`.
//! Each handler takes its CLI args, the shared `Context` and `Output`, and
//! returns an `ExitCode`.

use anyhow::{Context as _, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::api::session::token_prefix;
use crate::api::{AuthError, NetworkError, SessionClient};
use crate::cli::{
    format_position, parse_position, ExitCode, FilmsCmd, LoginCmd, Output, PlayCmd, PlaybackCmd,
    ProgressCmd, RentalsCmd, StatusOk,
};
use crate::config::Config;
use crate::models::{Film, PlaybackAuthorization, Rental};
use crate::storage::{FileStore, KeyValueStore, ProgressStore};
use crate::stream::{LocalPlayer, PlayerType, ProgressUpdate, ResumePoint};

// =============================================================================
// Context
// =============================================================================

/// Process-wide state shared by every command
pub struct Context {
    pub base_url: String,
    pub store: Arc<dyn KeyValueStore>,
    pub player: PlayerType,
}

impl Context {
    /// Build from config: resolve the API URL and open the file store
    pub fn from_config(config: &Config, api_url_override: Option<&str>) -> Result<Self> {
        let store_path = config
            .store_path()
            .context("Could not determine data directory")?;
        let store = open_store(&store_path)?;

        Ok(Self {
            base_url: config.api_base_url(api_url_override),
            store,
            player: config.player(),
        })
    }

    pub fn session(&self) -> SessionClient {
        SessionClient::with_base_url(self.base_url.clone(), self.store.clone())
    }

    pub fn progress(&self) -> ProgressStore {
        ProgressStore::new(self.store.clone())
    }
}

fn open_store(path: &Path) -> Result<Arc<dyn KeyValueStore>> {
    let store = FileStore::open(path)
        .with_context(|| format!("Failed to open store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn network_exit(output: &Output, what: &str, err: NetworkError) -> ExitCode {
    let code = match err {
        NetworkError::NotAuthenticated => ExitCode::NotLoggedIn,
        _ => ExitCode::NetworkError,
    };
    let msg = match err {
        NetworkError::NotAuthenticated => "Not logged in. Run `embertv login` first.".to_string(),
        other => format!("{} failed: {}", what, other),
    };
    output.error(msg, code)
}

fn print_or_fail<T: Serialize>(
    output: &Output,
    data: T,
    text: impl FnOnce(&T) -> String,
) -> ExitCode {
    match output.print(data, text) {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// Session Commands
// =============================================================================

pub async fn login_cmd(cmd: LoginCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut session = ctx.session();
    output.info(format!("Logging in as {}...", cmd.email));

    match session.login(&cmd.email, &cmd.password).await {
        Ok(()) => print_or_fail(output, StatusOk::default(), |_| "Logged in.".to_string()),
        Err(AuthError::InvalidCredentials) => {
            output.error("Invalid email or password", ExitCode::InvalidCredentials)
        }
        Err(e) => output.error(format!("Login failed: {}", e), ExitCode::NetworkError),
    }
}

pub fn logout_cmd(ctx: &Context, output: &Output) -> ExitCode {
    ctx.session().logout();
    print_or_fail(output, StatusOk::default(), |_| "Logged out.".to_string())
}

#[derive(Debug, Serialize)]
struct SessionStatus {
    logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_prefix: Option<String>,
    api_url: String,
}

pub fn status_cmd(ctx: &Context, output: &Output) -> ExitCode {
    let session = ctx.session();
    let status = SessionStatus {
        logged_in: session.is_authenticated(),
        token_prefix: session.token().map(token_prefix),
        api_url: session.base_url().to_string(),
    };

    print_or_fail(output, status, |s| match &s.token_prefix {
        Some(prefix) => format!("Logged in (token {}...) at {}", prefix, s.api_url),
        None => format!("Not logged in ({})", s.api_url),
    })
}

// =============================================================================
// Rentals / Catalog
// =============================================================================

/// Rental plus the derived values shown next to it
#[derive(Debug, Serialize)]
struct RentalView {
    #[serde(flatten)]
    rental: Rental,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<String>,
    resume: ResumePoint,
    action: &'static str,
}

pub async fn rentals_cmd(cmd: RentalsCmd, ctx: &Context, output: &Output) -> ExitCode {
    let session = ctx.session();
    let progress = ctx.progress();
    let now = Utc::now();

    output.info("Fetching rentals...");

    let rentals = match session.list_rentals().await {
        Ok(rentals) => rentals,
        Err(e) => return network_exit(output, "Fetching rentals", e),
    };

    let views: Vec<RentalView> = rentals
        .into_iter()
        .filter(|r| !cmd.active_only || !r.is_expired(now))
        .map(|rental| {
            let resume = ResumePoint::new(
                progress.get_progress(rental.film_id()),
                rental.film.duration_minutes,
            );
            RentalView {
                remaining: rental.remaining_label(now),
                action: resume.action_label(),
                resume,
                rental,
            }
        })
        .collect();

    print_or_fail(output, views, |views| {
        if views.is_empty() {
            return "No active rentals.".to_string();
        }
        views
            .iter()
            .map(|v| {
                let mut line = v.rental.to_string();
                if let Some(remaining) = &v.remaining {
                    line.push_str(&format!(" · {}", remaining));
                }
                if v.resume.should_offer_resume() {
                    line.push_str(&format!("\n    {}", v.resume.summary()));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn films_cmd(cmd: FilmsCmd, ctx: &Context, output: &Output) -> ExitCode {
    let session = ctx.session();
    output.info("Fetching catalog...");

    match session.fetch_films().await {
        Ok(mut films) => {
            films.truncate(cmd.limit);
            print_or_fail(output, films, |films: &Vec<Film>| {
                films
                    .iter()
                    .map(|f| format!("{}  {}", f.id, f))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Err(e) => network_exit(output, "Fetching catalog", e),
    }
}

// =============================================================================
// Playback
// =============================================================================

pub async fn playback_cmd(cmd: PlaybackCmd, ctx: &Context, output: &Output) -> ExitCode {
    let session = ctx.session();

    match session.fetch_playback(&cmd.film_id).await {
        Ok(auth) => print_or_fail(output, auth, |a: &PlaybackAuthorization| {
            match (a.has_access, a.stream_url()) {
                (true, Some(url)) => format!("Access granted: {}", url),
                (true, None) => "Access granted, but no stream URL was returned.".to_string(),
                (false, _) => "No access to this film.".to_string(),
            }
        }),
        Err(e) => network_exit(output, "Fetching playback", e),
    }
}

#[derive(Debug, Serialize)]
struct PlayResult {
    film_id: String,
    stream_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_secs: Option<f64>,
    finished: bool,
}

/// Everything `play` needs once the backend has authorized the stream
#[derive(Debug, Clone, PartialEq)]
pub struct PlayPlan {
    pub stream_url: String,
    pub resume: ResumePoint,
    pub duration_minutes: Option<u32>,
}

impl PlayPlan {
    /// Offset handed to the player
    pub fn start_secs(&self) -> Option<f64> {
        self.resume.seek_offset()
    }
}

/// Authorize playback and work out where to start. Errors are already
/// reported through `output`.
pub async fn plan_play(cmd: &PlayCmd, ctx: &Context, output: &Output) -> Result<PlayPlan, ExitCode> {
    let session = ctx.session();

    // Duration lives on the rental; look it up so resume/finish can use it.
    // A failure here is not fatal, playback authorization decides.
    let duration_minutes = match session.list_rentals().await {
        Ok(rentals) => rentals
            .iter()
            .find(|r| r.film_id() == cmd.film_id)
            .and_then(|r| r.film.duration_minutes),
        Err(NetworkError::NotAuthenticated) => {
            return Err(network_exit(output, "Playback", NetworkError::NotAuthenticated))
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not fetch rentals for duration");
            None
        }
    };

    let auth = session
        .fetch_playback(&cmd.film_id)
        .await
        .map_err(|e| network_exit(output, "Fetching playback", e))?;

    let Some(stream_url) = auth.playable_url().map(str::to_string) else {
        let msg = if auth.has_access {
            "Backend granted access but returned no stream URL"
        } else {
            "You don't have access to this film. Is the rental still active?"
        };
        return Err(output.error(msg, ExitCode::NoAccess));
    };

    let saved = if cmd.from_start {
        None
    } else {
        ctx.progress().get_progress(&cmd.film_id)
    };

    Ok(PlayPlan {
        stream_url,
        resume: ResumePoint::new(saved, duration_minutes),
        duration_minutes,
    })
}

pub async fn play_cmd(cmd: PlayCmd, ctx: &Context, output: &Output) -> ExitCode {
    let plan = match plan_play(&cmd, ctx, output).await {
        Ok(plan) => plan,
        Err(code) => return code,
    };
    let start = plan.start_secs();
    let resume = plan.resume;
    let duration_minutes = plan.duration_minutes;
    let url = plan.stream_url;

    if cmd.print_url {
        let result = PlayResult {
            film_id: cmd.film_id,
            stream_url: url,
            start_secs: start,
            saved_secs: None,
            finished: false,
        };
        return print_or_fail(output, result, |r| r.stream_url.clone());
    }

    let player = LocalPlayer::new(cmd.player.map(PlayerType::from).unwrap_or(ctx.player));
    match start {
        Some(secs) => output.info(format!(
            "{} in {} from {}",
            resume.action_label(),
            player.player_type(),
            format_position(secs)
        )),
        None => output.info(format!("Playing in {}", player.player_type())),
    }

    let outcome = match player.play_and_wait(&url, start).await {
        Ok(outcome) => outcome,
        Err(e) => return output.error(e.to_string(), ExitCode::PlayerFailed),
    };

    let progress = ctx.progress();
    let (saved_secs, finished) = match ProgressUpdate::from_outcome(&outcome, duration_minutes) {
        ProgressUpdate::Save(secs) => {
            progress.save_progress(&cmd.film_id, secs);
            (Some(secs), false)
        }
        ProgressUpdate::Clear => {
            progress.clear_progress(&cmd.film_id);
            (None, true)
        }
        ProgressUpdate::Keep => (None, false),
    };

    let result = PlayResult {
        film_id: cmd.film_id,
        stream_url: url,
        start_secs: start,
        saved_secs,
        finished,
    };
    print_or_fail(output, result, |r| match (r.finished, r.saved_secs) {
        (true, _) => "Finished. Resume point cleared.".to_string(),
        (false, Some(secs)) => format!("Stopped at {}.", format_position(secs)),
        (false, None) => "Stopped.".to_string(),
    })
}

// =============================================================================
// Progress
// =============================================================================

#[derive(Debug, Serialize)]
struct ProgressEntry {
    film_id: String,
    seconds: Option<f64>,
}

pub fn progress_cmd(cmd: ProgressCmd, ctx: &Context, output: &Output) -> ExitCode {
    let progress = ctx.progress();

    match cmd {
        ProgressCmd::Get { film_id } => {
            let entry = ProgressEntry {
                seconds: progress.get_progress(&film_id),
                film_id,
            };
            print_or_fail(output, entry, |e| match e.seconds {
                Some(secs) => format!("{}: {}", e.film_id, format_position(secs)),
                None => format!("{}: no saved position", e.film_id),
            })
        }
        ProgressCmd::Set { film_id, position } => {
            let Some(seconds) = parse_position(&position) else {
                return output.error(
                    format!("Invalid position '{}' (use seconds or [h:]mm:ss)", position),
                    ExitCode::InvalidArgs,
                );
            };
            progress.save_progress(&film_id, seconds);
            let entry = ProgressEntry {
                film_id,
                seconds: Some(seconds),
            };
            print_or_fail(output, entry, |e| {
                format!("Saved {} for {}", format_position(seconds), e.film_id)
            })
        }
        ProgressCmd::Clear { film_id } => {
            progress.clear_progress(&film_id);
            print_or_fail(output, StatusOk::default(), |_| {
                format!("Cleared position for {}", film_id)
            })
        }
        ProgressCmd::List => {
            let entries: Vec<ProgressEntry> = progress
                .entries()
                .into_iter()
                .map(|(film_id, secs)| ProgressEntry {
                    film_id,
                    seconds: Some(secs),
                })
                .collect();
            print_or_fail(output, entries, |entries| {
                if entries.is_empty() {
                    return "No saved positions.".to_string();
                }
                entries
                    .iter()
                    .map(|e| {
                        format!(
                            "{}  {}",
                            e.film_id,
                            e.seconds.map(format_position).unwrap_or_default()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

