//! EmberTV session client
//!
//! Owns the bearer token and performs every call against the backend
//! functions host. The token is persisted in the shared key-value store so
//! a later process picks it up again.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{AuthResponse, Credentials, Film, Paginated, PlaybackAuthorization, Rental};
use crate::storage::KeyValueStore;

/// Backend functions root used when nothing else is configured
pub const DEFAULT_BASE_URL: &str =
    "https://embervod.base44.app/api/apps/691721b89e14bc8b401725d6/functions";

/// Store key holding the persisted bearer token
pub const TOKEN_KEY: &str = "EmberAuthToken";

const LOGIN_PATH: &str = "authLogin";
const RENTALS_PATH: &str = "apiMyRentals";
const PLAYBACK_PATH: &str = "apiPlayback";
const FILMS_PATH: &str = "films";

/// Login failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Server error: {0}")]
    ServerError(String),
}

/// Failures of authenticated calls
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Bad server response ({0})")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct PlaybackBody<'a> {
    film_id: &'a str,
}

/// Client for the EmberTV backend, holding the current session
pub struct SessionClient {
    base_url: String,
    client: reqwest::Client,
    store: Arc<dyn KeyValueStore>,
    token: Option<String>,
}

impl SessionClient {
    /// Create a client against the default backend, adopting any stored token
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, store)
    }

    /// Create a client with a custom base URL
    pub fn with_base_url(base_url: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        let token = store.get_string(TOKEN_KEY).filter(|t| !t.is_empty());
        if let Some(t) = &token {
            tracing::debug!(token = %token_prefix(t), "restored session token");
        }

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            store,
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Build a request with JSON headers and the bearer token if we have one
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");

        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        builder
    }

    fn clear_token(&mut self) {
        self.token = None;
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "failed to remove stored token");
        }
    }

    // -------------------------------------------------------------------------
    // Auth
    // -------------------------------------------------------------------------

    /// Log in and persist the returned token.
    ///
    /// Any existing token is dropped before the request goes out, so a failed
    /// login never leaves stale credentials behind.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.clear_token();

        let body = Credentials::new(email, password);
        tracing::debug!(email, "sending login request");

        let response = self
            .request(Method::POST, LOGIN_PATH)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::ServerError(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "login response");

        match status.as_u16() {
            200 => {
                let auth: AuthResponse = decode(response)
                    .await
                    .map_err(|e| AuthError::ServerError(e.to_string()))?;

                if let Err(e) = self.store.set(TOKEN_KEY, Value::String(auth.token.clone())) {
                    tracing::warn!(error = %e, "failed to persist token");
                }
                tracing::info!(token = %token_prefix(&auth.token), "logged in");
                self.token = Some(auth.token);
                Ok(())
            }
            401 => Err(AuthError::InvalidCredentials),
            code => Err(AuthError::ServerError(format!("HTTP {}", code))),
        }
    }

    /// Forget the session, in memory and on disk
    pub fn logout(&mut self) {
        self.clear_token();
        tracing::info!("logged out");
    }

    // -------------------------------------------------------------------------
    // Authenticated calls
    // -------------------------------------------------------------------------

    /// Active rentals for the logged-in user, in server order
    pub async fn list_rentals(&self) -> Result<Vec<Rental>, NetworkError> {
        self.require_token()?;

        let response = self.request(Method::GET, RENTALS_PATH).send().await?;
        let page: Paginated<Rental> = decode(check_status(response, RENTALS_PATH)?).await?;

        tracing::debug!(count = page.data.len(), "fetched rentals");
        Ok(page.data)
    }

    /// Ask the backend whether this session may stream `film_id`.
    ///
    /// Callers must check `has_access` (or use `playable_url()`); a URL in
    /// the response is not by itself an authorization.
    pub async fn fetch_playback(
        &self,
        film_id: &str,
    ) -> Result<PlaybackAuthorization, NetworkError> {
        self.require_token()?;

        let response = self
            .request(Method::POST, PLAYBACK_PATH)
            .json(&PlaybackBody { film_id })
            .send()
            .await?;
        let playback: PlaybackAuthorization =
            decode(check_status(response, PLAYBACK_PATH)?).await?;

        tracing::debug!(
            film_id,
            has_access = playback.has_access,
            stream_url = ?playback.stream_url(),
            "fetched playback"
        );
        Ok(playback)
    }

    /// Public film catalog. Sends the token when present but does not need one.
    pub async fn fetch_films(&self) -> Result<Vec<Film>, NetworkError> {
        let response = self.request(Method::GET, FILMS_PATH).send().await?;
        let page: Paginated<Film> = decode(check_status(response, FILMS_PATH)?).await?;
        Ok(page.data)
    }

    fn require_token(&self) -> Result<(), NetworkError> {
        if self.token.is_none() {
            return Err(NetworkError::NotAuthenticated);
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_deref().map(token_prefix))
            .finish_non_exhaustive()
    }
}

fn check_status(response: Response, endpoint: &str) -> Result<Response, NetworkError> {
    let status = response.status();
    tracing::debug!(endpoint, status = status.as_u16(), "response");
    if !status.is_success() {
        return Err(NetworkError::Status(status.as_u16()));
    }
    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, NetworkError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| NetworkError::Decode(format!("JSON parse error: {}", e)))
}

/// First 16 characters of a token, enough to tell sessions apart in logs
pub fn token_prefix(token: &str) -> String {
    token.chars().take(16).collect()
}
