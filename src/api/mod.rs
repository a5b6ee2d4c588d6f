//! API client for the EmberTV backend
//!
//! - Session: login/logout, rentals, playback authorization, catalog

pub mod session;

pub use session::{AuthError, NetworkError, SessionClient, DEFAULT_BASE_URL, TOKEN_KEY};
