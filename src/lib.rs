//! EmberTV - rental streaming client
//!
//! Logs in to the EmberTV backend, lists active rentals, asks for playback
//! authorization and remembers where each film was stopped.
//!
//! # Modules
//!
//! - `models` - Rentals, films, playback authorization
//! - `api` - Session client for the backend
//! - `storage` - Durable key-value store and resume progress
//! - `stream` - Local player and resume policy
//! - `config` - Config file and API URL resolution
//! - `cli` / `commands` - Scriptable front end

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod storage;
pub mod stream;

// Re-export commonly used types
pub use models::{Credentials, Film, Paginated, PlaybackAuthorization, Rental, RentalFilm};

pub use api::{AuthError, NetworkError, SessionClient};
pub use storage::{FileStore, KeyValueStore, MemoryStore, ProgressStore, StorageError};
pub use stream::{LocalPlayer, PlayerType, ResumePoint};
