//! Integration tests for EmberTV
//!
//! Tests are organized by component:
//! - session_test: SessionClient against a mocked backend
//! - progress_test: ProgressStore and resume policy over a file store
//! - cli_test: argument parsing and command handlers
//! - e2e_test: login -> rentals -> playback -> resume flows

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
