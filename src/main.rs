//! EmberTV - rental streaming client
//!
//! # Usage
//!
//! ```bash
//! embertv login --email me@example.com
//! embertv rentals
//! embertv play f1
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use embertv::cli::{Cli, Command, ExitCode, Output};
use embertv::commands::{self, Context};
use embertv::config::Config;

/// Environment variable controlling log output (EnvFilter syntax)
const LOG_ENV: &str = "EMBER_LOG";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = Cli::parse();
    run_cli(cli).await.into()
}

/// Logs go to stderr so JSON on stdout stays parseable
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let ctx = match Context::from_config(&config, cli.api_url.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::Error),
    };

    match cli.command {
        Command::Login(cmd) => commands::login_cmd(cmd, &ctx, &output).await,

        Command::Logout => commands::logout_cmd(&ctx, &output),

        Command::Status => commands::status_cmd(&ctx, &output),

        Command::Rentals(cmd) => commands::rentals_cmd(cmd, &ctx, &output).await,

        Command::Films(cmd) => commands::films_cmd(cmd, &ctx, &output).await,

        Command::Playback(cmd) => commands::playback_cmd(cmd, &ctx, &output).await,

        Command::Play(cmd) => commands::play_cmd(cmd, &ctx, &output).await,

        Command::Progress(cmd) => commands::progress_cmd(cmd, &ctx, &output),
    }
}
