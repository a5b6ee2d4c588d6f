//! CLI Command Tests
//!
//! Tests argument parsing and the command handlers against a mocked backend.
//! Covers exit codes and the session/progress side effects of each command.

// =============================================================================
// CLI Argument Parsing Tests
// =============================================================================

mod cli_parsing {
    use clap::Parser;
    use embertv::cli::{Cli, Command, PlayerChoice, ProgressCmd};

    #[test]
    fn test_login_command() {
        let cli = Cli::parse_from(["embertv", "login", "--email", "a@b.com", "--password", "x"]);
        match cli.command {
            Command::Login(cmd) => {
                assert_eq!(cmd.email, "a@b.com");
                assert_eq!(cmd.password, "x");
            }
            _ => panic!("Expected Login command"),
        }
    }

    #[test]
    fn test_login_requires_email() {
        let result = Cli::try_parse_from(["embertv", "login", "--password", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rentals_alias_and_flag() {
        let cli = Cli::parse_from(["embertv", "r", "--active-only"]);
        match cli.command {
            Command::Rentals(cmd) => assert!(cmd.active_only),
            _ => panic!("Expected Rentals command"),
        }
    }

    #[test]
    fn test_films_default_limit() {
        let cli = Cli::parse_from(["embertv", "films"]);
        match cli.command {
            Command::Films(cmd) => assert_eq!(cmd.limit, 50),
            _ => panic!("Expected Films command"),
        }
    }

    #[test]
    fn test_playback_command() {
        let cli = Cli::parse_from(["embertv", "pb", "f1"]);
        match cli.command {
            Command::Playback(cmd) => assert_eq!(cmd.film_id, "f1"),
            _ => panic!("Expected Playback command"),
        }
    }

    #[test]
    fn test_play_with_options() {
        let cli = Cli::parse_from(["embertv", "play", "f1", "-P", "vlc", "--from-start"]);
        match cli.command {
            Command::Play(cmd) => {
                assert_eq!(cmd.film_id, "f1");
                assert_eq!(cmd.player, Some(PlayerChoice::Vlc));
                assert!(cmd.from_start);
                assert!(!cmd.print_url);
            }
            _ => panic!("Expected Play command"),
        }
    }

    #[test]
    fn test_progress_subcommands() {
        let cli = Cli::parse_from(["embertv", "progress", "set", "f1", "2:05"]);
        match cli.command {
            Command::Progress(ProgressCmd::Set { film_id, position }) => {
                assert_eq!(film_id, "f1");
                assert_eq!(position, "2:05");
            }
            _ => panic!("Expected progress set"),
        }

        let cli = Cli::parse_from(["embertv", "progress", "list"]);
        assert!(matches!(cli.command, Command::Progress(ProgressCmd::List)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["embertv", "status", "--json", "-c", "/tmp/embertv.toml"]);
        assert!(cli.json);
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/tmp/embertv.toml"))
        );
    }
}

// =============================================================================
// Command Handler Tests
// =============================================================================

mod handlers {
    use embertv::api::TOKEN_KEY;
    use embertv::cli::{
        ExitCode, LoginCmd, Output, PlayCmd, PlaybackCmd, ProgressCmd, RentalsCmd,
    };
    use embertv::commands::{self, Context};
    use embertv::storage::{KeyValueStore, MemoryStore, ProgressStore};
    use embertv::stream::PlayerType;
    use mockito::Server;
    use serde_json::json;
    use std::sync::Arc;

    fn output() -> Output {
        Output {
            json: true,
            quiet: true,
        }
    }

    fn context(base_url: String, store: Arc<MemoryStore>) -> Context {
        Context {
            base_url,
            store,
            player: PlayerType::Mpv,
        }
    }

    fn logged_in_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_KEY, json!("abc123")).unwrap();
        store
    }

    #[tokio::test]
    async fn test_login_cmd_success() {
        let mut server = Server::new_async().await;
        let store = Arc::new(MemoryStore::new());
        let ctx = context(server.url(), store.clone());

        let mock = server
            .mock("POST", "/authLogin")
            .with_status(200)
            .with_body(r#"{"token":"abc123"}"#)
            .create_async()
            .await;

        let cmd = LoginCmd {
            email: "a@b.com".to_string(),
            password: "x".to_string(),
        };
        assert_eq!(commands::login_cmd(cmd, &ctx, &output()).await, ExitCode::Success);
        mock.assert_async().await;
        assert_eq!(store.get_string(TOKEN_KEY).as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_login_cmd_invalid_credentials() {
        let mut server = Server::new_async().await;
        let store = logged_in_store();
        let ctx = context(server.url(), store.clone());

        let _mock = server
            .mock("POST", "/authLogin")
            .with_status(401)
            .create_async()
            .await;

        let cmd = LoginCmd {
            email: "a@b.com".to_string(),
            password: "wrong".to_string(),
        };
        assert_eq!(
            commands::login_cmd(cmd, &ctx, &output()).await,
            ExitCode::InvalidCredentials
        );
        assert!(store.get(TOKEN_KEY).is_none());
    }

    #[test]
    fn test_logout_cmd_clears_token() {
        let store = logged_in_store();
        let ctx = context("http://localhost".to_string(), store.clone());

        assert_eq!(commands::logout_cmd(&ctx, &output()), ExitCode::Success);
        assert!(store.get(TOKEN_KEY).is_none());
        assert_eq!(commands::status_cmd(&ctx, &output()), ExitCode::Success);
    }

    #[tokio::test]
    async fn test_rentals_cmd_requires_login() {
        let ctx = context("http://localhost".to_string(), Arc::new(MemoryStore::new()));
        let code = commands::rentals_cmd(RentalsCmd { active_only: false }, &ctx, &output()).await;
        assert_eq!(code, ExitCode::NotLoggedIn);
    }

    #[tokio::test]
    async fn test_rentals_cmd_network_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/apiMyRentals")
            .with_status(500)
            .create_async()
            .await;

        let ctx = context(server.url(), logged_in_store());
        let code = commands::rentals_cmd(RentalsCmd { active_only: true }, &ctx, &output()).await;
        assert_eq!(code, ExitCode::NetworkError);
    }

    #[tokio::test]
    async fn test_playback_cmd_success() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/apiPlayback")
            .with_status(200)
            .with_body(r#"{"has_access": false}"#)
            .create_async()
            .await;

        let ctx = context(server.url(), logged_in_store());
        let cmd = PlaybackCmd {
            film_id: "f1".to_string(),
        };
        // Printing a denial is still a successful query
        assert_eq!(commands::playback_cmd(cmd, &ctx, &output()).await, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_play_cmd_refuses_without_access() {
        let mut server = Server::new_async().await;
        let _rentals = server
            .mock("GET", "/apiMyRentals")
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;
        let _playback = server
            .mock("POST", "/apiPlayback")
            .with_status(200)
            .with_body(r#"{"has_access": false, "hls_url": "https://cdn/f1.m3u8"}"#)
            .create_async()
            .await;

        let ctx = context(server.url(), logged_in_store());
        let cmd = PlayCmd {
            film_id: "f1".to_string(),
            player: None,
            from_start: false,
            print_url: true,
        };
        assert_eq!(commands::play_cmd(cmd, &ctx, &output()).await, ExitCode::NoAccess);
    }

    #[tokio::test]
    async fn test_play_cmd_print_url() {
        let mut server = Server::new_async().await;
        let _rentals = server
            .mock("GET", "/apiMyRentals")
            .with_status(200)
            .with_body(r#"{"data": [{"film": {"id": "f1", "title": "Demo", "duration_minutes": 90}}]}"#)
            .create_async()
            .await;
        let _playback = server
            .mock("POST", "/apiPlayback")
            .with_status(200)
            .with_body(r#"{"has_access": true, "hls_url": "https://cdn/f1.m3u8"}"#)
            .create_async()
            .await;

        let store = logged_in_store();
        let ctx = context(server.url(), store.clone());
        ProgressStore::new(store).save_progress("f1", 300.0);

        let cmd = PlayCmd {
            film_id: "f1".to_string(),
            player: None,
            from_start: false,
            print_url: true,
        };
        let plan = commands::plan_play(&cmd, &ctx, &output()).await.unwrap();
        assert_eq!(plan.stream_url, "https://cdn/f1.m3u8");
        assert_eq!(plan.duration_minutes, Some(90));
        assert_eq!(plan.start_secs(), Some(300.0));
        assert_eq!(plan.resume.action_label(), "Resume");

        assert_eq!(commands::play_cmd(cmd, &ctx, &output()).await, ExitCode::Success);
    }

    #[tokio::test]
    async fn test_play_plan_start_offset() {
        let mut server = Server::new_async().await;
        let _rentals = server
            .mock("GET", "/apiMyRentals")
            .with_status(200)
            .with_body(r#"{"data": [{"film": {"id": "f1", "title": "Demo", "duration_minutes": 90}}]}"#)
            .expect_at_least(1)
            .create_async()
            .await;
        let _playback = server
            .mock("POST", "/apiPlayback")
            .with_status(200)
            .with_body(r#"{"has_access": true, "hls_url": "https://cdn/f1.m3u8"}"#)
            .expect_at_least(1)
            .create_async()
            .await;

        let store = logged_in_store();
        let ctx = context(server.url(), store.clone());
        let progress = ProgressStore::new(store);
        let cmd = |from_start| PlayCmd {
            film_id: "f1".to_string(),
            player: None,
            from_start,
            print_url: true,
        };

        // Too early to seek: start from the beginning
        progress.save_progress("f1", 8.0);
        let plan = commands::plan_play(&cmd(false), &ctx, &output()).await.unwrap();
        assert_eq!(plan.start_secs(), None);

        // Seeks, but still offered as "Watch Now"
        progress.save_progress("f1", 45.0);
        let plan = commands::plan_play(&cmd(false), &ctx, &output()).await.unwrap();
        assert_eq!(plan.start_secs(), Some(45.0));
        assert_eq!(plan.resume.action_label(), "Watch Now");

        // --from-start ignores the saved position without touching it
        progress.save_progress("f1", 3000.0);
        let plan = commands::plan_play(&cmd(true), &ctx, &output()).await.unwrap();
        assert_eq!(plan.start_secs(), None);
        assert_eq!(progress.get_progress("f1"), Some(3000.0));
    }

    #[test]
    fn test_progress_cmd_flow() {
        let store = Arc::new(MemoryStore::new());
        let ctx = context("http://localhost".to_string(), store.clone());
        let progress = ProgressStore::new(store);

        let set = ProgressCmd::Set {
            film_id: "f1".to_string(),
            position: "2:05".to_string(),
        };
        assert_eq!(commands::progress_cmd(set, &ctx, &output()), ExitCode::Success);
        assert_eq!(progress.get_progress("f1"), Some(125.0));

        let bad = ProgressCmd::Set {
            film_id: "f1".to_string(),
            position: "soon".to_string(),
        };
        assert_eq!(commands::progress_cmd(bad, &ctx, &output()), ExitCode::InvalidArgs);
        assert_eq!(progress.get_progress("f1"), Some(125.0));

        assert_eq!(
            commands::progress_cmd(ProgressCmd::List, &ctx, &output()),
            ExitCode::Success
        );

        let clear = ProgressCmd::Clear {
            film_id: "f1".to_string(),
        };
        assert_eq!(commands::progress_cmd(clear, &ctx, &output()), ExitCode::Success);
        assert_eq!(progress.get_progress("f1"), None);
    }
}
