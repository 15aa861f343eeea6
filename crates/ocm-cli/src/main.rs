//! `ocm` binary entrypoint.

use std::io;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ocm_cli::cli::{Cli, Commands};
use ocm_cli::commands::{ConfigCommand, GetCommand, LoginCommand, LogoutCommand, TokenCommand};
use ocm_cli::context::Context;
use ocm_cli::output::OutputFormat;
use ocm_config::Environment;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli, Environment::from_process())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, env: Environment) -> Result<(), ocm_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let mut ctx = Context::from_environment(env)?;
    let mut stdout = io::stdout().lock();
    let now = Utc::now();

    match cli.command {
        Commands::Login(args) => {
            let cmd = LoginCommand::new(now);
            cmd.execute(&mut stdout, &format, &mut ctx, &args).await?;
        }
        Commands::Logout => {
            let cmd = LogoutCommand::new();
            cmd.execute(&mut stdout, &format, &mut ctx)?;
        }
        Commands::Token(args) => {
            let cmd = TokenCommand::new(now);
            cmd.execute(&mut stdout, &format, &mut ctx, &args).await?;
        }
        Commands::Config { command } => {
            let cmd = ConfigCommand::new();
            cmd.execute(&mut stdout, &format, &mut ctx, &command)?;
        }
        Commands::Get(args) => {
            let cmd = GetCommand::new(now);
            cmd.execute(&mut stdout, &format, &mut ctx, &args).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocm_cli::cli::{ConfigCommands, Format};

    fn env_in(dir: &tempfile::TempDir) -> Environment {
        Environment {
            config_path: Some(dir.path().join("ocm.json")),
            ..Environment::default()
        }
    }

    #[test]
    fn cli_parses_config_path() {
        let cli = Cli::parse_from(["ocm", "config", "path"]);
        assert!(matches!(cli.command, Commands::Config { command: ConfigCommands::Path }));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["ocm", "--format", "json", "logout"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[tokio::test]
    async fn run_token_without_login_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = Cli::parse_from(["ocm", "token"]);
        let result = run(cli, env_in(&dir)).await;
        assert!(matches!(result, Err(ocm_cli::CliError::NotArmed(_))));
    }

    #[tokio::test]
    async fn run_config_set_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = Cli::parse_from(["ocm", "config", "set", "pager", "less"]);
        run(cli, env_in(&dir)).await.expect("config set");
        assert!(dir.path().join("ocm.json").exists());
    }

    #[tokio::test]
    async fn run_with_unknown_keyring_fails() {
        let env = Environment {
            keyring: Some("kwallet".to_string()),
            ..Environment::default()
        };
        let cli = Cli::parse_from(["ocm", "logout"]);
        assert!(run(cli, env).await.is_err());
    }
}
