//! vaultkv - Vault key/value client
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vaultkv::cli::{commands, Cli, Commands, Connection};
use vaultkv::config::{Config, ConfigManager};
use vaultkv::error::VaultResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn, 1 = info, 2+ = debug; the config flag counts as one -v
    let level = verbose.saturating_add(u8::from(config.general.verbose));
    let filter = match level {
        0 => EnvFilter::new("vaultkv=warn"),
        1 => EnvFilter::new("vaultkv=info"),
        _ => EnvFilter::new("vaultkv=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> VaultResult<()> {
    let cli = Cli::parse();

    // Completions don't need config loading
    if let Commands::Completions { shell } = cli.command {
        return commands::completions(shell);
    }

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::default(),
    };
    let config = manager.load().await?;
    init_logging(cli.verbose, &config);
    debug!("Loaded configuration from {}", manager.path().display());

    let conn = Connection::resolve(cli.address, cli.token, &config.vault);

    match cli.command {
        Commands::Completions { .. } => unreachable!("Completions handled above"),
        Commands::Get(args) => commands::get(args, &conn).await,
        Commands::Set(args) => commands::set(args, &conn).await,
        Commands::Delete(args) => commands::delete(args, &conn).await,
        Commands::Undelete(args) => commands::undelete(args, &conn).await,
        Commands::Destroy(args) => commands::destroy(args, &conn).await,
        Commands::Versions(args) => commands::versions(args, &conn).await,
        Commands::List(args) => commands::list(args, &conn).await,
        Commands::MountVersion(args) => commands::mount_version(args, &conn).await,
        Commands::Status => commands::status(&conn).await,
        Commands::Login(args) => commands::login(args, &conn, &config, &manager).await,
        Commands::Config(args) => commands::config(args, &config, &manager).await,
    }
}
