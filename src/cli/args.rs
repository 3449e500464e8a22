//! CLI argument definitions using clap derive

use crate::config::AuthMethod;
use clap::{ArgAction, ArgGroup, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// vaultkv - Vault key/value client
///
/// Reads and writes secrets on KV version 1 and version 2 mounts alike.
#[derive(Parser, Debug)]
#[command(name = "vaultkv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VAULTKV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server address
    #[arg(short, long, global = true, env = "VAULT_ADDR")]
    pub address: Option<String>,

    /// Client token
    #[arg(short, long, global = true, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read a secret
    Get(GetArgs),

    /// Write a secret
    Set(SetArgs),

    /// Soft-delete versions of a secret (removes it on KV v1)
    Delete(DeleteArgs),

    /// Restore soft-deleted versions (KV v2 only)
    Undelete(UndeleteArgs),

    /// Permanently destroy versions of a secret
    Destroy(DestroyArgs),

    /// Show the version history of a secret
    Versions(VersionsArgs),

    /// List keys beneath a path
    List(ListArgs),

    /// Show the KV generation of the mount holding a path
    MountVersion(PathArgs),

    /// Show server init and seal state
    Status,

    /// Authenticate and print the resulting token
    Login(LoginArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// A single secret path
#[derive(Parser, Debug)]
pub struct PathArgs {
    /// Secret path, starting with the mount (e.g. secret/app/db)
    pub path: String,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Secret path, starting with the mount
    pub path: String,

    /// Version to read (default: latest)
    #[arg(long = "version", value_name = "N")]
    pub secret_version: Option<u64>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the set command
#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Secret path, starting with the mount
    pub path: String,

    /// Fields to store
    #[arg(required = true, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub fields: Vec<(String, String)>,

    /// Only write if the current version is N (0: only if absent)
    #[arg(long, value_name = "N")]
    pub cas: Option<u64>,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Secret path, starting with the mount
    pub path: String,

    /// Versions to delete (default: latest)
    #[arg(long, value_delimiter = ',')]
    pub versions: Vec<u64>,
}

/// Arguments for the undelete command
#[derive(Parser, Debug)]
pub struct UndeleteArgs {
    /// Secret path, starting with the mount
    pub path: String,

    /// Versions to restore
    #[arg(long, value_delimiter = ',', required = true)]
    pub versions: Vec<u64>,
}

/// Arguments for the destroy command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["versions", "all"])))]
pub struct DestroyArgs {
    /// Secret path, starting with the mount
    pub path: String,

    /// Versions to destroy
    #[arg(long, value_delimiter = ',')]
    pub versions: Vec<u64>,

    /// Destroy every version and the metadata
    #[arg(long, conflicts_with = "versions")]
    pub all: bool,
}

/// Arguments for the versions command
#[derive(Parser, Debug)]
pub struct VersionsArgs {
    /// Secret path, starting with the mount
    pub path: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Folder path, starting with the mount
    pub path: String,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the login command
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Auth method: token, userpass, ldap or github (default: from config)
    pub method: Option<AuthMethod>,

    /// Username for userpass and ldap (default: from config)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password for userpass and ldap
    #[arg(short, long, env = "VAULTKV_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Personal access token for github
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Store the resulting token in the config file
    #[arg(long)]
    pub save: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., vault.address)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for commands that print data
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Parse a secret field in KEY=VALUE format
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE format: empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
