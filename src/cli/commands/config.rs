//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::cli::output;
use crate::config::{Config, ConfigManager};
use crate::error::{VaultError, VaultResult};

const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "vault.address",
    "vault.token",
    "vault.timeout_secs",
    "auth.method",
    "auth.username",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> VaultResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            if !VALID_KEYS.contains(&key.as_str()) {
                output::step_error_detail("Unknown config key", &key);
                eprintln!("Valid keys:");
                for key in VALID_KEYS {
                    eprintln!("  {}", key);
                }
            }

            let mut config = config.clone();
            set_value(&mut config, &key, &value)?;
            manager.save(&config).await?;
            output::step_ok(&format!("Set {} = {}", key, display_value(&key, &value)));
        }
    }

    Ok(())
}

/// Print the effective configuration with the token masked
fn show_config(config: &Config) -> VaultResult<()> {
    let mut shown = config.clone();
    if shown.vault.token.is_some() {
        shown.vault.token = Some("<redacted>".to_string());
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> VaultResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        output::step_warn_hint(
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    output::step_ok(&format!("Configuration initialized ({})", path.display()));
    Ok(())
}

fn display_value<'a>(key: &str, value: &'a str) -> &'a str {
    if key == "vault.token" {
        "<redacted>"
    } else {
        value
    }
}

/// Apply a dot-separated key to `config`
fn set_value(config: &mut Config, key: &str, value: &str) -> VaultResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(VaultError::InvalidArgument(format!(
                    "Invalid log format: {value}. Use text or json"
                )))
            }
        },

        ["vault", "address"] => config.vault.address = value.trim_end_matches('/').to_string(),
        ["vault", "token"] => {
            config.vault.token = (!value.is_empty()).then(|| value.to_string());
        }
        ["vault", "timeout_secs"] => {
            config.vault.timeout_secs = value
                .parse()
                .map_err(|_| VaultError::InvalidArgument(format!("Invalid number: {value}")))?
        }

        ["auth", "method"] => {
            config.auth.method = value.parse().map_err(VaultError::InvalidArgument)?
        }
        ["auth", "username"] => config.auth.username = Some(value.to_string()),

        _ => {
            return Err(VaultError::InvalidArgument(format!(
                "Unknown config key: {key}"
            )))
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> VaultResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(VaultError::InvalidArgument(format!(
            "Invalid boolean value: {value}. Use true/false"
        ))),
    }
}
