//! Login command - authenticate and print the resulting token

use crate::cli::args::LoginArgs;
use crate::cli::{blocking, output, Connection};
use crate::config::{AuthMethod, Config, ConfigManager};
use crate::error::{VaultError, VaultResult};
use tracing::info;

/// Execute the login command
pub async fn execute(
    args: LoginArgs,
    conn: &Connection,
    config: &Config,
    manager: &ConfigManager,
) -> VaultResult<()> {
    let method = args.method.unwrap_or(config.auth.method);
    let mut client = conn.client();

    let token = match method {
        AuthMethod::Token => conn.token.clone().ok_or(VaultError::MissingToken)?,
        AuthMethod::Userpass | AuthMethod::Ldap => {
            let username = args
                .username
                .or_else(|| config.auth.username.clone())
                .ok_or_else(|| VaultError::InvalidArgument("--username is required".into()))?;
            let password = args
                .password
                .ok_or_else(|| VaultError::InvalidArgument("--password is required".into()))?;

            let output = blocking(move || {
                if method == AuthMethod::Ldap {
                    client.auth_ldap(&username, &password)
                } else {
                    client.auth_userpass(&username, &password)
                }
            })
            .await?;
            output.auth.client_token
        }
        AuthMethod::Github => {
            let access_token = args
                .github_token
                .ok_or_else(|| VaultError::InvalidArgument("--github-token is required".into()))?;
            let output = blocking(move || client.auth_github(&access_token)).await?;
            output.auth.client_token
        }
    };

    if args.save {
        let mut config = config.clone();
        config.vault.token = Some(token.clone());
        manager.save(&config).await?;
        info!("Token stored in {}", manager.path().display());
        output::step_ok(&format!("Token saved to {}", manager.path().display()));
    }

    println!("{}", token);
    Ok(())
}
