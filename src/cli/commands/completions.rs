//! Completions command - generate shell completion scripts

use crate::cli::Cli;
use crate::error::VaultResult;
use clap::CommandFactory;
use clap_complete::Shell;

/// Execute the completions command
pub fn execute(shell: Shell) -> VaultResult<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "vaultkv", &mut std::io::stdout());
    Ok(())
}
