//! Status command - show server init and seal state

use crate::cli::{blocking, output, Connection};
use crate::error::VaultResult;
use crate::sys::SealState;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute(conn: &Connection) -> VaultResult<()> {
    let client = conn.client();
    let (initialized, seal) = blocking(move || {
        if !client.is_initialized()? {
            return Ok((false, None));
        }
        Ok((true, Some(client.seal_status()?)))
    })
    .await?;

    output::section("Vault Status");
    output::field("Address", &conn.address);

    if !initialized {
        println!("  {}{}", CROSS, style("Not initialized").red());
        return Ok(());
    }
    println!("  {}Initialized", CHECK);

    if let Some(seal) = seal {
        print_seal(&seal);
    }
    Ok(())
}

fn print_seal(seal: &SealState) {
    if seal.sealed {
        println!(
            "  {}{} (unseal progress {}/{})",
            CROSS,
            style("Sealed").red(),
            seal.progress,
            seal.threshold
        );
    } else {
        println!("  {}Unsealed", CHECK);
    }

    if !seal.kind.is_empty() {
        output::field("Seal type", &seal.kind);
    }
    output::field("Key shares", seal.shares);
    output::field("Threshold", seal.threshold);
    if !seal.version.is_empty() {
        output::field("Version", &seal.version);
    }
    if let Some(name) = &seal.cluster_name {
        output::field("Cluster", name);
    }
}
