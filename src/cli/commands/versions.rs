//! Versions command - show the version history of a secret

use crate::cli::args::{OutputFormat, VersionsArgs};
use crate::cli::{blocking, output, Connection};
use crate::error::VaultResult;
use crate::kv::KvVersion;
use console::style;

/// Execute the versions command
pub async fn execute(args: VersionsArgs, conn: &Connection) -> VaultResult<()> {
    let kv = conn.kv()?;
    let path = args.path.clone();
    let versions = blocking(move || kv.versions(&path)).await?;

    match args.format {
        OutputFormat::Table => print_table(&args.path, &versions),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&versions)?),
        OutputFormat::Plain => {
            for v in &versions {
                println!("{} {}", v.version, status(v));
            }
        }
    }

    Ok(())
}

fn status(version: &KvVersion) -> &'static str {
    if version.destroyed {
        "destroyed"
    } else if version.deleted {
        "deleted"
    } else {
        "live"
    }
}

fn print_table(path: &str, versions: &[KvVersion]) {
    output::section(path);

    println!("{:<10} {:<12}", style("VERSION").bold(), style("STATUS").bold());
    println!("{}", "-".repeat(22));

    for v in versions {
        let styled = match status(v) {
            "live" => style("live").green(),
            "deleted" => style("deleted").yellow(),
            other => style(other).red(),
        };
        println!("{:<10} {:<12}", v.version, styled);
    }

    println!();
    println!("{} version(s)", versions.len());
}
