//! List and mount-version commands

use crate::cli::args::{ListArgs, OutputFormat, PathArgs};
use crate::cli::{blocking, output, Connection};
use crate::error::VaultResult;
use console::style;

/// Execute the list command
pub async fn execute(args: ListArgs, conn: &Connection) -> VaultResult<()> {
    let kv = conn.kv()?;
    let path = args.path.clone();
    let keys = blocking(move || kv.list(&path)).await?;

    if keys.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => output::step_info("No keys"),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&args.path, &keys),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&keys)?),
        OutputFormat::Plain => {
            for key in &keys {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

fn print_table(path: &str, keys: &[String]) {
    output::section(path);
    for key in keys {
        if key.ends_with('/') {
            println!("  {}", style(key).blue().bold());
        } else {
            println!("  {}", key);
        }
    }
    println!();
    println!("{} key(s)", keys.len());
}

/// Execute the mount-version command
pub async fn mount_version(args: PathArgs, conn: &Connection) -> VaultResult<()> {
    let kv = conn.kv()?;
    let generation = blocking(move || kv.mount_version(&args.path)).await?;
    println!("{}", generation);
    Ok(())
}
