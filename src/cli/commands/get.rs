//! Get command - read a secret

use crate::cli::args::{GetArgs, OutputFormat};
use crate::cli::{blocking, output, Connection};
use crate::error::VaultResult;
use crate::kv::{KvGetOpts, KvVersion};
use console::style;
use serde_json::{json, Value};

/// Execute the get command
pub async fn execute(args: GetArgs, conn: &Connection) -> VaultResult<()> {
    let kv = conn.kv()?;
    let path = args.path.clone();
    let opts = KvGetOpts {
        version: args.secret_version.unwrap_or(0),
    };

    let (data, version) = blocking(move || kv.get::<Value>(&path, Some(&opts))).await?;

    match args.format {
        OutputFormat::Table => print_table(&args.path, data.as_ref(), &version),
        OutputFormat::Json => print_json(data, &version)?,
        OutputFormat::Plain => print_plain(data.as_ref()),
    }

    Ok(())
}

/// Render a field value: strings bare, everything else as compact JSON
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_table(path: &str, data: Option<&Value>, version: &KvVersion) {
    output::section(&format!("{} (version {})", path, version.version));

    let Some(data) = data else {
        output::step_info("Secret holds no data");
        return;
    };

    let Value::Object(fields) = data else {
        println!("{}", render(data));
        return;
    };

    let width = fields.keys().map(String::len).max().unwrap_or(0).max(3);
    println!(
        "{:<width$}  {}",
        style("KEY").bold(),
        style("VALUE").bold(),
        width = width
    );
    println!("{}", "-".repeat(width + 7));
    for (key, value) in fields {
        println!("{:<width$}  {}", key, render(value), width = width);
    }
}

fn print_json(data: Option<Value>, version: &KvVersion) -> VaultResult<()> {
    let body = json!({ "data": data, "version": version });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn print_plain(data: Option<&Value>) {
    match data {
        Some(Value::Object(fields)) => {
            for (key, value) in fields {
                println!("{}={}", key, render(value));
            }
        }
        Some(other) => println!("{}", render(other)),
        None => {}
    }
}
