//! Set command - write a secret

use crate::cli::args::SetArgs;
use crate::cli::{blocking, output, Connection};
use crate::error::VaultResult;
use crate::kv::KvSetOpts;
use serde_json::{Map, Value};

/// Execute the set command
pub async fn execute(args: SetArgs, conn: &Connection) -> VaultResult<()> {
    let kv = conn.kv()?;
    let values = to_object(args.fields);
    let opts = KvSetOpts { cas: args.cas };

    let path = args.path.clone();
    let version = blocking(move || kv.set(&path, &values, Some(&opts))).await?;

    output::step_ok(&format!(
        "Wrote {} (version {})",
        args.path, version.version
    ));
    Ok(())
}

/// Later duplicates of a key win
fn to_object(fields: Vec<(String, String)>) -> Value {
    let map: Map<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    Value::Object(map)
}
