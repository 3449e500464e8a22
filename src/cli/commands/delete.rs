//! Delete, undelete and destroy commands

use crate::cli::args::{DeleteArgs, DestroyArgs, UndeleteArgs};
use crate::cli::{blocking, output, Connection};
use crate::error::VaultResult;

fn describe(path: &str, versions: &[u64]) -> String {
    if versions.is_empty() {
        format!("{path} (latest)")
    } else {
        let list: Vec<String> = versions.iter().map(u64::to_string).collect();
        format!("{} (versions {})", path, list.join(", "))
    }
}

/// Execute the delete command
pub async fn delete(args: DeleteArgs, conn: &Connection) -> VaultResult<()> {
    let kv = conn.kv()?;
    let (path, versions) = (args.path.clone(), args.versions.clone());
    blocking(move || kv.delete(&path, &versions)).await?;

    output::step_ok(&format!("Deleted {}", describe(&args.path, &args.versions)));
    Ok(())
}

/// Execute the undelete command
pub async fn undelete(args: UndeleteArgs, conn: &Connection) -> VaultResult<()> {
    let kv = conn.kv()?;
    let (path, versions) = (args.path.clone(), args.versions.clone());
    blocking(move || kv.undelete(&path, &versions)).await?;

    output::step_ok(&format!(
        "Restored {}",
        describe(&args.path, &args.versions)
    ));
    Ok(())
}

/// Execute the destroy command
pub async fn destroy(args: DestroyArgs, conn: &Connection) -> VaultResult<()> {
    let kv = conn.kv()?;
    let (path, versions) = (args.path.clone(), args.versions.clone());

    if args.all {
        blocking(move || kv.destroy_all(&path)).await?;
        output::step_ok(&format!("Destroyed {} and all of its history", args.path));
    } else {
        blocking(move || kv.destroy(&path, &versions)).await?;
        output::step_ok(&format!(
            "Destroyed {}",
            describe(&args.path, &args.versions)
        ));
    }
    Ok(())
}
