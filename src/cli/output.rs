//! Output helpers for consistent CLI formatting

use console::style;

/// Display a section header
pub fn section(title: &str) {
    println!("{}", style(title).bold().cyan());
}

/// Display a success step
pub fn step_ok(message: &str) {
    println!("  {} {}", style("[OK]").green(), message);
}

/// Display an informational step
pub fn step_info(message: &str) {
    println!("  {} {}", style("[INFO]").cyan(), message);
}

/// Display a warning step with a hint
pub fn step_warn_hint(message: &str, hint: &str) {
    println!("  {} {}", style("[WARN]").yellow(), message);
    println!("       {}", style(hint).dim());
}

/// Display an error step with detail
pub fn step_error_detail(message: &str, detail: &str) {
    eprintln!("  {} {}: {}", style("[ERROR]").red(), message, detail);
}

/// Display a label/value row
pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<14} {}", style(label).bold(), value);
}
