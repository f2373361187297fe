//! Status lines printed after a command

use colored::*;
use std::path::{Path, PathBuf};

pub fn print_updated(file: &Path, backup: Option<&Path>) {
    println!(
        "{} {}",
        "✓ Updated".green().bold(),
        file.display().to_string().cyan()
    );
    if let Some(backup) = backup {
        println!("  Backup: {}", backup.display());
    }
}

pub fn print_rewritten(input: &Path, output: &Path, records: usize) {
    println!(
        "{} {} -> {} ({} persons)",
        "✓ Rewrote".green().bold(),
        input.display(),
        output.display().to_string().cyan(),
        records
    );
}

pub fn print_removed(dir: &Path, removed: &[PathBuf]) {
    if removed.is_empty() {
        println!("{}", format!("Nothing to remove in {}", dir.display()).dimmed());
        return;
    }
    println!(
        "{}",
        format!("Removed {} file(s) from {}:", removed.len(), dir.display()).bold()
    );
    for path in removed {
        println!("  - {}", path.display());
    }
}
