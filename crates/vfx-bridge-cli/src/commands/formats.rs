//! Lists registered formats.

use crate::FormatsArgs;
use anyhow::Result;
use vfx_bridge::FormatRegistry;

/// Runs the formats command.
pub fn run(args: FormatsArgs) -> Result<()> {
    let registry = FormatRegistry::global();

    println!(
        "{:<14} {:<16} {:<24} {:<7} {:<6} {}",
        "Format", "Extensions", "Type", "Native", "Write", "Depths"
    );
    for entry in registry.entries() {
        if !(entry.native || (args.all && entry.backend_read)) {
            continue;
        }
        let depths: Vec<String> = entry
            .encoding
            .allowed_bit_depths()
            .iter()
            .map(|d| d.to_string())
            .collect();
        println!(
            "{:<14} {:<16} {:<24} {:<7} {:<6} {}",
            entry.name,
            entry.extensions.join(","),
            entry.type_identifier,
            yes_no(entry.native),
            yes_no(entry.backend_write),
            depths.join(",")
        );
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
