//! CLI command implementations

pub mod convert;
pub mod formats;
pub mod info;

use anyhow::{Context, Result};
use std::path::Path;
use vfx_bridge::{DecodeOptions, Decoded, Decoder};

/// Decodes `path`, optionally skipping the native stack.
pub fn load_image(path: &Path, force_backend: bool) -> Result<Decoded> {
    Decoder::new()
        .decode(path, &DecodeOptions::default().with_force_backend(force_backend))
        .with_context(|| format!("Failed to load: {}", path.display()))
}

/// Formats byte size as human-readable string.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
