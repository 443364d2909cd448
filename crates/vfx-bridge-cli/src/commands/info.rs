//! Image info command.
//!
//! Shows geometry, encoding type and the decode path taken; with `--all`
//! also the normalized metadata.

use crate::InfoArgs;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::trace;
use vfx_bridge::{DecodePath, Decoded};

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: u8) -> Result<()> {
    for path in &args.input {
        trace!(path = %path.display(), "info::run");
        let file_size = fs::metadata(path)
            .with_context(|| format!("Failed to stat: {}", path.display()))?
            .len();
        let decoded = super::load_image(path, args.force_backend)?;
        print_text(path, &decoded, file_size, args.all || verbose > 0);

        if args.input.len() > 1 {
            println!();
        }
    }
    Ok(())
}

fn print_text(path: &Path, decoded: &Decoded, file_size: u64, show_metadata: bool) {
    let image = &decoded.image;
    let via = match decoded.path {
        DecodePath::Native => "native",
        DecodePath::Backend => "generic backend",
    };

    println!("{}", path.display());
    println!("  Resolution: {}x{}", image.width(), image.height());
    println!("  Channels:   {}", image.channels());
    println!(
        "  Samples:    {:?}, {} bits",
        image.pixels().sample_type(),
        image.bits_per_sample()
    );
    println!("  Encoding:   {}", image.encoding());
    println!("  Decoded by: {}", via);
    println!("  File size:  {}", super::format_size(file_size));

    if show_metadata {
        if image.metadata().is_empty() {
            println!("  Metadata:   (none)");
        } else {
            println!("  Metadata:");
            for (key, value) in image.metadata().iter() {
                println!("    {}: {}", key, value);
            }
        }
    }
}
