//! Format conversion command.
//!
//! Decodes the input through the usual native-first path and re-encodes it
//! through the generic backend.

use crate::ConvertArgs;
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::{info, trace};
use vfx_bridge::codec::dpx::Endianness;
use vfx_bridge::{CodecBackend, CodecOptions, Encoder, FormatRegistry};

/// Runs the convert command.
pub fn run(args: ConvertArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "convert::run");

    if !(1..=100).contains(&args.quality) {
        bail!("JPEG quality must be between 1 and 100, got {}", args.quality);
    }

    let decoded = super::load_image(&args.input, args.force_backend)?;
    let image = decoded.image;

    let encoding = match args.encoding {
        Some(encoding) => encoding,
        None => FormatRegistry::global()
            .get_by_path(&args.output)
            .map(|entry| entry.encoding)
            .with_context(|| {
                format!(
                    "Cannot infer an encoding type from {}; pass --type",
                    args.output.display()
                )
            })?,
    };

    let endianness = if args.little_endian {
        Endianness::Little
    } else {
        Endianness::Big
    };
    let options = CodecOptions::default()
        .with_jpeg_quality(args.quality)
        .with_dpx_endianness(endianness);
    let encoder = Encoder::new().with_backend(Arc::new(CodecBackend::with_options(options)));

    info!(
        input = %args.input.display(),
        from = %image.encoding(),
        output = %args.output.display(),
        to = %encoding,
        "Converting image"
    );
    if verbose > 0 {
        println!(
            "Converting {} ({}) -> {} ({})",
            args.input.display(),
            image.encoding(),
            args.output.display(),
            encoding
        );
    }

    encoder
        .encode(&image, encoding, args.depth, &args.output)
        .with_context(|| format!("Failed to save: {}", args.output.display()))?;

    if verbose > 0 {
        println!("Done.");
    }
    Ok(())
}
