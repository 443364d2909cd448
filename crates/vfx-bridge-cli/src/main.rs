//! vfxb - inspect and convert images through vfx-bridge
//!
//! Decodes with the native stack when it can, falls back to the generic
//! backend when it can't, and writes every supported type atomically.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vfx_bridge::EncodingType;

mod commands;

#[derive(Parser)]
#[command(name = "vfxb")]
#[command(author, version, about = "Inspect and convert images through vfx-bridge")]
#[command(long_about = "
Native-first image decoding with a generic codec fallback.

Examples:
  vfxb info scan.0101.dpx                  # Dimensions, encoding type, decode path
  vfxb info plate.png --force-backend -a   # Backend metadata for a native format
  vfxb convert scan.0101.dpx scan.exr      # Type chosen from the extension
  vfxb convert in.exr out.dpx -t dpx -d 12 --little-endian
  vfxb formats --all                       # Every readable type
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Display image information
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Convert to another encoding type
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// List supported formats
    #[command(visible_alias = "f")]
    Formats(FormatsArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Input image(s)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Skip the native stack
    #[arg(long)]
    force_backend: bool,

    /// Show all metadata
    #[arg(short, long)]
    all: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// Input image
    input: PathBuf,

    /// Output image
    output: PathBuf,

    /// Encoding type (dpx, exr, hdr, tiff, png, jpeg); defaults to the output extension
    #[arg(short = 't', long = "type")]
    encoding: Option<EncodingType>,

    /// Bit depth; defaults to the encoding's default
    #[arg(short, long)]
    depth: Option<u8>,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value_t = 90)]
    quality: u8,

    /// Write little-endian DPX
    #[arg(long)]
    little_endian: bool,

    /// Skip the native stack when reading the input
    #[arg(long)]
    force_backend: bool,
}

#[derive(Args)]
struct FormatsArgs {
    /// Include formats only the generic backend can read
    #[arg(short, long)]
    all: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info(args) => commands::info::run(args, cli.verbose),
        Commands::Convert(args) => commands::convert::run(args, cli.verbose),
        Commands::Formats(args) => commands::formats::run(args),
    }
}
