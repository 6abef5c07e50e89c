//! amchunk-debug
//!
//! Outputs a commented byte listing of encoded document and change chunks,
//! or transforms them.
//!
//! The text listing is valid Go syntax containing every input byte, so it
//! can be edited by hand and converted back into binary.
//!
//! # Pipeline
//!
//! 1. read the file (or stdin)
//! 2. `--prefix` adds a header, otherwise `--fix-checksum` repairs it
//! 3. `--compress` or `--decompress`
//! 4. `--raw` writes the bytes, otherwise the listing is printed

mod commands;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use amchunk_columnar::DecodeConfig;
use amchunk_inspect::{InspectConfig, DEFAULT_INDENT_WIDTH};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::inspect::OutputFormat;
use commands::transform::{Prefix, Transform};

/// Annotated listings of encoded chunks.
#[derive(Parser)]
#[command(name = "amchunk-debug")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file; stdin if omitted
    file: Option<PathBuf>,

    /// Prefix the bytes with a valid header (doc or change)
    #[arg(long, value_enum)]
    prefix: Option<PrefixArg>,

    /// Output the resulting bytes in binary
    #[arg(long)]
    raw: bool,

    /// Compress a change chunk
    #[arg(long, conflicts_with = "decompress")]
    compress: bool,

    /// Decompress a compressed chunk
    #[arg(long)]
    decompress: bool,

    /// Recompute the checksum of a change or compressed chunk
    #[arg(long)]
    fix_checksum: bool,

    /// Listing format
    #[arg(long, value_enum, default_value = "text")]
    format: FormatArg,

    /// Exit with status 2 if the listing contains errors
    #[arg(long)]
    check: bool,

    /// Spaces per nesting level
    #[arg(long, default_value_t = DEFAULT_INDENT_WIDTH)]
    indent: usize,

    /// Inflate compressed chunks to verify their checksum
    #[arg(long)]
    verify_compressed: bool,

    /// Maximum values a single value-meta column may expand to
    #[arg(long)]
    max_values: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PrefixArg {
    /// Document chunk header
    #[value(alias = "document")]
    Doc,
    /// Change chunk header
    #[value(alias = "ch")]
    Change,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

fn read_input(file: Option<&Path>) -> io::Result<Vec<u8>> {
    match file {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the listing or raw bytes
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(true) if cli.check => process::exit(2),
        Ok(_) => {}
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Runs the pipeline and returns whether the listing contains errors.
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let input = read_input(cli.file.as_deref())?;

    let transform = Transform {
        prefix: cli.prefix.map(|p| match p {
            PrefixArg::Doc => Prefix::Document,
            PrefixArg::Change => Prefix::Change,
        }),
        fix_checksum: cli.fix_checksum,
        compress: cli.compress,
        decompress: cli.decompress,
    };
    let output = commands::transform::run(input, &transform)?;

    if cli.raw {
        commands::inspect::write_raw(&output)?;
        return Ok(false);
    }

    let mut decode = DecodeConfig::default();
    if let Some(max) = cli.max_values {
        decode = decode.with_max_expanded_values(max);
    }
    let config = InspectConfig::new()
        .with_indent_width(cli.indent)
        .with_decode(decode)
        .with_verify_compressed_checksums(cli.verify_compressed);
    let format = match cli.format {
        FormatArg::Text => OutputFormat::Text,
        FormatArg::Json => OutputFormat::Json,
    };

    commands::inspect::run(&output, &config, format)
}
