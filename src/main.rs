//! c-intf-gen: generate vtable-based C interfaces and classes.
//!
//! Reads a line-oriented description of interfaces and classes and writes
//! the C boilerplate for dynamic dispatch:
//!
//! - per interface: `<name>_gen.h`, `<name>_friend_gen.h`, `<name>_gen.c`
//! - per class: `<name>_gen.h`, `<name>_gen.c`
//!
//! `c-intf-gen -o gen/ shapes.def`

mod error;
mod model;
mod parser;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use render::GenConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "c-intf-gen",
    version,
    about = "Generate basic interfaces for C from a description file"
)]
struct Cli {
    /// The file containing the interface description
    description_file: PathBuf,

    /// The output directory for the generated files
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// The suffix used for generated files, e.g. <interface name><suffix>.c
    #[arg(short = 's', long = "gen-file-suffix", default_value = "_gen")]
    suffix: String,

    /// Log every generated file
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn gen_config(&self) -> GenConfig {
        GenConfig {
            output_dir: self.output_dir.clone(),
            suffix: self.suffix.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let path = &cli.description_file;
    let input = fs::read_to_string(path)
        .with_context(|| format!("could not open {}", path.display()))?;

    let doc = parser::parse(&input)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let classes = parser::resolve(&doc)
        .with_context(|| format!("failed to resolve {}", path.display()))?;

    let config = cli.gen_config();
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output directory: {}", config.output_dir.display())
    })?;

    // Files already written stay on disk if a later write fails
    let artifacts = render::generate(&doc, &classes, &config);
    for artifact in &artifacts {
        let out_path = config.path_for(artifact);
        fs::write(&out_path, &artifact.contents)
            .with_context(|| format!("could not open {} for writing", out_path.display()))?;
        log::debug!("wrote {}", out_path.display());
    }

    log::info!(
        "generated {} files for {} interfaces and {} classes",
        artifacts.len(),
        doc.interfaces.len(),
        classes.len()
    );
    Ok(())
}

/// Warnings by default, everything down to debug with `--verbose`.
/// `RUST_LOG` still wins when set.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}
