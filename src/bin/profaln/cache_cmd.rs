use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use profaln::Alignment;

/// Options for the `build-cache` subcommand.
#[derive(Debug, Args)]
pub struct BuildCacheCmd {
    /// Reference alignment FASTA file.
    #[arg(value_name = "FASTA")]
    pub alignment: PathBuf,
    /// Path to write the profile cache to.
    #[arg(value_name = "CACHE")]
    pub cache: PathBuf,
}

pub fn run(cmd: BuildCacheCmd) -> Result<()> {
    let text = fs::read_to_string(&cmd.alignment)
        .with_context(|| format!("read alignment FASTA: {}", cmd.alignment.display()))?;
    let alignment = Alignment::from_fasta(&text).context("could not build cache file")?;
    alignment
        .to_cache_file(&cmd.cache)
        .with_context(|| format!("write cache: {}", cmd.cache.display()))?;
    Ok(())
}
