use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use profaln::{combine_alignments, Alignment, ProfalnError};

/// Options for the `combine` subcommand.
#[derive(Debug, Args)]
pub struct CombineCmd {
    /// Query FASTA file with one or more sequences to insert.
    #[arg(value_name = "FASTA")]
    pub query: PathBuf,
    /// Reference alignment: plain FASTA or a profile cache, detected by
    /// content.
    #[arg(long, value_name = "FILE")]
    pub reference_alignment: PathBuf,
    /// Output FASTA file (stdout when omitted).
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Maximum sequence characters per output line (0 disables wrapping).
    #[arg(long, default_value_t = 60)]
    pub output_columns: usize,
}

pub fn run(cmd: CombineCmd) -> Result<()> {
    let reference = load_reference(&cmd.reference_alignment)?;
    let query_text = fs::read_to_string(&cmd.query)
        .with_context(|| format!("read query FASTA: {}", cmd.query.display()))?;
    let queries = Alignment::from_fasta(&query_text).context("invalid query format")?;

    let combined = combine_alignments(&reference, &queries)?;

    match &cmd.output {
        Some(path) => {
            let mut handle =
                fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
            combined.write_fasta(&mut handle, cmd.output_columns)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if let Err(err) = combined.write_fasta(&mut handle, cmd.output_columns) {
                // if the consumer closes the pipe early, don't raise an error
                if err.kind() != io::ErrorKind::BrokenPipe {
                    return Err(err.into());
                }
            }
        }
    }
    Ok(())
}

/// Load the reference from either a profile cache or FASTA, preferring the
/// cache interpretation. Only structurally unreadable cache input falls back
/// to FASTA; a recognized cache with an unsupported version is a hard error.
fn load_reference(path: &Path) -> Result<Alignment> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read reference alignment: {}", path.display()))?;
    match Alignment::from_cache_str(&text) {
        Ok(reference) => Ok(reference),
        Err(ProfalnError::CorruptCache(_)) => Alignment::from_fasta(&text)
            .with_context(|| format!("unknown reference alignment format: {}", path.display())),
        Err(err) => {
            Err(err).with_context(|| format!("load profile cache: {}", path.display()))
        }
    }
}
