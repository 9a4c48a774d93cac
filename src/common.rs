//! Common helpers shared by the library and the CLI: the crate error type
//! and minimal FASTA reading/writing.
//!
//! ## FASTA
//! The parser is strict: every record must have a name and at least one
//! sequence line, and sequence data before the first header is an error.
//! Headers keep the full text after `>` as the sequence name.
//!
//! ## Errors
//! All library failures are surfaced through [`ProfalnError`]; nothing in the
//! library logs or prints, and no failure is retried.

use std::io::{self, Write};

/// Errors that can be returned by the operations in this crate.
#[derive(thiserror::Error, Debug)]
pub enum ProfalnError {
    /// Returned for malformed alignment input: empty input, duplicate or
    /// unknown sequence names, or sequences of inconsistent length.
    #[error("invalid alignment input: {0}")]
    Validation(String),
    /// Returned when a sequence contains a character outside the supported
    /// protein alphabet (residues, `B`/`Z`/`X` wildcards and gaps).
    #[error("unsupported residue {residue:?} in sequence {name:?}")]
    UnsupportedResidue { residue: char, name: String },
    /// Returned when the aligner is given an empty query or empty profile.
    #[error("alignment input must not be empty: {0}")]
    EmptyAlignmentInput(&'static str),
    /// Returned when a profile cache file is structurally unreadable.
    #[error("corrupt profile cache: {0}")]
    CorruptCache(String),
    /// Returned when a profile cache declares an unsupported format version.
    #[error("profile cache version {found} is not supported (expected {expected})")]
    CacheVersionMismatch { found: u32, expected: u32 },
    /// Returned when a profile cache does not belong to the alignment it is
    /// being attached to.
    #[error("profile cache does not match the target alignment: {0}")]
    CacheMismatch(String),
    /// Returned for failures at the file read/write boundary.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// A single FASTA record: the header text after `>` and the raw sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FastaRecord {
    /// Name from the FASTA header (full text after `>`, trimmed).
    pub name: String,
    /// Concatenated sequence lines, exactly as read.
    pub sequence: String,
}

/// Parse FASTA text into records.
///
/// Fails with [`ProfalnError::Validation`] when a record has no sequence
/// lines or sequence data appears before the first header.
///
/// ## Examples
/// ```
/// use profaln::parse_fasta;
/// let records = parse_fasta(">A\nGT-D\nVG\n>B\nGTK-VG\n").unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0].sequence, "GT-DVG");
/// ```
pub fn parse_fasta(text: &str) -> Result<Vec<FastaRecord>, ProfalnError> {
    let mut records: Vec<FastaRecord> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix('>') {
            if let Some(last) = records.last() {
                if last.sequence.is_empty() {
                    return Err(ProfalnError::Validation(format!(
                        "alignment missing sequence for {}",
                        last.name
                    )));
                }
            }
            records.push(FastaRecord {
                name: name.trim().to_string(),
                sequence: String::new(),
            });
        } else if !line.is_empty() {
            match records.last_mut() {
                Some(record) => record.sequence.push_str(line),
                None => {
                    return Err(ProfalnError::Validation(
                        "sequence without name in alignment".to_string(),
                    ))
                }
            }
        }
    }
    if let Some(last) = records.last() {
        if last.sequence.is_empty() {
            return Err(ProfalnError::Validation(format!(
                "alignment missing sequence for {}",
                last.name
            )));
        }
    }
    Ok(records)
}

/// Write one FASTA record, wrapping the sequence at `columns` characters per
/// line (`0` writes the whole sequence on one line).
pub fn write_fasta_record<W: Write>(
    handle: &mut W,
    name: &str,
    sequence: &str,
    columns: usize,
) -> io::Result<()> {
    writeln!(handle, ">{name}")?;
    let width = if columns == 0 { sequence.len().max(1) } else { columns };
    for chunk in sequence.as_bytes().chunks(width) {
        handle.write_all(chunk)?;
        writeln!(handle)?;
    }
    Ok(())
}
