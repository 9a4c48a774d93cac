//! The multiple sequence alignment data model.
//!
//! An [`Alignment`] is an ordered mapping from sequence name to an aligned
//! (gapped) sequence, validated on construction: at least one sequence,
//! unique names, equal lengths, and only supported protein characters.
//! Input is normalized to uppercase with `-` as the canonical gap.
//!
//! Sequence weights and the positional scoring profile are computed lazily on
//! first use and cached inside the alignment. Once built they are never
//! mutated, so a shared reference can serve any number of concurrent
//! alignments against the same profile.

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

use crate::alphabet::{is_gap_char, symbol_index, GAP};
use crate::common::{parse_fasta, write_fasta_record, ProfalnError};
use crate::profile::SequenceProfile;
use crate::weights::sequence_weights;

/// Identity token for an alignment, used to verify that a persisted profile
/// belongs to the alignment it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentFingerprint {
    /// Number of sequences in the alignment.
    pub sequence_count: usize,
    /// Number of columns in the alignment.
    pub column_count: usize,
    /// Hash over the sequence names and residue content, in order.
    pub digest: u64,
}

/// A validated multiple sequence alignment.
#[derive(Debug)]
pub struct Alignment {
    names: Vec<String>,
    rows: Vec<Vec<u8>>,
    columns: usize,
    weights: OnceLock<Vec<f64>>,
    profile: OnceLock<SequenceProfile>,
}

impl Alignment {
    /// Construct an alignment from ordered `(name, sequence)` pairs.
    ///
    /// Sequences are uppercased and `.` gaps rewritten to `-`. Characters
    /// outside the protein alphabet (residues, `B`/`Z`/`X`, gaps) are
    /// rejected.
    pub fn from_records<I>(records: I) -> Result<Self, ProfalnError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut names = Vec::new();
        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for (name, sequence) in records {
            if !seen.insert(name.clone()) {
                return Err(ProfalnError::Validation(format!(
                    "duplicate sequence name: {name}"
                )));
            }
            rows.push(normalize_row(&name, &sequence)?);
            names.push(name);
        }
        if names.is_empty() {
            return Err(ProfalnError::Validation(
                "at least one sequence must be provided".to_string(),
            ));
        }
        let columns = rows[0].len();
        if rows.iter().any(|row| row.len() != columns) {
            return Err(ProfalnError::Validation(
                "alignment sequences not of consistent length".to_string(),
            ));
        }
        if columns == 0 {
            return Err(ProfalnError::Validation(
                "alignment sequences must not be empty".to_string(),
            ));
        }
        Ok(Self {
            names,
            rows,
            columns,
            weights: OnceLock::new(),
            profile: OnceLock::new(),
        })
    }

    /// Construct an alignment from FASTA text.
    ///
    /// ## Examples
    /// ```
    /// use profaln::Alignment;
    /// let alignment = Alignment::from_fasta(">A\nGT-DVG\n>B\nGTK-VG\n").unwrap();
    /// assert_eq!(alignment.sequence_count(), 2);
    /// assert_eq!(alignment.column_count(), 6);
    /// ```
    pub fn from_fasta(text: &str) -> Result<Self, ProfalnError> {
        let records = parse_fasta(text)?;
        Self::from_records(records.into_iter().map(|r| (r.name, r.sequence)))
    }

    /// The number of sequences in the alignment.
    pub fn sequence_count(&self) -> usize {
        self.rows.len()
    }

    /// The number of columns (the length of every aligned sequence).
    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// The sequence names, in input order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The aligned sequence with the given name, if present.
    pub fn get_sequence(&self, name: &str) -> Option<String> {
        self.name_index(name).map(|i| self.sequence_string(i))
    }

    /// Ordered `(name, sequence)` pairs for every sequence.
    pub fn to_records(&self) -> Vec<(String, String)> {
        self.names
            .iter()
            .cloned()
            .zip((0..self.rows.len()).map(|i| self.sequence_string(i)))
            .collect()
    }

    pub(crate) fn name_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub(crate) fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub(crate) fn sequence_string(&self, index: usize) -> String {
        String::from_utf8(self.rows[index].clone()).expect("rows are ascii")
    }

    /// Fraction of columns where two sequences carry the same residue,
    /// counting only columns where neither has a gap.
    pub(crate) fn percent_identity(&self, first: usize, second: usize) -> f64 {
        let mut count = 0usize;
        let mut same = 0usize;
        for (&a, &b) in self.rows[first].iter().zip(&self.rows[second]) {
            if a != GAP && b != GAP {
                count += 1;
                if a == b {
                    same += 1;
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            same as f64 / count as f64
        }
    }

    /// The per-sequence tree weights, computed on first use.
    pub fn weights(&self) -> &[f64] {
        self.weights.get_or_init(|| sequence_weights(self))
    }

    /// The positional scoring profile, computed on first use and shared
    /// read-only afterwards.
    pub fn profile(&self) -> &SequenceProfile {
        self.profile.get_or_init(|| SequenceProfile::build(self))
    }

    /// Returns the already-attached or already-computed profile, if any.
    pub fn profile_if_built(&self) -> Option<&SequenceProfile> {
        self.profile.get()
    }

    pub(crate) fn install_weights(&self, weights: Vec<f64>) {
        // weights are a pure function of the content, so a previously
        // computed value is interchangeable
        let _ = self.weights.set(weights);
    }

    pub(crate) fn install_profile(&self, profile: SequenceProfile) -> Result<(), ProfalnError> {
        self.profile.set(profile).map_err(|_| {
            ProfalnError::Validation("alignment already has a profile attached".to_string())
        })
    }

    /// The identity fingerprint over names and residue content.
    pub fn fingerprint(&self) -> AlignmentFingerprint {
        let mut hasher = Xxh64::new(0);
        for (name, row) in self.names.iter().zip(&self.rows) {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
            hasher.update(row);
            hasher.update(b"\n");
        }
        AlignmentFingerprint {
            sequence_count: self.rows.len(),
            column_count: self.columns,
            digest: hasher.digest(),
        }
    }

    /// Write the alignment as FASTA, wrapping sequence lines at `columns`
    /// characters (`0` disables wrapping).
    pub fn write_fasta<W: Write>(&self, handle: &mut W, columns: usize) -> io::Result<()> {
        for (i, name) in self.names.iter().enumerate() {
            write_fasta_record(handle, name, &self.sequence_string(i), columns)?;
        }
        Ok(())
    }

    /// The alignment rendered as FASTA text.
    pub fn to_fasta_string(&self, columns: usize) -> String {
        let mut out = Vec::new();
        self.write_fasta(&mut out, columns)
            .expect("writing to a vec cannot fail");
        String::from_utf8(out).expect("rows are ascii")
    }
}

impl PartialEq for Alignment {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names && self.rows == other.rows
    }
}

fn normalize_row(name: &str, sequence: &str) -> Result<Vec<u8>, ProfalnError> {
    let mut row = Vec::with_capacity(sequence.len());
    for ch in sequence.chars() {
        let upper = ch.to_ascii_uppercase();
        let byte = if upper.is_ascii() { upper as u8 } else { 0 };
        if is_gap_char(byte) {
            row.push(GAP);
        } else if symbol_index(byte).is_some() {
            row.push(byte);
        } else {
            return Err(ProfalnError::UnsupportedResidue {
                residue: ch,
                name: name.to_string(),
            });
        }
    }
    Ok(row)
}
