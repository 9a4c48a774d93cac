//! # profaln
//!
//! Profile alignment of protein sequences, in the manner of MUSCLE's
//! profile-profile mode: new query sequences are inserted into an *existing*
//! reference multiple sequence alignment without disturbing the columns the
//! reference already has.
//!
//! The expensive part of the work is on the reference side: every column of
//! the reference alignment is condensed into a scoring profile (weighted
//! log-odds scores plus gap penalty modifiers). Queries are then aligned
//! against that profile one at a time with an exact affine-gap dynamic
//! program and projected back onto the full alignment, widening it only
//! where a query carries an insertion the reference has never seen.
//!
//! Because many queries are typically inserted into the *same* reference,
//! the realized profile can be written to a cache file and reloaded in later
//! runs, skipping the profile construction entirely. A content fingerprint
//! stored in the cache guarantees a profile is never silently reused against
//! a different alignment.
//!
//! ### Example
//! ```
//! use profaln::{insert_into_alignment, Alignment};
//!
//! let reference = Alignment::from_fasta(">A\nGT-DVG\n>B\nGTK-VG\n").unwrap();
//! let (aligned_query, references) = insert_into_alignment("GTDVG", &reference).unwrap();
//! assert_eq!(aligned_query, "GT-DVG");
//! assert_eq!(references[0], ("A".to_string(), "GT-DVG".to_string()));
//! ```
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod align;
pub mod alignment;
pub mod alphabet;
pub mod cache;
pub mod common;
pub mod matrix;
pub mod profile;
pub mod project;
pub mod weights;

pub use align::{align, AlignmentPath, PathStep};
pub use alignment::{Alignment, AlignmentFingerprint};
pub use cache::{CacheRecord, CACHE_FORMAT, CACHE_VERSION};
pub use common::{parse_fasta, write_fasta_record, FastaRecord, ProfalnError};
pub use profile::{ProfileColumn, SequenceProfile};
pub use project::{combine_alignments, get_aligned_pair, insert_into_alignment, project};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fasta_in_fasta_out() {
        let reference = Alignment::from_fasta(">A\nGT-DVG\n>B\nGTK-VG\n").unwrap();
        let queries = Alignment::from_fasta(">query\nGTIV\n").unwrap();
        let combined = combine_alignments(&reference, &queries).unwrap();
        assert_eq!(
            combined.to_fasta_string(60),
            ">A\nGT-DVG\n>B\nGTK-VG\n>query\nGT--IV\n"
        );
    }

    #[test]
    fn nucleotide_letters_read_as_amino_residues() {
        // DNA input is not scored specially, but A/C/G/T are all residues
        let reference = Alignment::from_fasta(">a\nATG-CA\n>b\nATGGCA\n").unwrap();
        let (aligned, references) = insert_into_alignment("ATGCA", &reference).unwrap();
        assert_eq!(aligned.len(), 6);
        assert_eq!(references.len(), 2);
    }
}
