//! Projection of alignment paths back onto the reference alignment, and the
//! public combining operations built on top of the aligner.
//!
//! Match and query-gap steps reuse existing reference columns. Reference-gap
//! steps widen the alignment: a new column is created holding the query
//! residue, with a gap in every reference sequence. Consecutive reference
//! gaps form one contiguous block. When several queries are combined, each is
//! aligned independently against the same reference profile; insertions from
//! different queries at the same reference boundary get their own columns, in
//! query order, and are never merged.

use crate::align::{align, align_symbols, normalize_query, residue_symbols, AlignmentPath, PathStep};
use crate::alignment::Alignment;
use crate::alphabet::GAP;
use crate::common::ProfalnError;

/// A query rendered against the reference coordinate system: one character
/// per reference column plus the residues inserted at each column boundary.
struct ProjectedQuery {
    column_chars: Vec<u8>,
    boundary_inserts: Vec<Vec<u8>>,
}

fn project_query(
    path: &AlignmentPath,
    residues: &[u8],
    width: usize,
) -> Result<ProjectedQuery, ProfalnError> {
    if path.query_length() != residues.len() || path.reference_length() != width {
        return Err(ProfalnError::Validation(format!(
            "path covers {} residues over {} columns, expected {} over {}",
            path.query_length(),
            path.reference_length(),
            residues.len(),
            width,
        )));
    }
    let mut column_chars = Vec::with_capacity(width);
    let mut boundary_inserts = vec![Vec::new(); width + 1];
    let mut residue = residues.iter();
    for step in &path.steps {
        match step {
            PathStep::Match => {
                column_chars.push(*residue.next().expect("path length checked"));
            }
            PathStep::QueryGap => column_chars.push(GAP),
            PathStep::ReferenceGap => {
                boundary_inserts[column_chars.len()]
                    .push(*residue.next().expect("path length checked"));
            }
        }
    }
    Ok(ProjectedQuery {
        column_chars,
        boundary_inserts,
    })
}

fn render_reference_row(row: &[u8], projected: &[ProjectedQuery], width: usize) -> String {
    let mut out = Vec::with_capacity(width);
    for boundary in 0..=width {
        for query in projected {
            out.extend(std::iter::repeat(GAP).take(query.boundary_inserts[boundary].len()));
        }
        if boundary < width {
            out.push(row[boundary]);
        }
    }
    String::from_utf8(out).expect("rows are ascii")
}

fn render_query_row(own: usize, projected: &[ProjectedQuery], width: usize) -> String {
    let mut out = Vec::with_capacity(width);
    for boundary in 0..=width {
        for (index, query) in projected.iter().enumerate() {
            if index == own {
                out.extend_from_slice(&query.boundary_inserts[boundary]);
            } else {
                out.extend(std::iter::repeat(GAP).take(query.boundary_inserts[boundary].len()));
            }
        }
        if boundary < width {
            out.push(projected[own].column_chars[boundary]);
        }
    }
    String::from_utf8(out).expect("rows are ascii")
}

/// Merge one alignment path back onto the reference alignment.
///
/// Returns the aligned query and every reference sequence re-rendered in the
/// (possibly widened) combined coordinate system.
pub fn project(
    path: &AlignmentPath,
    query: &str,
    reference: &Alignment,
) -> Result<(String, Vec<(String, String)>), ProfalnError> {
    let residues = normalize_query(query)?;
    let projected = [project_query(path, &residues, reference.column_count())?];
    let aligned_query = render_query_row(0, &projected, reference.column_count());
    let references = reference
        .names()
        .iter()
        .zip(reference.rows())
        .map(|(name, row)| {
            (
                name.clone(),
                render_reference_row(row, &projected, reference.column_count()),
            )
        })
        .collect();
    Ok((aligned_query, references))
}

/// Align every sequence of `queries` against the profile of `reference` and
/// merge the results into one combined alignment.
///
/// The result keeps the reference sequences first, in their original column
/// order, followed by the query sequences.
///
/// ## Examples
/// ```
/// use profaln::{combine_alignments, Alignment};
/// let reference = Alignment::from_fasta(">A\nGT-DVG\n>B\nGTK-VG\n").unwrap();
/// let queries = Alignment::from_fasta(">query\nGTDVG\n").unwrap();
/// let combined = combine_alignments(&reference, &queries).unwrap();
/// assert_eq!(combined.get_sequence("query").unwrap(), "GT-DVG");
/// assert_eq!(combined.column_count(), 6);
/// ```
pub fn combine_alignments(
    reference: &Alignment,
    queries: &Alignment,
) -> Result<Alignment, ProfalnError> {
    for name in queries.names() {
        if reference.name_index(name).is_some() {
            return Err(ProfalnError::Validation(format!(
                "sequence name appears in both query and reference: {name}"
            )));
        }
    }
    let profile = reference.profile();
    let width = reference.column_count();

    let mut projected = Vec::with_capacity(queries.sequence_count());
    for row in queries.rows() {
        let residues: Vec<u8> = row.iter().copied().filter(|&b| b != GAP).collect();
        let path = align_symbols(&residue_symbols(row), profile)?;
        projected.push(project_query(&path, &residues, width)?);
    }

    let mut records = Vec::with_capacity(reference.sequence_count() + queries.sequence_count());
    for (name, row) in reference.names().iter().zip(reference.rows()) {
        records.push((name.clone(), render_reference_row(row, &projected, width)));
    }
    for (index, name) in queries.names().iter().enumerate() {
        records.push((name.clone(), render_query_row(index, &projected, width)));
    }
    Alignment::from_records(records)
}

/// Insert a single query sequence into an existing alignment.
///
/// Returns the aligned query and the full set of (re-)aligned reference
/// sequences, in reference order.
pub fn insert_into_alignment(
    query_sequence: &str,
    alignment: &Alignment,
) -> Result<(String, Vec<(String, String)>), ProfalnError> {
    let path = align(query_sequence, alignment.profile())?;
    project(&path, query_sequence, alignment)
}

/// Insert a query sequence into an alignment and return only the aligned
/// query and the aligned sequence of the named reference.
pub fn get_aligned_pair(
    query_sequence: &str,
    reference_name: &str,
    alignment: &Alignment,
) -> Result<(String, String), ProfalnError> {
    let index = alignment.name_index(reference_name).ok_or_else(|| {
        ProfalnError::Validation(format!(
            "reference of interest not in reference alignment: {reference_name}"
        ))
    })?;
    let residues = normalize_query(query_sequence)?;
    let path = align_symbols(&residue_symbols(&residues), alignment.profile())?;
    let projected = [project_query(&path, &residues, alignment.column_count())?];
    let aligned_query = render_query_row(0, &projected, alignment.column_count());
    let aligned_reference =
        render_reference_row(&alignment.rows()[index], &projected, alignment.column_count());
    Ok((aligned_query, aligned_reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> Alignment {
        Alignment::from_fasta(">A\nGT-DVG\n>B\nGTK-VG\n").unwrap()
    }

    fn queries(records: &[(&str, &str)]) -> Alignment {
        Alignment::from_records(
            records
                .iter()
                .map(|(n, s)| (n.to_string(), s.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn insertion_without_indels_keeps_width() {
        let reference = reference();
        let (aligned_query, references) =
            insert_into_alignment("GTDVG", &reference).unwrap();
        assert_eq!(aligned_query, "GT-DVG");
        assert_eq!(
            references,
            vec![
                ("A".to_string(), "GT-DVG".to_string()),
                ("B".to_string(), "GTK-VG".to_string()),
            ]
        );
    }

    #[test]
    fn short_query_is_gapped_into_place() {
        let reference = reference();
        let (aligned_query, references) = insert_into_alignment("GTIV", &reference).unwrap();
        assert_eq!(aligned_query, "GT--IV");
        assert_eq!(references[0].1, "GT-DVG");
        assert_eq!(references[1].1, "GTK-VG");
    }

    #[test]
    fn combine_keeps_reference_columns_in_order() {
        let reference = reference();
        let combined = combine_alignments(&reference, &queries(&[("query", "GTIV")])).unwrap();
        assert_eq!(
            combined.to_records(),
            vec![
                ("A".to_string(), "GT-DVG".to_string()),
                ("B".to_string(), "GTK-VG".to_string()),
                ("query".to_string(), "GT--IV".to_string()),
            ]
        );
    }

    #[test]
    fn each_insertion_gets_its_own_columns() {
        let reference = reference();
        let combined = combine_alignments(
            &reference,
            &queries(&[("q1", "GTDKVGW"), ("q2", "GTDKVGW")]),
        )
        .unwrap();
        assert_eq!(combined.column_count(), 8);
        assert_eq!(
            combined.to_records(),
            vec![
                ("A".to_string(), "GT-DVG--".to_string()),
                ("B".to_string(), "GTK-VG--".to_string()),
                ("q1".to_string(), "GTDKVGW-".to_string()),
                ("q2".to_string(), "GTDKVG-W".to_string()),
            ]
        );
    }

    #[test]
    fn combined_width_is_consistent() {
        let reference = reference();
        let combined = combine_alignments(
            &reference,
            &queries(&[("q1", "GTDKVGW"), ("q2", "GTIV")]),
        )
        .unwrap();
        let records = combined.to_records();
        for (_, sequence) in &records {
            assert_eq!(sequence.len(), combined.column_count());
        }
        // original reference columns survive in relative order
        let reference_row: String = records[0].1.chars().filter(|&c| c != '-').collect();
        assert_eq!(reference_row, "GTDVG");
    }

    #[test]
    fn name_collisions_are_rejected() {
        let reference = reference();
        let err = combine_alignments(&reference, &queries(&[("A", "GTDVG")])).unwrap_err();
        assert!(matches!(err, ProfalnError::Validation(msg) if msg.contains("both")));
    }

    #[test]
    fn aligned_pair_extracts_named_reference() {
        let reference = reference();
        let (aligned_query, aligned_reference) =
            get_aligned_pair("GTDVG", "B", &reference).unwrap();
        assert_eq!(aligned_query, "GT-DVG");
        assert_eq!(aligned_reference, "GTK-VG");

        let err = get_aligned_pair("GTDVG", "missing", &reference).unwrap_err();
        assert!(matches!(
            err,
            ProfalnError::Validation(msg) if msg.contains("not in reference alignment")
        ));
    }

    #[test]
    fn mismatched_path_is_rejected() {
        let reference = reference();
        let path = align("GTDVG", reference.profile()).unwrap();
        let err = project(&path, "GT", &reference).unwrap_err();
        assert!(matches!(err, ProfalnError::Validation(_)));
    }
}
