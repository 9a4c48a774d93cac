//! Positional scoring profile construction.
//!
//! A [`SequenceProfile`] summarizes a reference alignment column by column.
//! Each column carries a log-odds score for every query symbol, gap penalty
//! modifiers derived from the gaps the reference itself contains at that
//! column, and the column's residue occupancy.
//!
//! Building is O(sequences x columns) once the sequence weights are known,
//! and deterministic: the same alignment always produces a bit-identical
//! profile.

use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::alphabet::{
    residue_index, ALPHABET_SIZE, GAP, SYMBOL_COUNT, WILDCARD_B, WILDCARD_X, WILDCARD_Z,
};
use crate::matrix::{odds_matrix, GAP_OPEN, SCORE_CENTER, UNDEFINED_COLUMN_SCORE};

/// Scoring data for a single alignment column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileColumn {
    /// Log-odds match score per query symbol (residues, then `B`/`Z`/`X`).
    pub scores: [f64; SYMBOL_COUNT],
    /// Penalty for opening a gap run at this column. Less negative where the
    /// reference itself opens gaps here.
    pub score_gap_open: f64,
    /// Penalty for closing a gap run at this column.
    pub score_gap_close: f64,
    /// Total weight of sequences with a residue (not a gap) in this column.
    pub occupancy: f64,
}

/// The positional scoring profile of a reference alignment: one
/// [`ProfileColumn`] per alignment column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceProfile {
    columns: Vec<ProfileColumn>,
}

impl SequenceProfile {
    /// Build the profile for an alignment.
    pub fn build(alignment: &Alignment) -> Self {
        let weights = alignment.weights();
        let rows = alignment.rows();
        let odds = odds_matrix();
        let last = alignment.column_count() - 1;

        let d = residue_index(b'D').expect("standard residue");
        let n = residue_index(b'N').expect("standard residue");
        let e = residue_index(b'E').expect("standard residue");
        let q = residue_index(b'Q').expect("standard residue");

        let mut columns = Vec::with_capacity(alignment.column_count());
        for col in 0..=last {
            let (counts, occupancy) = weighted_counts(rows, weights, col);

            // expected substitution odds per query residue, linear domain
            let mut raw = [0.0; ALPHABET_SIZE];
            for (residue, value) in raw.iter_mut().enumerate() {
                *value = counts
                    .iter()
                    .zip(&odds[residue])
                    .map(|(count, odd)| count * odd)
                    .sum();
            }

            let mut scores = [0.0; SYMBOL_COUNT];
            for residue in 0..ALPHABET_SIZE {
                scores[residue] = log_odds(raw[residue], occupancy);
            }
            scores[WILDCARD_B] = log_odds((raw[d] + raw[n]) / 2.0, occupancy);
            scores[WILDCARD_Z] = log_odds((raw[e] + raw[q]) / 2.0, occupancy);
            scores[WILDCARD_X] =
                log_odds(raw.iter().sum::<f64>() / ALPHABET_SIZE as f64, occupancy);

            let open = gap_open_weight(rows, weights, col);
            let close = gap_close_weight(rows, weights, col, last);
            columns.push(ProfileColumn {
                scores,
                score_gap_open: (1.0 - open) * GAP_OPEN / 2.0,
                score_gap_close: (1.0 - close) * GAP_OPEN / 2.0,
                occupancy,
            });
        }
        Self { columns }
    }

    pub(crate) fn from_columns(columns: Vec<ProfileColumn>) -> Self {
        Self { columns }
    }

    /// The number of columns in the profile.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The column records, in alignment order.
    pub fn columns(&self) -> &[ProfileColumn] {
        &self.columns
    }
}

fn log_odds(expectation: f64, occupancy: f64) -> f64 {
    if expectation <= 0.0 {
        UNDEFINED_COLUMN_SCORE
    } else {
        (expectation.ln() - SCORE_CENTER) * occupancy
    }
}

/// Weighted residue counts for one column, normalized by the column's total
/// non-gap weight, plus that total weight (the occupancy). Wildcards spread
/// their weight: `B` over D/N, `Z` over E/Q, `X` over the whole alphabet.
pub(crate) fn weighted_counts(
    rows: &[Vec<u8>],
    weights: &[f64],
    column: usize,
) -> ([f64; ALPHABET_SIZE], f64) {
    let mut counts = [0.0; ALPHABET_SIZE];
    let mut total = 0.0;
    for (row, &weight) in rows.iter().zip(weights) {
        let symbol = row[column];
        if symbol == GAP {
            continue;
        }
        match symbol {
            b'B' => {
                counts[residue_index(b'D').expect("standard residue")] += weight / 2.0;
                counts[residue_index(b'N').expect("standard residue")] += weight / 2.0;
            }
            b'Z' => {
                counts[residue_index(b'E').expect("standard residue")] += weight / 2.0;
                counts[residue_index(b'Q').expect("standard residue")] += weight / 2.0;
            }
            b'X' => {
                let spread = weight / ALPHABET_SIZE as f64;
                for count in counts.iter_mut() {
                    *count += spread;
                }
            }
            _ => {
                counts[residue_index(symbol).expect("rows are validated")] += weight;
            }
        }
        total += weight;
    }
    if total > 0.0 {
        for count in counts.iter_mut() {
            *count /= total;
        }
    }
    (counts, total)
}

/// Total weight of sequences whose gap opens at the column (for the first
/// column, any gap counts as an opening).
pub(crate) fn gap_open_weight(rows: &[Vec<u8>], weights: &[f64], column: usize) -> f64 {
    rows.iter()
        .zip(weights)
        .filter(|(row, _)| row[column] == GAP && (column == 0 || row[column - 1] != GAP))
        .map(|(_, &weight)| weight)
        .sum()
}

/// Total weight of sequences whose gap closes at the column (for the last
/// column, any gap counts as a closing).
pub(crate) fn gap_close_weight(
    rows: &[Vec<u8>],
    weights: &[f64],
    column: usize,
    last: usize,
) -> f64 {
    rows.iter()
        .zip(weights)
        .filter(|(row, _)| row[column] == GAP && (column == last || row[column + 1] != GAP))
        .map(|(_, &weight)| weight)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Alignment;

    fn build(records: &[(&str, &str)]) -> Alignment {
        Alignment::from_records(
            records
                .iter()
                .map(|(n, s)| (n.to_string(), s.to_string())),
        )
        .unwrap()
    }

    fn near(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn counts_spread_wildcards() {
        let alignment = build(&[("A", "BA-"), ("B", "AZX")]);
        let weights = [0.2, 0.8];
        let a = residue_index(b'A').unwrap();
        let d = residue_index(b'D').unwrap();
        let n = residue_index(b'N').unwrap();
        let e = residue_index(b'E').unwrap();
        let q = residue_index(b'Q').unwrap();

        let (counts, occupancy) = weighted_counts(alignment.rows(), &weights, 0);
        assert!(near(occupancy, 1.0));
        assert!(near(counts[a], 0.8));
        assert!(near(counts[d], 0.1));
        assert!(near(counts[n], 0.1));

        let (counts, _) = weighted_counts(alignment.rows(), &weights, 1);
        assert!(near(counts[a], 0.2));
        assert!(near(counts[e], 0.4));
        assert!(near(counts[q], 0.4));

        // the X spreads evenly, the gap contributes nothing
        let (counts, occupancy) = weighted_counts(alignment.rows(), &weights, 2);
        assert!(near(occupancy, 0.8));
        for count in counts {
            assert!(near(count, 0.05));
        }
    }

    #[test]
    fn gap_event_weights_per_column() {
        let alignment = build(&[("a", "-ERF"), ("b", "M-RF"), ("c", "-E--")]);
        let weights = [0.7, 0.2, 0.1];
        let opens: Vec<f64> = (0..4)
            .map(|col| gap_open_weight(alignment.rows(), &weights, col))
            .collect();
        let closes: Vec<f64> = (0..4)
            .map(|col| gap_close_weight(alignment.rows(), &weights, col, 3))
            .collect();
        for (actual, expected) in opens.iter().zip([0.8, 0.2, 0.1, 0.0]) {
            assert!(near(*actual, expected));
        }
        for (actual, expected) in closes.iter().zip([0.8, 0.2, 0.0, 0.1]) {
            assert!(near(*actual, expected));
        }
    }

    #[test]
    fn reference_profile_columns() {
        let alignment = build(&[("A", "GT-DVG"), ("B", "GTK-VG")]);
        let profile = alignment.profile();
        assert_eq!(profile.column_count(), 6);

        let occupancies: Vec<f64> = profile.columns().iter().map(|c| c.occupancy).collect();
        for (actual, expected) in occupancies.iter().zip([1.0, 1.0, 0.5, 0.5, 1.0, 1.0]) {
            assert!(near(*actual, expected));
        }
        for (column, expected) in profile.columns().iter().zip([
            -1.45, -1.45, -0.725, -0.725, -1.45, -1.45,
        ]) {
            assert!(near(column.score_gap_open, expected));
            assert!(near(column.score_gap_close, expected));
        }

        // a fully conserved G column scores (ln 8 - center) for a G query
        let g = residue_index(b'G').unwrap();
        assert!(near(profile.columns()[0].scores[g], 8f64.ln() - 0.52));
        // half occupancy halves the log-odds of the conserved D column
        let d = residue_index(b'D').unwrap();
        assert!(near(
            profile.columns()[3].scores[d],
            (8f64.ln() - 0.52) / 2.0
        ));
        // B against a conserved D column averages the D and N expectations
        let n = residue_index(b'N').unwrap();
        let odds = odds_matrix();
        let expected = (((odds[d][d] + odds[n][d]) / 2.0).ln() - 0.52) / 2.0;
        assert!(near(profile.columns()[3].scores[WILDCARD_B], expected));
    }

    #[test]
    fn all_gap_column_scores_fall_back() {
        let alignment = build(&[("A", "A-C"), ("B", "C-A")]);
        let column = &alignment.profile().columns()[1];
        assert!(near(column.occupancy, 0.0));
        assert!(near(column.score_gap_open, 0.0));
        for score in column.scores {
            assert_eq!(score, UNDEFINED_COLUMN_SCORE);
        }
    }

    #[test]
    fn building_is_deterministic() {
        let first = build(&[("A", "GT-DVG"), ("B", "GTK-VG")]);
        let second = build(&[("A", "GT-DVG"), ("B", "GTK-VG")]);
        assert_eq!(first.profile(), second.profile());
    }
}
