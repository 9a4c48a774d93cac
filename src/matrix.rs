//! Substitution scoring model: the BLOSUM62 table, the derived linear-domain
//! odds matrix used for profile column scoring, and the gap penalty constants.
//!
//! Profile columns are scored in the log-expectation style of MUSCLE's
//! profile-profile mode: per-column residue expectations are accumulated in
//! the linear (odds) domain and converted to log-odds only once the weighted
//! expectation for a column is known. The odds matrix is derived from the
//! half-bit BLOSUM62 scores as `2^(score / 2)`.

use std::sync::OnceLock;

use crate::alphabet::ALPHABET_SIZE;

/// Gap opening penalty, charged as two halves: one where a gap run opens and
/// one where it closes.
pub const GAP_OPEN: f64 = -2.9;

/// Gap extension penalty per additional gapped position in a run.
pub const GAP_EXTEND: f64 = -0.2;

/// Centering constant subtracted from log-expectation scores.
pub const SCORE_CENTER: f64 = 0.52;

/// Fallback score for a column with no residue observations (all gaps).
pub const UNDEFINED_COLUMN_SCORE: f64 = -2.5;

// Fixed 20x20 BLOSUM62 table in the classic matrix residue order
// (A,R,N,D,C,Q,E,G,H,I,L,K,M,F,P,S,T,W,Y,V).
const BLOSUM62: [[i32; 20]; 20] = [
    [ 4,-1,-2,-2, 0,-1,-1, 0,-2,-1,-1,-1,-1,-2,-1, 1, 0,-3,-2, 0], // A
    [-1, 5, 0,-2,-3, 1, 0,-2, 0,-3,-2, 2,-1,-3,-2,-1,-1,-3,-2,-3], // R
    [-2, 0, 6, 1,-3, 0, 0, 0, 1,-3,-3, 0,-2,-3,-2, 1, 0,-4,-2,-3], // N
    [-2,-2, 1, 6,-3, 0, 2,-1,-1,-3,-4,-1,-3,-3,-1, 0,-1,-4,-3,-3], // D
    [ 0,-3,-3,-3, 9,-3,-4,-3,-3,-1,-1,-3,-1,-2,-3,-1,-1,-2,-2,-1], // C
    [-1, 1, 0, 0,-3, 5, 2,-2, 0,-3,-2, 1, 0,-3,-1, 0,-1,-2,-1,-2], // Q
    [-1, 0, 0, 2,-4, 2, 5,-2, 0,-3,-3, 1,-2,-3,-1, 0,-1,-3,-2,-2], // E
    [ 0,-2, 0,-1,-3,-2,-2, 6,-2,-4,-4,-2,-3,-3,-2, 0,-2,-2,-3,-3], // G
    [-2, 0, 1,-1,-3, 0, 0,-2, 8,-3,-3,-1,-2,-1,-2,-1,-2,-2, 2,-3], // H
    [-1,-3,-3,-3,-1,-3,-3,-4,-3, 4, 2,-3, 1, 0,-3,-2,-1,-3,-1, 3], // I
    [-1,-2,-3,-4,-1,-2,-3,-4,-3, 2, 4,-2, 2, 0,-3,-2,-1,-2,-1, 1], // L
    [-1, 2, 0,-1,-3, 1, 1,-2,-1,-3,-2, 5,-1,-3,-1, 0,-1,-3,-2,-2], // K
    [-1,-1,-2,-3,-1, 0,-2,-3,-2, 1, 2,-1, 5, 0,-2,-1,-1,-1,-1, 1], // M
    [-2,-3,-3,-3,-2,-3,-3,-3,-1, 0, 0,-3, 0, 6,-4,-2,-2, 1, 3,-1], // F
    [-1,-2,-2,-1,-3,-1,-1,-2,-2,-3,-3,-1,-2,-4, 7,-1,-1,-4,-3,-2], // P
    [ 1,-1, 1, 0,-1, 0, 0, 0,-1,-2,-2, 0,-1,-2,-1, 4, 1,-3,-2,-2], // S
    [ 0,-1, 0,-1,-1,-1,-1,-2,-2,-1,-1,-1,-1,-2,-1, 1, 5,-2,-2, 0], // T
    [-3,-3,-4,-4,-2,-2,-3,-2,-2,-3,-2,-3,-1, 1,-4,-3,-2,11, 2,-3], // W
    [-2,-2,-2,-3,-2,-1,-2,-3, 2,-1,-1,-2,-1, 3,-3,-2,-2, 2, 7,-1], // Y
    [ 0,-3,-3,-3,-1,-2,-2,-3,-3, 3, 1,-2, 1,-1,-2,-2, 0,-3,-1, 4], // V
];

// Position of each alphabetically-indexed residue (A,C,D,E,...) in the
// BLOSUM62 row order above.
const ALPHABETICAL_IN_BLOSUM: [usize; ALPHABET_SIZE] = [
    0,  // A
    4,  // C
    3,  // D
    6,  // E
    13, // F
    7,  // G
    8,  // H
    9,  // I
    11, // K
    10, // L
    12, // M
    2,  // N
    14, // P
    5,  // Q
    1,  // R
    15, // S
    16, // T
    19, // V
    17, // W
    18, // Y
];

/// Return the BLOSUM62 score for two alphabetically-indexed residues.
pub fn blosum62_score(first: usize, second: usize) -> i32 {
    BLOSUM62[ALPHABETICAL_IN_BLOSUM[first]][ALPHABETICAL_IN_BLOSUM[second]]
}

/// The substitution odds matrix, indexed alphabetically on both axes.
///
/// Entry `[i][j]` is `2^(blosum62(i, j) / 2)`, i.e. the half-bit log-odds
/// score mapped back to a probability ratio, so that weighted sums over a
/// column stay in the linear domain until the final log is taken.
pub fn odds_matrix() -> &'static [[f64; ALPHABET_SIZE]; ALPHABET_SIZE] {
    static ODDS: OnceLock<[[f64; ALPHABET_SIZE]; ALPHABET_SIZE]> = OnceLock::new();
    ODDS.get_or_init(|| {
        let mut odds = [[0.0; ALPHABET_SIZE]; ALPHABET_SIZE];
        for (i, row) in odds.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = 2f64.powf(blosum62_score(i, j) as f64 / 2.0);
            }
        }
        odds
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::residue_index;

    #[test]
    fn blosum_is_symmetric() {
        for i in 0..ALPHABET_SIZE {
            for j in 0..ALPHABET_SIZE {
                assert_eq!(blosum62_score(i, j), blosum62_score(j, i));
            }
        }
    }

    #[test]
    fn blosum_known_values() {
        let w = residue_index(b'W').unwrap();
        let g = residue_index(b'G').unwrap();
        let t = residue_index(b'T').unwrap();
        assert_eq!(blosum62_score(w, w), 11);
        assert_eq!(blosum62_score(g, g), 6);
        assert_eq!(blosum62_score(t, t), 5);
        assert_eq!(blosum62_score(g, t), -2);
    }

    #[test]
    fn odds_favour_identity() {
        let odds = odds_matrix();
        for i in 0..ALPHABET_SIZE {
            for j in 0..ALPHABET_SIZE {
                assert!(odds[i][j] > 0.0);
                if i != j {
                    assert!(odds[i][i] > odds[i][j]);
                }
            }
        }
        let g = residue_index(b'G').unwrap();
        assert!((odds[g][g] - 8.0).abs() < 1e-12);
    }
}
