//! Sequence weighting for profile construction.
//!
//! Near-duplicate sequences in a reference alignment would otherwise dominate
//! the per-column statistics, so each sequence is assigned a weight from a
//! guide tree of the alignment: pairwise percent identity is converted to a
//! Kimura protein distance, sequences are clustered by iterative
//! minimum-linkage joining, and ClustalW-style weights are read off the tree
//! (branch length divided by the number of leaves sharing it, summed from
//! leaf to root). Weights are normalized to sum to one.
//!
//! The whole computation is deterministic: ties in the pair selection are
//! broken by the lowest sequence indices.

use crate::alignment::Alignment;

// Distances precalculated by MUSCLE for the band where the Kimura formula
// would take the log of a negative number.
const KIMURA_TABLE: [f64; 181] = [
    1.95, 1.96, 1.97, 1.98, 1.99, 2.00, 2.00, 2.01, 2.02, 2.03,
    2.04, 2.05, 2.06, 2.07, 2.08, 2.09, 2.09, 2.10, 2.11, 2.12,
    2.13, 2.14, 2.15, 2.16, 2.17, 2.18, 2.19, 2.20, 2.21, 2.22,
    2.23, 2.24, 2.26, 2.27, 2.28, 2.29, 2.30, 2.31, 2.32, 2.33,
    2.34, 2.36, 2.37, 2.38, 2.39, 2.40, 2.41, 2.43, 2.44, 2.45,
    2.46, 2.48, 2.49, 2.50, 2.52, 2.53, 2.54, 2.55, 2.57, 2.58,
    2.60, 2.61, 2.62, 2.64, 2.65, 2.67, 2.68, 2.70, 2.71, 2.73,
    2.74, 2.76, 2.77, 2.79, 2.81, 2.82, 2.84, 2.85, 2.87, 2.89,
    2.91, 2.92, 2.94, 2.96, 2.98, 2.99, 3.01, 3.03, 3.05, 3.07,
    3.09, 3.11, 3.13, 3.15, 3.17, 3.19, 3.21, 3.23, 3.25, 3.28,
    3.30, 3.32, 3.35, 3.37, 3.39, 3.42, 3.44, 3.47, 3.49, 3.52,
    3.54, 3.57, 3.60, 3.62, 3.65, 3.68, 3.71, 3.74, 3.77, 3.80,
    3.83, 3.86, 3.89, 3.93, 3.96, 3.99, 4.03, 4.07, 4.10, 4.14,
    4.18, 4.22, 4.26, 4.30, 4.34, 4.38, 4.42, 4.47, 4.51, 4.56,
    4.61, 4.66, 4.71, 4.76, 4.82, 4.87, 4.93, 4.98, 5.04, 5.11,
    5.17, 5.24, 5.31, 5.38, 5.45, 5.53, 5.60, 5.69, 5.77, 5.86,
    5.95, 6.05, 6.15, 6.26, 6.37, 6.49, 6.61, 6.75, 6.88, 7.03,
    7.19, 7.36, 7.54, 7.75, 7.96, 8.19, 8.45, 8.74, 9.07, 9.45,
    9.88,
];

const NO_NODE: usize = usize::MAX;

// Leaf weights below this are treated as degenerate and promoted to 1.
const MIN_RAW_WEIGHT: f64 = 0.0001;

/// Converts a pairwise similarity (identity fraction) into a Kimura protein
/// distance, switching to a lookup table in the range where the closed form
/// is undefined and a flat ceiling beyond it.
pub fn kimura_distance(similarity: f64) -> f64 {
    let diff = 1.0 - similarity;
    if diff < 0.75 {
        return -(1.0 - diff - diff * diff / 5.0).ln();
    }
    if diff > 0.93 {
        return 10.0;
    }
    let index = ((diff - 0.75) * 1000.0 + 0.5).floor() as usize;
    KIMURA_TABLE[index]
}

/// Computes normalized tree weights for every sequence in the alignment,
/// matching the alignment's sequence order.
pub(crate) fn sequence_weights(alignment: &Alignment) -> Vec<f64> {
    let n = alignment.sequence_count();
    if n == 1 {
        return vec![1.0];
    }
    if n == 2 {
        return vec![0.5, 0.5];
    }

    let mut dist = vec![vec![0.0; n]; n];
    for i in 1..n {
        for j in 0..i {
            let d = kimura_distance(alignment.percent_identity(i, j));
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    // leaves are nodes 0..n, every join adds one internal node
    let node_count = 2 * n - 1;
    let mut parent = vec![NO_NODE; node_count];
    let mut parent_length = vec![0.0; node_count];
    let mut height = vec![0.0; node_count];

    let mut cluster_node: Vec<usize> = (0..n).collect();
    let mut active = vec![true; n];

    for step in 0..n - 1 {
        let mut best = (0, 0);
        let mut best_dist = f64::INFINITY;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in i + 1..n {
                if active[j] && dist[i][j] < best_dist {
                    best_dist = dist[i][j];
                    best = (i, j);
                }
            }
        }
        let (i, j) = best;

        let node = n + step;
        let new_height = best_dist / 2.0;
        for child in [cluster_node[i], cluster_node[j]] {
            parent[child] = node;
            parent_length[child] = new_height - height[child];
        }
        height[node] = new_height;

        // minimum linkage with a small averaging component
        for k in 0..n {
            if !active[k] || k == i || k == j {
                continue;
            }
            let joined = 0.1 * ((dist[i][k] + dist[j][k]) / 2.0) + 0.9 * dist[i][k].min(dist[j][k]);
            dist[i][k] = joined;
            dist[k][i] = joined;
        }
        cluster_node[i] = node;
        active[j] = false;
    }

    // children always have lower ids than their parent, so one ascending
    // pass settles the leaf counts
    let mut leaves_under = vec![0usize; node_count];
    for id in 0..node_count {
        if id < n {
            leaves_under[id] = 1;
        }
        if parent[id] != NO_NODE {
            let count = leaves_under[id];
            leaves_under[parent[id]] += count;
        }
    }

    let strength =
        |id: usize| -> f64 { parent_length[id] / leaves_under[id] as f64 };

    let mut weights = Vec::with_capacity(n);
    for leaf in 0..n {
        let mut weight = 0.0;
        let mut node = leaf;
        while parent[node] != NO_NODE {
            weight += strength(node);
            node = parent[node];
        }
        if weight < MIN_RAW_WEIGHT {
            weight = 1.0;
        }
        weights.push(weight);
    }
    normalize(&mut weights);
    weights
}

fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    for value in values.iter_mut() {
        *value /= total;
    }
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

    #[test]
    fn kimura_ranges() {
        assert_eq!(kimura_distance(1.0), 0.0);
        // closed form below the table band
        let d = kimura_distance(0.5);
        assert!((d - -(1.0f64 - 0.5 - 0.05).ln()).abs() < 1e-12);
        // table band boundaries
        assert!((kimura_distance(0.25) - 1.95).abs() < 1e-9);
        assert!((kimura_distance(0.07) - 9.88).abs() < 1e-9);
        // ceiling
        assert_eq!(kimura_distance(0.0), 10.0);
    }

    #[test]
    fn trivial_weight_counts() {
        let single = build(&[("a", "ACDE")]);
        assert_eq!(sequence_weights(&single), vec![1.0]);

        let pair = build(&[("a", "ACDE"), ("b", "ACDF")]);
        assert_eq!(sequence_weights(&pair), vec![0.5, 0.5]);
    }

    #[test]
    fn identical_sequences_share_weight_equally() {
        let alignment = build(&[("a", "ACDE"), ("b", "ACDE"), ("c", "ACDE")]);
        let weights = sequence_weights(&alignment);
        for w in &weights {
            assert!((w - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn near_duplicates_are_downweighted() {
        let alignment = build(&[
            ("s1", "AAAA"),
            ("s2", "AAAA"),
            ("s3", "AAAA"),
            ("t", "WWWW"),
        ]);
        let weights = sequence_weights(&alignment);
        for w in &weights[..3] {
            assert!((w - 1.0 / 6.0).abs() < 1e-9);
        }
        assert!((weights[3] - 0.5).abs() < 1e-9);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
