//! Bipartite assignment between open mode series and the raw eigenpairs of
//! one sweep step.
//!
//! Kept separate from the tracker so the similarity computation, threshold
//! policy, and assignment algorithm stay independently testable. Both
//! policies produce a one-to-one partial matching and are deterministic for
//! identical inputs.

use nalgebra::DMatrix;

use crate::types::MatchingPolicy;

/// Inputs of one matching step. `scores` and `eigen_distance` are both
/// series-by-raw; `eigen_distance` holds |lambda_raw - lambda_series| and is
/// consulted only to break similarity ties.
pub struct MatchProblem<'a> {
    /// Pairwise MAC scores, series rows by raw columns.
    pub scores: &'a DMatrix<f64>,
    /// Pairwise eigenvalue distances, same layout.
    pub eigen_distance: &'a DMatrix<f64>,
    /// Minimum similarity tau for an acceptable match.
    pub threshold: f64,
    /// Scores closer than this count as tied.
    pub tie_tol: f64,
}

/// For each raw column, the matched series row (if any).
pub type Assignment = Vec<Option<usize>>;

/// Match raw eigenpairs to series rows under the given policy.
pub fn match_modes(policy: MatchingPolicy, problem: &MatchProblem<'_>) -> Assignment {
    match policy {
        MatchingPolicy::Greedy => greedy(problem),
        MatchingPolicy::Optimal => optimal(problem),
    }
}

/// Greedy matching: repeatedly take the best remaining (series, raw) pair at
/// or above tau. Candidate order quantizes scores to `tie_tol` buckets so
/// that tied scores fall back to eigenvalue distance, then to indices.
pub fn greedy(problem: &MatchProblem<'_>) -> Assignment {
    let scores = problem.scores;
    let (num_series, num_raw) = scores.shape();

    let mut candidates: Vec<(i64, f64, usize, usize)> = Vec::new();
    for series in 0..num_series {
        for raw in 0..num_raw {
            let score = scores[(series, raw)];
            if score >= problem.threshold {
                let bucket = (score / problem.tie_tol).round() as i64;
                candidates.push((bucket, problem.eigen_distance[(series, raw)], series, raw));
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.cmp(&b.2))
            .then(a.3.cmp(&b.3))
    });

    let mut assignment: Assignment = vec![None; num_raw];
    let mut series_taken = vec![false; num_series];
    for (_, _, series, raw) in candidates {
        if assignment[raw].is_none() && !series_taken[series] {
            assignment[raw] = Some(series);
            series_taken[series] = true;
        }
    }
    assignment
}

/// Globally optimal maximum-weight matching (Kuhn-Munkres with potentials).
///
/// Sub-threshold pairs are inadmissible up front rather than filtered after
/// the solve, so the matching never spends a series on a pairing it cannot
/// keep. The eigenvalue distance enters as a perturbation strictly smaller
/// than the tie quantum, deciding ties without disturbing the optimum.
pub fn optimal(problem: &MatchProblem<'_>) -> Assignment {
    let scores = problem.scores;
    let (num_series, num_raw) = scores.shape();
    if num_series == 0 || num_raw == 0 {
        return vec![None; num_raw];
    }

    // Pad to a square of side rows+cols so every row and column can fall
    // back to an unmatched (zero-cost) slot.
    let n = num_series + num_raw;
    let mut cost = vec![vec![0.0f64; n]; n];
    for series in 0..num_series {
        for raw in 0..num_raw {
            let score = scores[(series, raw)];
            if score >= problem.threshold {
                let dist = problem.eigen_distance[(series, raw)];
                let perturb = 0.5 * problem.tie_tol * (dist / (1.0 + dist));
                cost[series][raw] = -(score - perturb);
            }
        }
    }

    let assigned_rows = hungarian_min_cost(&cost);

    let mut assignment: Assignment = vec![None; num_raw];
    for (raw, slot) in assignment.iter_mut().enumerate() {
        let series = assigned_rows[raw];
        if series < num_series && scores[(series, raw)] >= problem.threshold {
            *slot = Some(series);
        }
    }
    assignment
}

/// Minimum-cost perfect matching on a square cost matrix; returns the row
/// assigned to each column.
fn hungarian_min_cost(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    // 1-indexed potentials over rows (u) and columns (v); p[j] is the row
    // currently matched to column j, with column 0 as the staging slot.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    (1..=n).map(|j| p[j] - 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAC_TIE_TOL;

    fn problem<'a>(
        scores: &'a DMatrix<f64>,
        distance: &'a DMatrix<f64>,
        threshold: f64,
    ) -> MatchProblem<'a> {
        MatchProblem {
            scores,
            eigen_distance: distance,
            threshold,
            tie_tol: MAC_TIE_TOL,
        }
    }

    #[test]
    fn greedy_prefers_highest_score() {
        let scores = DMatrix::from_row_slice(2, 2, &[0.95, 0.3, 0.2, 0.9]);
        let distance = DMatrix::zeros(2, 2);
        let assignment = greedy(&problem(&scores, &distance, 0.8));
        assert_eq!(assignment, vec![Some(0), Some(1)]);
    }

    #[test]
    fn threshold_leaves_raws_unmatched() {
        let scores = DMatrix::from_row_slice(1, 2, &[0.5, 0.79]);
        let distance = DMatrix::zeros(1, 2);
        for policy in [MatchingPolicy::Greedy, MatchingPolicy::Optimal] {
            let assignment = match_modes(policy, &problem(&scores, &distance, 0.8));
            assert_eq!(assignment, vec![None, None]);
        }
    }

    #[test]
    fn tied_scores_break_on_eigenvalue_distance() {
        // Both raws score identically against the single series; the raw
        // whose eigenvalue is closer must win under either policy.
        let scores = DMatrix::from_row_slice(1, 2, &[0.9, 0.9]);
        let distance = DMatrix::from_row_slice(1, 2, &[5.0, 0.5]);
        for policy in [MatchingPolicy::Greedy, MatchingPolicy::Optimal] {
            let assignment = match_modes(policy, &problem(&scores, &distance, 0.8));
            assert_eq!(assignment, vec![None, Some(0)], "policy {policy:?}");
        }
    }

    #[test]
    fn optimal_resolves_crossing_that_defeats_greedy() {
        // Greedy takes (A, raw0) at 0.9 and leaves B with only a 0.2 score,
        // losing a series. The optimal matching keeps both above threshold.
        let scores = DMatrix::from_row_slice(2, 2, &[0.9, 0.85, 0.8, 0.2]);
        let distance = DMatrix::zeros(2, 2);
        let p = problem(&scores, &distance, 0.5);

        let greedy_result = greedy(&p);
        assert_eq!(greedy_result, vec![Some(0), None]);

        let optimal_result = optimal(&p);
        assert_eq!(optimal_result, vec![Some(1), Some(0)]);
    }

    #[test]
    fn rectangular_shapes_are_partial_matchings() {
        // More raws than series: exactly one raw per series is matched.
        let scores = DMatrix::from_row_slice(1, 3, &[0.9, 0.95, 0.85]);
        let distance = DMatrix::zeros(1, 3);
        let assignment = optimal(&problem(&scores, &distance, 0.8));
        assert_eq!(assignment.iter().flatten().count(), 1);
        assert_eq!(assignment[1], Some(0));

        // More series than raws: the raw goes to the best series.
        let scores = DMatrix::from_row_slice(3, 1, &[0.85, 0.99, 0.9]);
        let distance = DMatrix::zeros(3, 1);
        let assignment = optimal(&problem(&scores, &distance, 0.8));
        assert_eq!(assignment, vec![Some(1)]);
    }

    #[test]
    fn empty_inputs_yield_empty_assignments() {
        let scores = DMatrix::zeros(0, 2);
        let distance = DMatrix::zeros(0, 2);
        let assignment = optimal(&problem(&scores, &distance, 0.8));
        assert_eq!(assignment, vec![None, None]);
        let assignment = greedy(&problem(&scores, &distance, 0.8));
        assert_eq!(assignment, vec![None, None]);
    }
}
