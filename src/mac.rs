//! Modal assurance criterion: normalized shape correlation between
//! eigenvectors, invariant to sign and scale.

use nalgebra::{DMatrix, DVector};

/// MAC score between two mode shapes: (a.b)^2 / ((a.a)(b.b)), in [0, 1].
///
/// Returns 0.0 when either vector has zero norm. Callers are responsible
/// for matching lengths; the tracker enforces this before scoring.
pub fn mac(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    let dot = a.dot(b);
    let denom = a.norm_squared() * b.norm_squared();
    if denom <= 0.0 {
        return 0.0;
    }
    (dot * dot / denom).min(1.0)
}

/// Pairwise MAC scores: rows index reference shapes (open series), columns
/// index the raw shapes of the current step.
pub fn mac_matrix(references: &[&DVector<f64>], raws: &[DVector<f64>]) -> DMatrix<f64> {
    DMatrix::from_fn(references.len(), raws.len(), |i, j| {
        mac(references[i], &raws[j])
    })
}
