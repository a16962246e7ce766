//! Eigensolver boundary and the built-in finite-strip backend.
//!
//! The tracker only depends on the [`Eigensolver`] trait: (model, parameter)
//! -> ordered eigenpairs. [`FsmEigensolver`] is the shipped implementation;
//! it assembles one block per longitudinal half-wave and solves each dense
//! generalized symmetric problem by Cholesky reduction.

use nalgebra::linalg::SymmetricEigen;
use nalgebra::{DMatrix, DVector};

use crate::error::{AnalysisError, Result};
use crate::model::Model;
use crate::strip::{assemble_half_wave, constrained_dofs};
use crate::types::{AnalysisKind, DEFAULT_HALF_WAVES, LAMBDA_TOL};

/// One eigenvalue/eigenvector pair as returned by a solver at a single
/// parameter value. Eigenvectors span the concatenated half-wave blocks so
/// that shapes from different half-waves remain comparable across steps.
#[derive(Debug, Clone)]
pub struct RawEigenpair {
    /// Eigenvalue: omega^2 for free vibration, sigma_cr for buckling.
    pub value: f64,
    /// Eigenvector over the full DOF layout.
    pub vector: DVector<f64>,
}

/// External eigensolver boundary.
///
/// Implementations must return eigenpairs sorted ascending by eigenvalue,
/// all with the same vector length for a given model, and fail with
/// [`AnalysisError::Solver`] on non-convergence or an invalid parameter.
pub trait Eigensolver {
    /// Solve the eigenproblem at one swept parameter value.
    fn solve(&self, model: &Model, parameter: f64, mode_count: usize)
        -> Result<Vec<RawEigenpair>>;
}

/// Dense finite-strip eigensolver.
#[derive(Debug, Clone)]
pub struct FsmEigensolver {
    /// Number of longitudinal half-waves assembled per parameter value.
    pub half_waves: usize,
}

impl Default for FsmEigensolver {
    fn default() -> Self {
        Self {
            half_waves: DEFAULT_HALF_WAVES,
        }
    }
}

impl FsmEigensolver {
    /// Solver covering half-waves 1..=`half_waves`.
    pub fn new(half_waves: usize) -> Self {
        Self {
            half_waves: half_waves.max(1),
        }
    }
}

/// Select the rows/columns of `mat` listed in `keep`.
fn reduce_matrix(mat: &DMatrix<f64>, keep: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(keep.len(), keep.len(), |i, j| mat[(keep[i], keep[j])])
}

/// Generalized symmetric solve K z = lambda B z via Cholesky reduction of B.
///
/// Returns eigenpairs ascending by eigenvalue, eigenvectors in the original
/// (reduced) coordinates. Fails when B is not positive definite.
fn solve_generalized(
    stiffness: &DMatrix<f64>,
    rhs: &DMatrix<f64>,
    parameter: f64,
) -> Result<Vec<(f64, DVector<f64>)>> {
    let chol = rhs.clone().cholesky().ok_or_else(|| AnalysisError::Solver {
        parameter,
        reason: "right-hand-side matrix is not positive definite".into(),
    })?;
    let l_inv = chol.l().try_inverse().ok_or_else(|| AnalysisError::Solver {
        parameter,
        reason: "Cholesky factor is singular".into(),
    })?;

    // A = L^-1 K L^-T is symmetric with the same spectrum; phi = L^-T z.
    let a = &l_inv * stiffness * l_inv.transpose();
    let eig = SymmetricEigen::new(a);
    let back = l_inv.transpose();

    let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));

    let mut pairs = Vec::with_capacity(order.len());
    for idx in order {
        let lambda = eig.eigenvalues[idx];
        if !lambda.is_finite() {
            return Err(AnalysisError::Solver {
                parameter,
                reason: format!("non-finite eigenvalue {lambda}"),
            });
        }
        let phi = &back * eig.eigenvectors.column(idx);
        pairs.push((lambda, phi));
    }
    Ok(pairs)
}

impl Eigensolver for FsmEigensolver {
    fn solve(
        &self,
        model: &Model,
        parameter: f64,
        mode_count: usize,
    ) -> Result<Vec<RawEigenpair>> {
        if !parameter.is_finite() || parameter <= 0.0 {
            return Err(AnalysisError::Solver {
                parameter,
                reason: "strip length must be positive and finite".into(),
            });
        }

        let block_dofs = model.geometry.dof_count();
        let constrained = constrained_dofs(model);
        let keep: Vec<usize> = (0..block_dofs)
            .filter(|dof| !constrained.contains(dof))
            .collect();
        if keep.is_empty() {
            return Err(AnalysisError::Solver {
                parameter,
                reason: "edge supports constrain every degree of freedom".into(),
            });
        }

        let mut pairs: Vec<RawEigenpair> = Vec::new();
        for m in 1..=self.half_waves {
            let system = assemble_half_wave(model, parameter, m);
            let rhs_full = match model.analysis {
                AnalysisKind::FreeVibration => system.mass.clone(),
                AnalysisKind::Buckling => &system.geometric * model.reference_stress,
            };
            let k_red = reduce_matrix(&system.stiffness, &keep);
            let rhs_red = reduce_matrix(&rhs_full, &keep);

            for (lambda, phi_red) in solve_generalized(&k_red, &rhs_red, parameter)? {
                if lambda <= LAMBDA_TOL {
                    continue;
                }
                // Scatter the reduced vector into the half-wave block of the
                // concatenated DOF layout; constrained DOFs stay zero.
                let mut vector = DVector::zeros(block_dofs * self.half_waves);
                for (row, &dof) in keep.iter().enumerate() {
                    vector[(m - 1) * block_dofs + dof] = phi_red[row];
                }
                pairs.push(RawEigenpair {
                    value: lambda,
                    vector,
                });
            }
        }

        pairs.sort_by(|a, b| a.value.total_cmp(&b.value));
        pairs.truncate(mode_count);
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeSupport, Material, StripGeometry};

    fn steel_plate(analysis: AnalysisKind) -> Model {
        Model {
            geometry: StripGeometry::uniform(4, 25.0, 2.0).unwrap(),
            material: Material {
                elastic_modulus: 210_000.0,
                poisson_ratio: 0.3,
                density: 7.85e-9,
            },
            edge_support: EdgeSupport::Pinned,
            analysis,
            reference_stress: 1.0,
        }
    }

    #[test]
    fn eigenvalues_are_positive_and_ascending() {
        let model = steel_plate(AnalysisKind::FreeVibration);
        let solver = FsmEigensolver::new(3);
        let pairs = solver.solve(&model, 400.0, 6).unwrap();
        assert_eq!(pairs.len(), 6);
        for pair in &pairs {
            assert!(pair.value > 0.0);
        }
        for window in pairs.windows(2) {
            assert!(window[0].value <= window[1].value);
        }
    }

    #[test]
    fn eigenvector_layout_spans_all_half_waves() {
        let model = steel_plate(AnalysisKind::Buckling);
        let solver = FsmEigensolver::new(3);
        let pairs = solver.solve(&model, 400.0, 4).unwrap();
        let block = model.geometry.dof_count();
        for pair in &pairs {
            assert_eq!(pair.vector.len(), block * 3);
            // Exactly one half-wave block is populated per mode.
            let populated = (0..3)
                .filter(|m| pair.vector.rows(m * block, block).norm() > 0.0)
                .count();
            assert_eq!(populated, 1);
        }
    }

    #[test]
    fn pinned_edges_zero_the_edge_deflections() {
        let model = steel_plate(AnalysisKind::FreeVibration);
        let solver = FsmEigensolver::new(1);
        let pairs = solver.solve(&model, 400.0, 2).unwrap();
        let block = model.geometry.dof_count();
        for pair in &pairs {
            assert_eq!(pair.vector[0], 0.0);
            assert_eq!(pair.vector[block - 2], 0.0);
        }
    }

    #[test]
    fn invalid_parameter_is_a_solver_error() {
        let model = steel_plate(AnalysisKind::FreeVibration);
        let solver = FsmEigensolver::default();
        let err = solver.solve(&model, -1.0, 4).unwrap_err();
        assert!(matches!(err, AnalysisError::Solver { .. }));
    }
}
