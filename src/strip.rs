//! Finite-strip matrices for prismatic plate assemblies.
//!
//! The cross-section is a chain of flat strips joined at nodal lines, each
//! carrying transverse deflection w and rotation theta. Along the length the
//! displacement varies as sin(m pi y / a), which satisfies the simply
//! supported end conditions exactly, so each longitudinal half-wave `m`
//! yields an independent eigenproblem block.
//!
//! Per strip the bending, geometric, and consistent-mass matrices are
//! integrated across the width with cubic Hermite shape functions and
//! 4-point Gauss quadrature, then assembled into the global block the same
//! way element matrices are scattered through a DOF map.

use nalgebra::{DMatrix, SMatrix, SVector};

use crate::model::Model;
use crate::types::{DOF_PER_NODAL_LINE, GAUSS_4};

type Vector4 = SVector<f64, 4>;
type Matrix4 = SMatrix<f64, 4, 4>;

/// Hermite cubic shape functions on a strip of width `b`, at natural
/// coordinate `xi` in [0, 1]. DOF order: w1, theta1, w2, theta2.
pub fn shape_functions_hermite(xi: f64, b: f64) -> Vector4 {
    let xi2 = xi * xi;
    let xi3 = xi2 * xi;
    Vector4::new(
        1.0 - 3.0 * xi2 + 2.0 * xi3,
        b * (xi - 2.0 * xi2 + xi3),
        3.0 * xi2 - 2.0 * xi3,
        b * (xi3 - xi2),
    )
}

/// First derivatives of the Hermite shape functions w.r.t. the physical
/// transverse coordinate.
pub fn shape_function_slopes_hermite(xi: f64, b: f64) -> Vector4 {
    let xi2 = xi * xi;
    Vector4::new(
        (-6.0 * xi + 6.0 * xi2) / b,
        1.0 - 4.0 * xi + 3.0 * xi2,
        (6.0 * xi - 6.0 * xi2) / b,
        3.0 * xi2 - 2.0 * xi,
    )
}

/// Second derivatives of the Hermite shape functions w.r.t. the physical
/// transverse coordinate.
pub fn shape_function_curvatures_hermite(xi: f64, b: f64) -> Vector4 {
    Vector4::new(
        (-6.0 + 12.0 * xi) / (b * b),
        (-4.0 + 6.0 * xi) / b,
        (6.0 - 12.0 * xi) / (b * b),
        (-2.0 + 6.0 * xi) / b,
    )
}

/// Per-strip matrices for one longitudinal half-wave.
pub struct StripMatrices {
    /// Bending stiffness.
    pub stiffness: Matrix4,
    /// Geometric stiffness under unit axial compressive stress.
    pub geometric: Matrix4,
    /// Consistent mass.
    pub mass: Matrix4,
}

/// Integrate the strip matrices for width `b`, thickness `t`, half-wave
/// parameter `k_m = m pi / a`, flexural rigidity `d` and Poisson ratio `nu`.
///
/// The longitudinal integrals of sin^2 and cos^2 both contribute a factor
/// a/2, folded in by the caller-supplied `half_length`.
pub fn compute_strip_matrices(
    b: f64,
    t: f64,
    k_m: f64,
    d: f64,
    nu: f64,
    rho: f64,
    half_length: f64,
) -> StripMatrices {
    let d1 = nu * d;
    let dxy = 0.5 * (1.0 - nu) * d;
    let k2 = k_m * k_m;
    let k4 = k2 * k2;

    let mut stiffness = Matrix4::zeros();
    let mut geometric = Matrix4::zeros();
    let mut mass = Matrix4::zeros();

    for &(point, weight) in GAUSS_4.iter() {
        // Map the [-1, 1] Gauss abscissa onto xi in [0, 1].
        let xi = 0.5 * (point + 1.0);
        let jacobian = 0.5 * b * weight;

        let n = shape_functions_hermite(xi, b);
        let n1 = shape_function_slopes_hermite(xi, b);
        let n2 = shape_function_curvatures_hermite(xi, b);

        let nn = n * n.transpose();
        let cross = n2 * n.transpose() + n * n2.transpose();

        stiffness +=
            (d * n2 * n2.transpose() - d1 * k2 * cross + d * k4 * nn + 4.0 * dxy * k2 * n1 * n1.transpose())
                * jacobian;
        geometric += nn * (t * k2 * jacobian);
        mass += nn * (rho * t * jacobian);
    }

    StripMatrices {
        stiffness: stiffness * half_length,
        geometric: geometric * half_length,
        mass: mass * half_length,
    }
}

/// Global matrices of one half-wave block.
pub struct HalfWaveSystem {
    /// Assembled bending stiffness K.
    pub stiffness: DMatrix<f64>,
    /// Assembled geometric stiffness Kg for unit axial stress.
    pub geometric: DMatrix<f64>,
    /// Assembled consistent mass M.
    pub mass: DMatrix<f64>,
}

/// Assemble the global strip matrices for half-wave `m` at strip length `a`.
pub fn assemble_half_wave(model: &Model, a: f64, m: usize) -> HalfWaveSystem {
    let geometry = &model.geometry;
    let material = &model.material;
    let num_dofs = geometry.dof_count();
    let k_m = m as f64 * std::f64::consts::PI / a;
    let half_length = 0.5 * a;

    let mut stiffness = DMatrix::zeros(num_dofs, num_dofs);
    let mut geometric = DMatrix::zeros(num_dofs, num_dofs);
    let mut mass = DMatrix::zeros(num_dofs, num_dofs);

    for (strip, (&b, &t)) in geometry
        .widths
        .iter()
        .zip(geometry.thicknesses.iter())
        .enumerate()
    {
        let d = material.flexural_rigidity(t);
        let local = compute_strip_matrices(
            b,
            t,
            k_m,
            d,
            material.poisson_ratio,
            material.density,
            half_length,
        );

        let base = strip * DOF_PER_NODAL_LINE;
        let dof_map = [base, base + 1, base + 2, base + 3];
        for i in 0..4 {
            for j in 0..4 {
                stiffness[(dof_map[i], dof_map[j])] += local.stiffness[(i, j)];
                geometric[(dof_map[i], dof_map[j])] += local.geometric[(i, j)];
                mass[(dof_map[i], dof_map[j])] += local.mass[(i, j)];
            }
        }
    }

    HalfWaveSystem {
        stiffness,
        geometric,
        mass,
    }
}

/// DOF indices removed by the side-edge support condition.
pub fn constrained_dofs(model: &Model) -> Vec<usize> {
    use crate::model::EdgeSupport;

    let num_dofs = model.geometry.dof_count();
    match model.edge_support {
        EdgeSupport::Free => Vec::new(),
        EdgeSupport::Pinned => vec![0, num_dofs - DOF_PER_NODAL_LINE],
        EdgeSupport::Clamped => vec![
            0,
            1,
            num_dofs - DOF_PER_NODAL_LINE,
            num_dofs - DOF_PER_NODAL_LINE + 1,
        ],
    }
}

/// The 1-based half-wave index whose DOF block carries the largest norm in a
/// concatenated multi-half-wave eigenvector.
pub fn dominant_half_wave(vector: &nalgebra::DVector<f64>, block_dofs: usize) -> usize {
    let blocks = vector.len() / block_dofs;
    let mut best = 1;
    let mut best_norm = f64::NEG_INFINITY;
    for m in 0..blocks {
        let norm = vector.rows(m * block_dofs, block_dofs).norm();
        if norm > best_norm {
            best_norm = norm;
            best = m + 1;
        }
    }
    best
}

/// Deflections w at the nodal lines for the dominant half-wave block of a
/// concatenated eigenvector.
pub fn deflection_profile(vector: &nalgebra::DVector<f64>, block_dofs: usize) -> Vec<f64> {
    let m = dominant_half_wave(vector, block_dofs) - 1;
    let block = vector.rows(m * block_dofs, block_dofs);
    block
        .iter()
        .step_by(DOF_PER_NODAL_LINE)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Material, Model, StripGeometry};
    use crate::types::AnalysisKind;
    use nalgebra::DVector;

    fn test_model() -> Model {
        Model {
            geometry: StripGeometry::uniform(4, 50.0, 2.0).unwrap(),
            material: Material {
                elastic_modulus: 210_000.0,
                poisson_ratio: 0.3,
                density: 7.85e-9,
            },
            edge_support: Default::default(),
            analysis: AnalysisKind::FreeVibration,
            reference_stress: 1.0,
        }
    }

    #[test]
    fn hermite_functions_interpolate_end_dofs() {
        let b = 50.0;
        let at_0 = shape_functions_hermite(0.0, b);
        let at_1 = shape_functions_hermite(1.0, b);
        assert!((at_0[0] - 1.0).abs() < 1e-14);
        assert!((at_1[2] - 1.0).abs() < 1e-14);
        assert!(at_0[2].abs() < 1e-14 && at_1[0].abs() < 1e-14);

        let s_0 = shape_function_slopes_hermite(0.0, b);
        assert!((s_0[1] - 1.0).abs() < 1e-14);
        assert!(s_0[0].abs() < 1e-14);
    }

    #[test]
    fn assembled_matrices_are_symmetric() {
        let model = test_model();
        let system = assemble_half_wave(&model, 400.0, 1);
        for mat in [&system.stiffness, &system.geometric, &system.mass] {
            for i in 0..mat.nrows() {
                for j in 0..i {
                    assert!(
                        (mat[(i, j)] - mat[(j, i)]).abs() < 1e-8 * mat[(i, i)].abs().max(1.0),
                        "asymmetry at ({i}, {j})"
                    );
                }
            }
        }
    }

    #[test]
    fn stiffness_is_positive_definite_even_free_free() {
        // The k_m^4 membrane-of-curvature term removes cross-section
        // rigid-body modes once m >= 1.
        let model = test_model();
        let system = assemble_half_wave(&model, 400.0, 1);
        assert!(system.stiffness.clone().cholesky().is_some());
        assert!(system.mass.clone().cholesky().is_some());
        assert!(system.geometric.clone().cholesky().is_some());
    }

    #[test]
    fn dominant_half_wave_picks_largest_block() {
        let mut v = DVector::zeros(12);
        v[5] = 0.1;
        v[9] = 2.0; // block 3 of 3 (4 DOFs each)
        assert_eq!(dominant_half_wave(&v, 4), 3);
    }

    #[test]
    fn deflection_profile_extracts_w_dofs() {
        let mut v = DVector::zeros(8);
        v[0] = 1.0;
        v[2] = -0.5;
        v[4] = 0.25;
        v[6] = 0.125;
        let profile = deflection_profile(&v, 8);
        assert_eq!(profile, vec![1.0, -0.5, 0.25, 0.125]);
    }
}
