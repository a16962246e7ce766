//! Type aliases, constants, and core enums shared across the crate.

/// Degrees of freedom per nodal line of the strip assembly (transverse
/// deflection w and rotation theta about the longitudinal axis).
pub const DOF_PER_NODAL_LINE: usize = 2;

/// Default minimum-similarity threshold tau for accepting a match between a
/// raw eigenvector and an open mode series.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Two similarity scores closer than this count as tied; the tie is broken
/// on eigenvalue continuity instead.
pub const MAC_TIE_TOL: f64 = 1e-9;

/// Number of eigenpairs requested per sweep step when unspecified.
pub const DEFAULT_MODE_COUNT: usize = 6;

/// Default number of longitudinal half-waves assembled by the strip backend.
pub const DEFAULT_HALF_WAVES: usize = 4;

/// Eigenvalues below this are treated as numerically zero and discarded.
pub const LAMBDA_TOL: f64 = 1e-12;

/// Abscissae and weights for 4-point Gauss-Legendre quadrature on [-1, 1],
/// exact for the degree-6 products of cubic Hermite shape functions.
pub const GAUSS_4: [(f64, f64); 4] = [
    (-0.861_136_311_594_052_6, 0.347_854_845_137_453_85),
    (-0.339_981_043_584_856_26, 0.652_145_154_862_546_2),
    (0.339_981_043_584_856_26, 0.652_145_154_862_546_2),
    (0.861_136_311_594_052_6, 0.347_854_845_137_453_85),
];

/// Assignment algorithm used when matching raw eigenpairs to open series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchingPolicy {
    /// Greedy by descending similarity. Minimum acceptable policy; can
    /// misassign when modes cross between steps.
    Greedy,
    /// Globally optimal maximum-weight matching (Kuhn-Munkres).
    #[default]
    Optimal,
}

impl std::str::FromStr for MatchingPolicy {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "optimal" => Ok(Self::Optimal),
            other => Err(format!(
                "unknown matching policy '{other}' (expected greedy or optimal)"
            )),
        }
    }
}

/// Which eigenproblem the strip backend assembles at each parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// K phi = omega^2 M phi; eigenvalues are squared angular frequencies.
    #[default]
    FreeVibration,
    /// K phi = sigma_cr Kg phi; eigenvalues are critical buckling stresses.
    Buckling,
}
