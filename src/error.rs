//! Error types for the parametric modal analysis pipeline.

use thiserror::Error;

/// Result type alias using [`AnalysisError`].
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while loading, sweeping, tracking, or reporting.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Invalid sweep bounds, missing model, or a first-step solver failure.
    /// Fatal; aborts the run.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Per-step solver failure (non-convergence, invalid parameter). The
    /// sweep continues with a gap unless this happens at the first step.
    #[error("solver failed at parameter {parameter}: {reason}")]
    Solver {
        /// Swept parameter value at which the solver failed.
        parameter: f64,
        /// Solver-reported reason.
        reason: String,
    },

    /// Eigenvector dimensionality changed between sweep steps. Fatal.
    #[error("eigenvector length changed mid-sweep: expected {expected} DOFs, found {found}")]
    ShapeMismatch {
        /// DOF count established at the first tracked step.
        expected: usize,
        /// DOF count of the offending eigenvector.
        found: usize,
    },

    /// The report sink failed to produce the requested artifact.
    #[error("report write failed: {0}")]
    ReportWrite(String),

    /// File system errors while loading the model artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
