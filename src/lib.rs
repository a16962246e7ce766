//! Modal analysis of the parametric model of buckling and free vibration in
//! prismatic shell structures.
//!
//! The crate sweeps a structural model across a range of strip lengths,
//! solves the eigenproblem at each step, threads physically consistent mode
//! identities through the sweep, and assembles the tracked results into a
//! visual report.
//!
//! Raw eigensolvers order eigenpairs by magnitude, so the same index does
//! not denote the same physical mode from one step to the next; shapes can
//! cross, veer, or swap order as the parameter changes. The
//! [`tracker::ModeTracker`] resolves identities by scoring eigenvector
//! similarity (modal assurance criterion) against every open series and
//! solving a one-to-one assignment per step.
//!
//! # Pipeline
//!
//! ```no_run
//! use fsm_modal_analysis::{
//!     assemble, load_model, run_sweep, FsmEigensolver, ReportConfig, ReportSink,
//!     SvgReportSink, TrackerConfig,
//! };
//!
//! # fn main() -> fsm_modal_analysis::Result<()> {
//! let (model, sweep) = load_model(std::path::Path::new("model.json"))?;
//! let solver = FsmEigensolver::default();
//! let result = run_sweep(&model, &sweep, &solver, 6, TrackerConfig::default())?;
//!
//! let config = ReportConfig::default();
//! let document = assemble(&model, &result, &config);
//! SvgReportSink::new(&config).write(&document, std::path::Path::new("model.svg"))?;
//! # Ok(())
//! # }
//! ```

pub mod assignment;
pub mod error;
pub mod mac;
pub mod model;
pub mod report;
pub mod solver;
pub mod strip;
pub mod sweep;
pub mod tracker;
pub mod types;

pub use error::{AnalysisError, Result};
pub use mac::{mac, mac_matrix};
pub use model::{
    load_model, EdgeSupport, Material, Model, ModelFile, ParameterSweep, StripGeometry, SweepSpec,
};
pub use report::{
    assemble, PlotStyle, ReportConfig, ReportDocument, ReportSink, Section, SvgReportSink,
};
pub use solver::{Eigensolver, FsmEigensolver, RawEigenpair};
pub use sweep::{run_sweep, SweepResult};
pub use tracker::{ModeSeries, ModeTracker, TrackedPoint, TrackerConfig, TrackingAssignment};
pub use types::{
    AnalysisKind, MatchingPolicy, DEFAULT_MODE_COUNT, DEFAULT_SIMILARITY_THRESHOLD,
};
