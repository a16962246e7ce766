//! Sweep orchestration: solve each parameter value, feed the tracker in
//! sweep order, and collect the tracked series.
//!
//! Tracking depends on the immediately preceding step, so consumption is
//! strictly sequential. With the `parallel` feature the independent per-step
//! eigensolves run out of order on a rayon pool; results are reinserted in
//! sweep order before the tracker sees them.

use std::time::Instant;

use log::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::model::{Model, ParameterSweep};
use crate::solver::{Eigensolver, RawEigenpair};
use crate::tracker::{ModeSeries, ModeTracker, TrackerConfig};

/// Outcome of a parameter sweep.
#[derive(Debug)]
pub struct SweepResult {
    /// Tracked series ordered by first-appearance step, then creation
    /// eigenvalue.
    pub series: Vec<ModeSeries>,
    /// The swept parameter values, including failed steps.
    pub parameters: Vec<f64>,
    /// (step, parameter) of steps skipped after a solver failure.
    pub gaps: Vec<(usize, f64)>,
}

/// Solve every sweep step sequentially, in order.
#[cfg(not(feature = "parallel"))]
fn solve_steps<S: Eigensolver + Sync>(
    model: &Model,
    values: &[f64],
    solver: &S,
    mode_count: usize,
) -> Vec<Result<Vec<RawEigenpair>>> {
    values
        .iter()
        .map(|&a| solver.solve(model, a, mode_count))
        .collect()
}

/// Solve every sweep step on the rayon pool; collection preserves sweep
/// order regardless of completion order.
#[cfg(feature = "parallel")]
fn solve_steps<S: Eigensolver + Sync>(
    model: &Model,
    values: &[f64],
    solver: &S,
    mode_count: usize,
) -> Vec<Result<Vec<RawEigenpair>>> {
    values
        .par_iter()
        .map(|&a| solver.solve(model, a, mode_count))
        .collect()
}

/// Run the sweep: one eigensolve per parameter value, tracked in order.
///
/// A solver failure after the first step is logged and recorded as a gap;
/// the tracker never sees that step and open series keep matching across
/// the hole. A failure at the first step aborts with a configuration error
/// since no tracking baseline exists. No retries are attempted.
pub fn run_sweep<S: Eigensolver + Sync>(
    model: &Model,
    sweep: &ParameterSweep,
    solver: &S,
    mode_count: usize,
    config: TrackerConfig,
) -> Result<SweepResult> {
    let start = Instant::now();
    info!(
        "Sweeping {} parameter values ({} modes per step)...",
        sweep.len(),
        mode_count
    );

    let outcomes = solve_steps(model, sweep.values(), solver, mode_count);

    let mut tracker = ModeTracker::new(config);
    let mut gaps = Vec::new();
    for (step, (&parameter, outcome)) in sweep.values().iter().zip(outcomes).enumerate() {
        match outcome {
            Ok(pairs) => {
                tracker.consume_step(step, parameter, &pairs)?;
            }
            Err(err) if step == 0 => {
                return Err(AnalysisError::Configuration(format!(
                    "first sweep step failed, no tracking baseline: {err}"
                )));
            }
            Err(err) => {
                warn!("Skipping step {step} (a = {parameter}): {err}");
                gaps.push((step, parameter));
            }
        }
    }

    let series = tracker.into_series();
    let open = series.iter().filter(|s| s.is_open()).count();
    info!(
        "Sweep completed in {:.3} second(s): {} series ({} open), {} gap(s)",
        start.elapsed().as_secs_f64(),
        series.len(),
        open,
        gaps.len()
    );

    Ok(SweepResult {
        series,
        parameters: sweep.values().to_vec(),
        gaps,
    })
}
