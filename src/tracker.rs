//! Mode tracking across the parameter sweep.
//!
//! Raw eigensolvers order eigenpairs by magnitude at each step, so "mode 3"
//! at one step need not be the same physical mode at the next. The tracker
//! threads persistent identities through the sweep by matching each step's
//! eigenvectors against the last recorded shape of every open series, using
//! the MAC score and a one-to-one assignment.

use nalgebra::{DMatrix, DVector};

use crate::assignment::{match_modes, MatchProblem};
use crate::error::{AnalysisError, Result};
use crate::mac::mac_matrix;
use crate::solver::RawEigenpair;
use crate::types::{DEFAULT_SIMILARITY_THRESHOLD, MAC_TIE_TOL, MatchingPolicy};

/// One observation of a tracked mode.
#[derive(Debug, Clone)]
pub struct TrackedPoint {
    /// Sweep step index (gaps leave holes in this sequence).
    pub step: usize,
    /// Swept parameter value.
    pub parameter: f64,
    /// Eigenvalue observed at this step.
    pub value: f64,
    /// Eigenvector observed at this step.
    pub vector: DVector<f64>,
}

/// The tracked identity of a physical mode across the sweep.
///
/// Points are append-only and strictly increasing in step. A series may
/// start mid-sweep (mode born) and close mid-sweep (mode lost); a closed
/// series is retained for reporting but receives no further eigenpairs.
#[derive(Debug, Clone)]
pub struct ModeSeries {
    /// Stable identity, assigned in creation order.
    pub id: usize,
    /// Step at which the series was created.
    pub first_step: usize,
    /// Eigenvalue at creation, used for deterministic ordering.
    pub creation_value: f64,
    /// Observations, one per step where the mode was matched.
    pub points: Vec<TrackedPoint>,
    closed_at: Option<usize>,
}

impl ModeSeries {
    /// Whether the series can still receive eigenpairs.
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Step at which the series was marked lost, if any.
    pub fn closed_at(&self) -> Option<usize> {
        self.closed_at
    }

    /// Most recent observation. Series always hold at least one point.
    pub fn last_point(&self) -> &TrackedPoint {
        self.points.last().expect("series holds at least one point")
    }

    /// First and last parameter values where the mode was observed.
    pub fn parameter_span(&self) -> (f64, f64) {
        (
            self.points.first().expect("non-empty").parameter,
            self.last_point().parameter,
        )
    }

    /// Minimum and maximum observed eigenvalue.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for point in &self.points {
            lo = lo.min(point.value);
            hi = hi.max(point.value);
        }
        (lo, hi)
    }
}

/// Outcome of consuming one sweep step: which raw indices extended which
/// series, which started new series, and which series were lost. Computed
/// once per step and never revisited.
#[derive(Debug, Clone, Default)]
pub struct TrackingAssignment {
    /// (raw index, series id) for raws that extended an open series.
    pub matched: Vec<(usize, usize)>,
    /// (raw index, series id) for raws that started a new series.
    pub born: Vec<(usize, usize)>,
    /// Series ids marked lost at this step.
    pub lost: Vec<usize>,
}

/// Tracker configuration.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// Minimum similarity tau for extending a series.
    pub threshold: f64,
    /// Assignment policy.
    pub policy: MatchingPolicy,
    /// Similarity tie tolerance.
    pub tie_tol: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            policy: MatchingPolicy::default(),
            tie_tol: MAC_TIE_TOL,
        }
    }
}

/// Consumes per-step raw eigenpairs and produces globally consistent mode
/// identities. Owns the series set exclusively; steps must be consumed in
/// sweep order.
#[derive(Debug)]
pub struct ModeTracker {
    config: TrackerConfig,
    series: Vec<ModeSeries>,
    dof_len: Option<usize>,
    last_step: Option<usize>,
}

impl ModeTracker {
    /// New tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            series: Vec::new(),
            dof_len: None,
            last_step: None,
        }
    }

    /// Series created so far, in creation order.
    pub fn series(&self) -> &[ModeSeries] {
        &self.series
    }

    /// Consume the eigenpairs of one sweep step.
    ///
    /// The first step with a non-empty result seeds one series per eigenpair
    /// in solver order. Later steps are matched by MAC score against the
    /// last vector of every open series; matches at or above tau extend,
    /// unmatched raws are born, unmatched open series are lost. A step with
    /// zero eigenpairs loses every open series without error.
    pub fn consume_step(
        &mut self,
        step: usize,
        parameter: f64,
        eigenpairs: &[RawEigenpair],
    ) -> Result<TrackingAssignment> {
        if let Some(last) = self.last_step {
            if step <= last {
                return Err(AnalysisError::Configuration(format!(
                    "sweep steps consumed out of order ({step} after {last})"
                )));
            }
        }
        self.last_step = Some(step);
        self.check_shapes(eigenpairs)?;

        let open: Vec<usize> = (0..self.series.len())
            .filter(|&idx| self.series[idx].is_open())
            .collect();

        let mut outcome = TrackingAssignment::default();

        let raw_to_series = if open.is_empty() || eigenpairs.is_empty() {
            vec![None; eigenpairs.len()]
        } else {
            let references: Vec<&DVector<f64>> = open
                .iter()
                .map(|&idx| &self.series[idx].last_point().vector)
                .collect();
            let raw_vectors: Vec<DVector<f64>> =
                eigenpairs.iter().map(|pair| pair.vector.clone()).collect();
            let scores = mac_matrix(&references, &raw_vectors);
            let distance = DMatrix::from_fn(open.len(), eigenpairs.len(), |row, col| {
                (self.series[open[row]].last_point().value - eigenpairs[col].value).abs()
            });
            match_modes(
                self.config.policy,
                &MatchProblem {
                    scores: &scores,
                    eigen_distance: &distance,
                    threshold: self.config.threshold,
                    tie_tol: self.config.tie_tol,
                },
            )
            .into_iter()
            .map(|slot| slot.map(|row| open[row]))
            .collect()
        };

        // Extend matched series.
        let mut series_extended = vec![false; self.series.len()];
        for (raw, slot) in raw_to_series.iter().enumerate() {
            if let Some(series_idx) = *slot {
                let pair = &eigenpairs[raw];
                self.series[series_idx].points.push(TrackedPoint {
                    step,
                    parameter,
                    value: pair.value,
                    vector: pair.vector.clone(),
                });
                series_extended[series_idx] = true;
                outcome.matched.push((raw, self.series[series_idx].id));
            }
        }

        // Close open series that found no match at this step.
        for &idx in &open {
            if !series_extended[idx] {
                self.series[idx].closed_at = Some(step);
                outcome.lost.push(self.series[idx].id);
            }
        }

        // Start new series for unmatched raws, in ascending eigenvalue order
        // so creation ids follow the reporting order.
        let mut born: Vec<usize> = raw_to_series
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(raw, _)| raw)
            .collect();
        born.sort_by(|&a, &b| {
            eigenpairs[a]
                .value
                .total_cmp(&eigenpairs[b].value)
                .then(a.cmp(&b))
        });
        for raw in born {
            let pair = &eigenpairs[raw];
            let id = self.series.len();
            self.series.push(ModeSeries {
                id,
                first_step: step,
                creation_value: pair.value,
                points: vec![TrackedPoint {
                    step,
                    parameter,
                    value: pair.value,
                    vector: pair.vector.clone(),
                }],
                closed_at: None,
            });
            outcome.born.push((raw, id));
        }

        if !outcome.lost.is_empty() {
            log::debug!(
                "step {step}: {} matched, {} born, {} lost",
                outcome.matched.len(),
                outcome.born.len(),
                outcome.lost.len()
            );
        }
        Ok(outcome)
    }

    /// Finish tracking and return all series, open and closed, ordered by
    /// first-appearance step with ties broken by creation eigenvalue.
    pub fn into_series(self) -> Vec<ModeSeries> {
        let mut series = self.series;
        series.sort_by(|a, b| {
            a.first_step
                .cmp(&b.first_step)
                .then(a.creation_value.total_cmp(&b.creation_value))
                .then(a.id.cmp(&b.id))
        });
        series
    }

    fn check_shapes(&mut self, eigenpairs: &[RawEigenpair]) -> Result<()> {
        for pair in eigenpairs {
            match self.dof_len {
                None => self.dof_len = Some(pair.vector.len()),
                Some(expected) if pair.vector.len() != expected => {
                    return Err(AnalysisError::ShapeMismatch {
                        expected,
                        found: pair.vector.len(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(value: f64, components: &[f64]) -> RawEigenpair {
        RawEigenpair {
            value,
            vector: DVector::from_row_slice(components),
        }
    }

    fn tracker() -> ModeTracker {
        ModeTracker::new(TrackerConfig::default())
    }

    #[test]
    fn first_step_seeds_one_series_per_pair() {
        let mut t = tracker();
        let outcome = t
            .consume_step(0, 100.0, &[pair(1.0, &[1.0, 0.0]), pair(2.0, &[0.0, 1.0])])
            .unwrap();
        assert_eq!(outcome.born.len(), 2);
        assert!(outcome.matched.is_empty());
        assert_eq!(t.series().len(), 2);
    }

    #[test]
    fn matching_extends_and_mismatch_births() {
        let mut t = tracker();
        t.consume_step(0, 100.0, &[pair(1.0, &[1.0, 0.0, 0.0])])
            .unwrap();
        // Same shape extends; an orthogonal shape starts a new series.
        let outcome = t
            .consume_step(
                1,
                150.0,
                &[pair(1.1, &[2.0, 0.0, 0.0]), pair(5.0, &[0.0, 1.0, 0.0])],
            )
            .unwrap();
        assert_eq!(outcome.matched, vec![(0, 0)]);
        assert_eq!(outcome.born, vec![(1, 1)]);
        assert_eq!(t.series()[0].points.len(), 2);
    }

    #[test]
    fn unmatched_series_is_lost_and_stays_closed() {
        let mut t = tracker();
        t.consume_step(0, 100.0, &[pair(1.0, &[1.0, 0.0])]).unwrap();
        let outcome = t.consume_step(1, 150.0, &[]).unwrap();
        assert_eq!(outcome.lost, vec![0]);
        assert!(outcome.born.is_empty());

        // A later raw with the original shape must not resurrect the closed
        // series; identity never silently swaps.
        let outcome = t.consume_step(2, 200.0, &[pair(1.0, &[1.0, 0.0])]).unwrap();
        assert_eq!(outcome.born.len(), 1);
        assert_eq!(outcome.born[0].1, 1);
        assert_eq!(t.series()[0].points.len(), 1);
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        let mut t = tracker();
        t.consume_step(0, 100.0, &[pair(1.0, &[1.0, 0.0])]).unwrap();
        let err = t
            .consume_step(1, 150.0, &[pair(1.0, &[1.0, 0.0, 0.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ShapeMismatch {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let mut t = tracker();
        t.consume_step(3, 100.0, &[pair(1.0, &[1.0])]).unwrap();
        assert!(t.consume_step(3, 110.0, &[]).is_err());
        assert!(t.consume_step(1, 110.0, &[]).is_err());
    }

    #[test]
    fn series_ordering_is_first_step_then_creation_value() {
        let mut t = tracker();
        t.consume_step(0, 100.0, &[pair(4.0, &[0.0, 0.0, 1.0])])
            .unwrap();
        // Two births at step 1 arrive in descending eigenvalue order; ids
        // and final ordering must still be ascending by value.
        t.consume_step(
            1,
            150.0,
            &[
                pair(9.0, &[0.0, 1.0, 0.0]),
                pair(2.0, &[1.0, 0.0, 0.0]),
                pair(4.1, &[0.0, 0.0, 1.1]),
            ],
        )
        .unwrap();
        let series = t.into_series();
        assert_eq!(series[0].first_step, 0);
        assert_eq!(series[1].creation_value, 2.0);
        assert_eq!(series[2].creation_value, 9.0);
    }
}
