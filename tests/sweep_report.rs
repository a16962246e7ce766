//! Orchestrator failure policy and report assembly over whole sweeps.

use std::path::Path;

use fsm_modal_analysis::report::Section;
use fsm_modal_analysis::{
    assemble, run_sweep, AnalysisError, AnalysisKind, EdgeSupport, Eigensolver, FsmEigensolver,
    Material, Model, ParameterSweep, RawEigenpair, ReportConfig, ReportSink, Result,
    StripGeometry, SvgReportSink, TrackerConfig,
};
use nalgebra::DVector;

fn plate_model(analysis: AnalysisKind) -> Model {
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

/// Deterministic stand-in for the external solver: two fixed shapes with
/// scripted eigenvalues, failing at the parameters listed in `fail_at`.
struct ScriptedSolver {
    fail_at: Vec<f64>,
}

impl Eigensolver for ScriptedSolver {
    fn solve(&self, _model: &Model, parameter: f64, mode_count: usize) -> Result<Vec<RawEigenpair>> {
        if self.fail_at.iter().any(|&p| (p - parameter).abs() < 1e-9) {
            return Err(AnalysisError::Solver {
                parameter,
                reason: "did not converge".into(),
            });
        }
        let pairs = vec![
            RawEigenpair {
                value: parameter,
                vector: DVector::from_row_slice(&[1.0, 2.0, 1.0, 0.0]),
            },
            RawEigenpair {
                value: 10.0 * parameter,
                vector: DVector::from_row_slice(&[1.0, 0.0, -1.0, 2.0]),
            },
        ];
        Ok(pairs.into_iter().take(mode_count).collect())
    }
}

#[test]
fn mid_sweep_failure_is_a_gap_not_an_abort() {
    let model = plate_model(AnalysisKind::FreeVibration);
    let sweep = ParameterSweep::new(vec![100.0, 150.0, 200.0, 250.0]).unwrap();
    let solver = ScriptedSolver {
        fail_at: vec![150.0],
    };
    let result = run_sweep(&model, &sweep, &solver, 2, TrackerConfig::default()).unwrap();

    assert_eq!(result.gaps, vec![(1, 150.0)]);
    assert_eq!(result.series.len(), 2);
    // Series stay open across the hole and resume matching afterwards.
    for series in &result.series {
        assert!(series.is_open());
        assert_eq!(series.points.len(), 3);
        assert!(series.points.iter().all(|p| p.step != 1));
    }
}

#[test]
fn first_step_failure_aborts_with_configuration_error() {
    let model = plate_model(AnalysisKind::FreeVibration);
    let sweep = ParameterSweep::new(vec![100.0, 150.0]).unwrap();
    let solver = ScriptedSolver {
        fail_at: vec![100.0],
    };
    let err = run_sweep(&model, &sweep, &solver, 2, TrackerConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
}

#[test]
fn gap_free_series_values_follow_the_parameter() {
    let model = plate_model(AnalysisKind::Buckling);
    let sweep = ParameterSweep::linspace(100.0, 400.0, 7).unwrap();
    let solver = ScriptedSolver { fail_at: vec![] };
    let result = run_sweep(&model, &sweep, &solver, 2, TrackerConfig::default()).unwrap();

    for series in &result.series {
        assert_eq!(series.points.len(), sweep.len());
        for window in series.points.windows(2) {
            assert!(window[0].value <= window[1].value);
        }
        let (lo, hi) = series.value_range();
        assert_eq!(lo, series.points.first().unwrap().value);
        assert_eq!(hi, series.points.last().unwrap().value);
    }
}

#[test]
fn report_table_lists_each_series_once_in_order() {
    let model = plate_model(AnalysisKind::Buckling);
    let sweep = ParameterSweep::linspace(100.0, 300.0, 5).unwrap();
    let solver = ScriptedSolver { fail_at: vec![] };
    let result = run_sweep(&model, &sweep, &solver, 2, TrackerConfig::default()).unwrap();

    let document = assemble(&model, &result, &ReportConfig::default());
    let Some(Section::Table(table)) = document.sections.last() else {
        panic!("report must end with the summary table");
    };
    assert_eq!(table.rows.len(), result.series.len());
    let ids: Vec<usize> = table
        .rows
        .iter()
        .map(|row| row[0].parse().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
    // First/last parameter columns reflect the full span.
    assert_eq!(table.rows[0][1], "100.0");
    assert_eq!(table.rows[0][2], "300.0");
}

#[test]
fn end_to_end_report_with_the_strip_backend() {
    let model = plate_model(AnalysisKind::FreeVibration);
    let sweep = ParameterSweep::linspace(200.0, 600.0, 9).unwrap();
    let solver = FsmEigensolver::new(3);
    let result = run_sweep(&model, &sweep, &solver, 4, TrackerConfig::default()).unwrap();
    assert!(result.gaps.is_empty());
    assert!(!result.series.is_empty());

    let config = ReportConfig::default();
    let document = assemble(&model, &result, &config);
    let path = std::env::temp_dir().join("fsm_modal_end_to_end.svg");
    SvgReportSink::new(&config)
        .write(&document, Path::new(&path))
        .unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("<svg"));
    std::fs::remove_file(&path).ok();
}
