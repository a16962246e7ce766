//! Command-line entry point: load a model file, run the tracked parameter
//! sweep, and write the modal analysis report.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use fsm_modal_analysis::{
    assemble, load_model, run_sweep, AnalysisError, FsmEigensolver, MatchingPolicy, PlotStyle,
    ReportConfig, ReportSink, Result, SvgReportSink, TrackerConfig,
};
use fsm_modal_analysis::types::{
    DEFAULT_HALF_WAVES, DEFAULT_MODE_COUNT, DEFAULT_SIMILARITY_THRESHOLD, MAC_TIE_TOL,
};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Visualization and modal analysis of the parametric model of buckling and \
             free vibration in prismatic shell structures"
)]
struct Args {
    /// File storing the structural model and its declared parameter sweep
    model_file: PathBuf,

    /// Store the modal analysis report to the selected FILENAME, uses
    /// '<model_file>.svg' by default
    #[arg(short, long, value_name = "FILENAME")]
    report_file: Option<PathBuf>,

    /// If specified, clip the minimum strip length [mm] to VAL
    #[arg(long, value_name = "VAL")]
    a_min: Option<f64>,

    /// If specified, clip the maximum strip length [mm] to VAL
    #[arg(long, value_name = "VAL")]
    a_max: Option<f64>,

    /// Number of modes requested from the solver at each sweep step
    #[arg(short = 'n', long, default_value_t = DEFAULT_MODE_COUNT)]
    mode_count: usize,

    /// Number of longitudinal half-waves assembled per step
    #[arg(long, default_value_t = DEFAULT_HALF_WAVES)]
    half_waves: usize,

    /// Minimum shape similarity for extending a tracked mode, in (0, 1]
    #[arg(short = 't', long, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    similarity_threshold: f64,

    /// Assignment policy: greedy or optimal
    #[arg(long, default_value = "optimal")]
    matching: MatchingPolicy,

    /// Plot figures using the selected visual theme: inferno, viridis, or
    /// grayscale
    #[arg(short = 'c', long, default_value = "inferno")]
    style: String,

    /// Raster resolution of the report pages
    #[arg(long, default_value_t = 72)]
    dpi: u32,

    /// Be quiet, show only warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Be very verbose, show debug information
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<()> {
    if !(args.similarity_threshold > 0.0 && args.similarity_threshold <= 1.0) {
        return Err(AnalysisError::Configuration(format!(
            "similarity threshold must lie in (0, 1], got {}",
            args.similarity_threshold
        )));
    }
    if args.mode_count == 0 {
        return Err(AnalysisError::Configuration(
            "mode count must be at least 1".into(),
        ));
    }
    let style = PlotStyle::from_name(&args.style)?;

    let (model, sweep) = load_model(&args.model_file)?;
    let sweep = sweep.clip(args.a_min, args.a_max)?;

    let solver = FsmEigensolver::new(args.half_waves);
    let tracker_config = TrackerConfig {
        threshold: args.similarity_threshold,
        policy: args.matching,
        tie_tol: MAC_TIE_TOL,
    };
    let result = run_sweep(&model, &sweep, &solver, args.mode_count, tracker_config)?;

    let report_config = ReportConfig {
        style,
        dpi: args.dpi,
        mode_count: args.mode_count,
    };
    let document = assemble(&model, &result, &report_config);

    let report_path = args
        .report_file
        .clone()
        .unwrap_or_else(|| args.model_file.with_extension("svg"));
    SvgReportSink::new(&report_config).write(&document, &report_path)?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.quiet {
        LevelFilter::Warn
    } else if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(err) = run(&args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
