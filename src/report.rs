//! Report assembly and the rendering sink boundary.
//!
//! The assembler turns tracked series into a [`ReportDocument`]: pure data,
//! immutable once built. Rendering happens behind the [`ReportSink`] trait;
//! the shipped [`SvgReportSink`] draws one A4-landscape page per section
//! into a single SVG file with plotters.

use std::path::Path;

use log::info;
use plotters::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::model::Model;
use crate::strip::{deflection_profile, dominant_half_wave};
use crate::sweep::SweepResult;
use crate::types::{AnalysisKind, DEFAULT_MODE_COUNT};

/// Visual theme of the report figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotStyle {
    /// Warm dark-to-bright palette (the historical default).
    #[default]
    Inferno,
    /// Blue-to-yellow palette.
    Viridis,
    /// Neutral grays for print.
    Grayscale,
}

const INFERNO: [RGBColor; 6] = [
    RGBColor(40, 11, 84),
    RGBColor(101, 21, 110),
    RGBColor(159, 42, 99),
    RGBColor(212, 72, 66),
    RGBColor(245, 125, 21),
    RGBColor(250, 193, 39),
];

const VIRIDIS: [RGBColor; 6] = [
    RGBColor(68, 1, 84),
    RGBColor(65, 68, 135),
    RGBColor(42, 120, 142),
    RGBColor(34, 168, 132),
    RGBColor(122, 209, 81),
    RGBColor(253, 231, 37),
];

const GRAYSCALE: [RGBColor; 6] = [
    RGBColor(20, 20, 20),
    RGBColor(70, 70, 70),
    RGBColor(110, 110, 110),
    RGBColor(150, 150, 150),
    RGBColor(185, 185, 185),
    RGBColor(215, 215, 215),
];

impl PlotStyle {
    /// Parse a theme name as given on the command line.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "inferno" => Ok(Self::Inferno),
            "viridis" => Ok(Self::Viridis),
            "grayscale" | "gray" => Ok(Self::Grayscale),
            other => Err(AnalysisError::Configuration(format!(
                "unknown plot style '{other}' (expected inferno, viridis, or grayscale)"
            ))),
        }
    }

    /// Color for the series at `index`, cycling through the palette.
    pub fn series_color(&self, index: usize) -> RGBColor {
        let palette = match self {
            Self::Inferno => &INFERNO,
            Self::Viridis => &VIRIDIS,
            Self::Grayscale => &GRAYSCALE,
        };
        palette[index % palette.len()]
    }
}

/// Explicit report configuration, passed into the assembler and the sink.
#[derive(Debug, Clone, Copy)]
pub struct ReportConfig {
    /// Visual theme.
    pub style: PlotStyle,
    /// Raster resolution; page pixels derive from A4 landscape inches.
    pub dpi: u32,
    /// Number of leading series included in the report.
    pub mode_count: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            style: PlotStyle::default(),
            dpi: 72,
            mode_count: DEFAULT_MODE_COUNT,
        }
    }
}

/// A4 landscape page, in inches.
const PAGE_SIZE_IN: (f64, f64) = (11.7, 8.3);

/// One tracked curve on the eigenvalue-vs-parameter figure. Segments are
/// split wherever the series is absent so the drawn line is discontinuous
/// across gaps.
#[derive(Debug, Clone)]
pub struct Curve {
    /// Legend label.
    pub label: String,
    /// Polyline segments of (parameter, ordinate) points.
    pub segments: Vec<Vec<(f64, f64)>>,
    /// Palette index.
    pub color_index: usize,
}

/// Eigenvalue-vs-parameter figure covering the selected series.
#[derive(Debug, Clone)]
pub struct CurveFigure {
    /// Figure caption.
    pub title: String,
    /// Abscissa label.
    pub x_label: String,
    /// Ordinate label.
    pub y_label: String,
    /// One curve per selected series.
    pub curves: Vec<Curve>,
}

/// Cross-section deflection profile of one mode at a representative
/// parameter value.
#[derive(Debug, Clone)]
pub struct ShapeFigure {
    /// Figure caption.
    pub title: String,
    /// (transverse position, normalized deflection) samples.
    pub profile: Vec<(f64, f64)>,
    /// Palette index.
    pub color_index: usize,
}

/// Tabular sweep summary.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    /// Table caption.
    pub title: String,
    /// Column headers.
    pub header: Vec<String>,
    /// One row per reported series.
    pub rows: Vec<Vec<String>>,
}

/// One report section, in document order.
#[derive(Debug, Clone)]
pub enum Section {
    /// Eigenvalue curves across the sweep.
    CurvePlot(CurveFigure),
    /// Mode shape at a representative parameter.
    ShapePlot(ShapeFigure),
    /// Summary table.
    Table(SummaryTable),
}

/// Ordered collection of finished report sections.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    /// Document title.
    pub title: String,
    /// Sections in render order.
    pub sections: Vec<Section>,
}

fn ordinate(kind: AnalysisKind, eigenvalue: f64) -> f64 {
    match kind {
        // Report natural angular frequency rather than its square.
        AnalysisKind::FreeVibration => eigenvalue.sqrt(),
        AnalysisKind::Buckling => eigenvalue,
    }
}

fn ordinate_label(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::FreeVibration => "natural frequency omega [rad/s]",
        AnalysisKind::Buckling => "critical buckling stress sigma_cr [MPa]",
    }
}

/// Assemble the report document from the tracked sweep.
///
/// Sections: one curve figure over the selected series, one shape figure
/// per selected series at its mid-span observation, and the summary table.
/// Series selection takes the first `config.mode_count` series in their
/// deterministic order.
pub fn assemble(model: &Model, result: &SweepResult, config: &ReportConfig) -> ReportDocument {
    let start = std::time::Instant::now();
    let kind = model.analysis;
    let selected: Vec<_> = result.series.iter().take(config.mode_count).collect();

    let mut sections = Vec::with_capacity(selected.len() + 2);

    let curves = selected
        .iter()
        .enumerate()
        .map(|(color_index, series)| {
            let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
            let mut previous_step: Option<usize> = None;
            for point in &series.points {
                let sample = (point.parameter, ordinate(kind, point.value));
                match previous_step {
                    Some(last) if point.step == last + 1 => {
                        segments.last_mut().expect("segment started").push(sample);
                    }
                    _ => segments.push(vec![sample]),
                }
                previous_step = Some(point.step);
            }
            Curve {
                label: format!("mode {}", series.id + 1),
                segments,
                color_index,
            }
        })
        .collect();
    sections.push(Section::CurvePlot(CurveFigure {
        title: format!("{} vs strip length", ordinate_label(kind)),
        x_label: "strip length a [mm]".into(),
        y_label: ordinate_label(kind).into(),
        curves,
    }));

    let positions = model.geometry.nodal_positions();
    let block_dofs = model.geometry.dof_count();
    for (color_index, series) in selected.iter().enumerate() {
        let representative = &series.points[series.points.len() / 2];
        let mut amplitudes = deflection_profile(&representative.vector, block_dofs);
        let peak = amplitudes
            .iter()
            .fold(0.0f64, |acc, w| acc.max(w.abs()))
            .max(f64::MIN_POSITIVE);
        for w in &mut amplitudes {
            *w /= peak;
        }
        sections.push(Section::ShapePlot(ShapeFigure {
            title: format!(
                "mode {} shape at a = {:.1} mm (half-wave m = {})",
                series.id + 1,
                representative.parameter,
                dominant_half_wave(&representative.vector, block_dofs),
            ),
            profile: positions.iter().copied().zip(amplitudes).collect(),
            color_index,
        }));
    }

    let rows = selected
        .iter()
        .map(|series| {
            let (a_first, a_last) = series.parameter_span();
            let (lo, hi) = series.value_range();
            let last = series.last_point();
            vec![
                format!("{}", series.id + 1),
                format!("{a_first:.1}"),
                format!("{a_last:.1}"),
                format!("{:.4e}", ordinate(kind, lo)),
                format!("{:.4e}", ordinate(kind, hi)),
                format!("{}", dominant_half_wave(&last.vector, block_dofs)),
                if series.is_open() { "open" } else { "lost" }.into(),
            ]
        })
        .collect();
    sections.push(Section::Table(SummaryTable {
        title: "Tracked mode summary".into(),
        header: vec![
            "mode".into(),
            "a first [mm]".into(),
            "a last [mm]".into(),
            "min".into(),
            "max".into(),
            "m dom".into(),
            "state".into(),
        ],
        rows,
    }));

    info!(
        "Assembled report ({} sections) in {:.3} second(s)",
        sections.len(),
        start.elapsed().as_secs_f64()
    );
    ReportDocument {
        title: match kind {
            AnalysisKind::FreeVibration => "Free vibration modal analysis".into(),
            AnalysisKind::Buckling => "Buckling modal analysis".into(),
        },
        sections,
    }
}

/// External rendering boundary: accepts a finished document and a
/// destination path.
pub trait ReportSink {
    /// Render the document to `path`. Partial output is an error, never a
    /// silent success.
    fn write(&mut self, document: &ReportDocument, path: &Path) -> Result<()>;
}

/// Plotters-backed sink rendering the whole document into one SVG file,
/// one page-sized sub-area per section.
#[derive(Debug, Clone, Copy)]
pub struct SvgReportSink {
    style: PlotStyle,
    dpi: u32,
}

impl SvgReportSink {
    /// Sink using the document-wide style and resolution.
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            style: config.style,
            dpi: config.dpi.max(36),
        }
    }
}

fn draw_error(err: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::ReportWrite(err.to_string())
}

impl ReportSink for SvgReportSink {
    fn write(&mut self, document: &ReportDocument, path: &Path) -> Result<()> {
        if document.sections.is_empty() {
            return Err(AnalysisError::ReportWrite(
                "document contains no sections".into(),
            ));
        }
        let start = std::time::Instant::now();
        info!("Writing report to '{}'...", path.display());

        let page_w = (PAGE_SIZE_IN.0 * self.dpi as f64) as u32;
        let page_h = (PAGE_SIZE_IN.1 * self.dpi as f64) as u32;
        let total_h = page_h * document.sections.len() as u32;

        let root = SVGBackend::new(path, (page_w, total_h)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;
        let pages = root.split_evenly((document.sections.len(), 1));

        for (page, section) in pages.iter().zip(&document.sections) {
            match section {
                Section::CurvePlot(figure) => self.draw_curves(page, figure)?,
                Section::ShapePlot(figure) => self.draw_shape(page, figure)?,
                Section::Table(table) => self.draw_table(page, table)?,
            }
        }

        root.present().map_err(draw_error)?;
        info!(
            "Report written in {:.3} second(s)",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}

type Page<'a> = DrawingArea<SVGBackend<'a>, plotters::coord::Shift>;

impl SvgReportSink {
    fn draw_curves(&self, page: &Page<'_>, figure: &CurveFigure) -> Result<()> {
        let samples: Vec<(f64, f64)> = figure
            .curves
            .iter()
            .flat_map(|c| c.segments.iter().flatten().copied())
            .collect();
        if samples.is_empty() {
            return Ok(());
        }
        let (mut x_lo, mut x_hi) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_lo, mut y_hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for (x, y) in &samples {
            x_lo = x_lo.min(*x);
            x_hi = x_hi.max(*x);
            y_lo = y_lo.min(*y);
            y_hi = y_hi.max(*y);
        }
        let y_pad = ((y_hi - y_lo) * 0.05).max(y_hi.abs() * 1e-3).max(1e-12);
        let x_pad = ((x_hi - x_lo) * 0.02).max(x_hi.abs() * 1e-3).max(1e-12);

        let mut chart = ChartBuilder::on(page)
            .caption(&figure.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(
                (x_lo - x_pad)..(x_hi + x_pad),
                (y_lo - y_pad)..(y_hi + y_pad),
            )
            .map_err(draw_error)?;
        chart
            .configure_mesh()
            .x_desc(figure.x_label.clone())
            .y_desc(figure.y_label.clone())
            .draw()
            .map_err(draw_error)?;

        for curve in &figure.curves {
            let color = self.style.series_color(curve.color_index);
            for (seg_idx, segment) in curve.segments.iter().enumerate() {
                let drawn = chart
                    .draw_series(LineSeries::new(segment.iter().copied(), &color))
                    .map_err(draw_error)?;
                if seg_idx == 0 {
                    drawn.label(curve.label.clone()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color)
                    });
                }
            }
        }
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_error)?;
        Ok(())
    }

    fn draw_shape(&self, page: &Page<'_>, figure: &ShapeFigure) -> Result<()> {
        if figure.profile.is_empty() {
            return Ok(());
        }
        let x_lo = figure.profile.first().expect("non-empty").0;
        let x_hi = figure.profile.last().expect("non-empty").0;
        let mut chart = ChartBuilder::on(page)
            .caption(&figure.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x_lo..x_hi, -1.1f64..1.1f64)
            .map_err(draw_error)?;
        chart
            .configure_mesh()
            .x_desc("cross-section position [mm]")
            .y_desc("normalized deflection w")
            .draw()
            .map_err(draw_error)?;

        let color = self.style.series_color(figure.color_index);
        chart
            .draw_series(LineSeries::new(figure.profile.iter().copied(), &color))
            .map_err(draw_error)?;
        chart
            .draw_series(
                figure
                    .profile
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )
            .map_err(draw_error)?;
        Ok(())
    }

    fn draw_table(&self, page: &Page<'_>, table: &SummaryTable) -> Result<()> {
        let mut widths: Vec<usize> = table.header.iter().map(|h| h.len()).collect();
        for row in &table.rows {
            for (col, cell) in row.iter().enumerate() {
                if col < widths.len() {
                    widths[col] = widths[col].max(cell.len());
                }
            }
        }
        let format_row = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:>width$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };

        page.draw(&Text::new(
            table.title.clone(),
            (40, 30),
            ("sans-serif", 24).into_font(),
        ))
        .map_err(draw_error)?;

        let mut y = 80;
        let line_height = 24;
        page.draw(&Text::new(
            format_row(&table.header),
            (40, y),
            ("monospace", 16).into_font(),
        ))
        .map_err(draw_error)?;
        y += line_height + 6;
        for row in &table.rows {
            page.draw(&Text::new(
                format_row(row),
                (40, y),
                ("monospace", 16).into_font(),
            ))
            .map_err(draw_error)?;
            y += line_height;
        }
        Ok(())
    }
}
