//! Structural model definition, parameter sweep, and the model-file loader
//! boundary.
//!
//! A model describes a prismatic assembly of flat strips (the cross-section)
//! together with material properties and edge supports. The strip length `a`
//! is the swept parameter; everything else is fixed across the sweep.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::types::{AnalysisKind, DOF_PER_NODAL_LINE};

/// Isotropic material of the strip assembly. Units follow the original
/// engineering convention: mm, N, MPa, tonne/mm^3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Material {
    /// Elastic modulus E [MPa].
    pub elastic_modulus: f64,
    /// Poisson's ratio nu [-].
    pub poisson_ratio: f64,
    /// Mass density rho [t/mm^3].
    pub density: f64,
}

impl Material {
    /// Plate flexural rigidity D = E t^3 / (12 (1 - nu^2)) for thickness `t`.
    pub fn flexural_rigidity(&self, thickness: f64) -> f64 {
        self.elastic_modulus * thickness.powi(3) / (12.0 * (1.0 - self.poisson_ratio.powi(2)))
    }
}

/// Support condition applied at the two longitudinal side edges of the
/// cross-section (the first and last nodal line). The loaded ends are always
/// simply supported, which is what makes the half-wave expansion exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSupport {
    /// Side edges free to deflect and rotate.
    #[default]
    Free,
    /// Transverse deflection w restrained at both side edges.
    Pinned,
    /// Deflection and rotation restrained at both side edges.
    Clamped,
}

/// Cross-section geometry: a chain of flat strips joined at nodal lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripGeometry {
    /// Width of each strip [mm], in chain order.
    pub widths: Vec<f64>,
    /// Thickness of each strip [mm], matching `widths`.
    pub thicknesses: Vec<f64>,
}

impl StripGeometry {
    /// Build a geometry, validating that widths/thicknesses are paired and
    /// strictly positive.
    pub fn new(widths: Vec<f64>, thicknesses: Vec<f64>) -> Result<Self> {
        if widths.is_empty() {
            return Err(AnalysisError::Configuration(
                "cross-section must contain at least one strip".into(),
            ));
        }
        if widths.len() != thicknesses.len() {
            return Err(AnalysisError::Configuration(format!(
                "{} strip widths but {} thicknesses",
                widths.len(),
                thicknesses.len()
            )));
        }
        if let Some(bad) = widths
            .iter()
            .chain(thicknesses.iter())
            .find(|v| !v.is_finite() || **v <= 0.0)
        {
            return Err(AnalysisError::Configuration(format!(
                "strip dimensions must be positive and finite (got {bad})"
            )));
        }
        Ok(Self {
            widths,
            thicknesses,
        })
    }

    /// Uniform cross-section of `count` strips with shared width/thickness.
    pub fn uniform(count: usize, width: f64, thickness: f64) -> Result<Self> {
        Self::new(vec![width; count], vec![thickness; count])
    }

    /// Number of strips in the chain.
    pub fn strip_count(&self) -> usize {
        self.widths.len()
    }

    /// Number of nodal lines (strip joints plus the two side edges).
    pub fn nodal_line_count(&self) -> usize {
        self.widths.len() + 1
    }

    /// Degrees of freedom of one half-wave block.
    pub fn dof_count(&self) -> usize {
        self.nodal_line_count() * DOF_PER_NODAL_LINE
    }

    /// Transverse positions of the nodal lines along the cross-section arc.
    pub fn nodal_positions(&self) -> Vec<f64> {
        let mut positions = Vec::with_capacity(self.nodal_line_count());
        let mut x = 0.0;
        positions.push(x);
        for w in &self.widths {
            x += w;
            positions.push(x);
        }
        positions
    }
}

/// The structural model handed to the eigensolver at each parameter value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Cross-section geometry.
    pub geometry: StripGeometry,
    /// Isotropic material.
    pub material: Material,
    /// Side-edge support condition.
    #[serde(default)]
    pub edge_support: EdgeSupport,
    /// Which eigenproblem to assemble.
    #[serde(default)]
    pub analysis: AnalysisKind,
    /// Uniform axial compressive stress [MPa] used to scale the geometric
    /// stiffness in buckling analysis. Ignored for free vibration.
    #[serde(default = "default_reference_stress")]
    pub reference_stress: f64,
}

fn default_reference_stress() -> f64 {
    1.0
}

/// Ordered sequence of swept parameter values (strip lengths a [mm]).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSweep {
    values: Vec<f64>,
}

impl ParameterSweep {
    /// Build a sweep from explicit values; they must be finite, positive,
    /// strictly increasing, and non-empty.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(AnalysisError::Configuration(
                "parameter sweep must contain at least one value".into(),
            ));
        }
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(AnalysisError::Configuration(
                "sweep values must be positive and finite".into(),
            ));
        }
        if values.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AnalysisError::Configuration(
                "sweep values must be strictly increasing".into(),
            ));
        }
        Ok(Self { values })
    }

    /// Evenly spaced sweep over [a_min, a_max] with `steps` points.
    pub fn linspace(a_min: f64, a_max: f64, steps: usize) -> Result<Self> {
        if steps == 0 {
            return Err(AnalysisError::Configuration(
                "sweep must have at least one step".into(),
            ));
        }
        if !(a_min.is_finite() && a_max.is_finite()) || a_min <= 0.0 || a_max < a_min {
            return Err(AnalysisError::Configuration(format!(
                "invalid sweep bounds [{a_min}, {a_max}]"
            )));
        }
        if steps == 1 {
            return Self::new(vec![a_min]);
        }
        let h = (a_max - a_min) / (steps - 1) as f64;
        Self::new((0..steps).map(|i| a_min + h * i as f64).collect())
    }

    /// Narrow the sweep to `[a_min, a_max]`, keeping order. `None` bounds
    /// leave that side open. Errors if nothing survives the clip.
    pub fn clip(&self, a_min: Option<f64>, a_max: Option<f64>) -> Result<Self> {
        let lo = a_min.unwrap_or(f64::NEG_INFINITY);
        let hi = a_max.unwrap_or(f64::INFINITY);
        let values: Vec<f64> = self
            .values
            .iter()
            .copied()
            .filter(|a| *a >= lo && *a <= hi)
            .collect();
        if values.is_empty() {
            return Err(AnalysisError::Configuration(format!(
                "clip [{lo}, {hi}] leaves no sweep values"
            )));
        }
        Self::new(values)
    }

    /// The swept values in order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of sweep steps.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// A sweep is never empty by construction.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Declared sweep range persisted alongside the model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SweepSpec {
    /// Minimum strip length a [mm].
    pub a_min: f64,
    /// Maximum strip length a [mm].
    pub a_max: f64,
    /// Number of sweep points.
    pub steps: usize,
}

/// On-disk model artifact: the model plus its declared sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    /// The structural model.
    pub model: Model,
    /// Declared parameter sweep.
    pub sweep: SweepSpec,
}

/// Load a persisted model artifact, returning the model and its sweep.
pub fn load_model(path: &Path) -> Result<(Model, ParameterSweep)> {
    let start = std::time::Instant::now();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AnalysisError::Configuration(format!("cannot read model file '{}': {e}", path.display()))
    })?;
    let file: ModelFile = serde_json::from_str(&raw).map_err(|e| {
        AnalysisError::Configuration(format!("malformed model file '{}': {e}", path.display()))
    })?;
    // Surface geometry errors at load time rather than at the first solve.
    StripGeometry::new(
        file.model.geometry.widths.clone(),
        file.model.geometry.thicknesses.clone(),
    )?;
    let sweep = ParameterSweep::linspace(file.sweep.a_min, file.sweep.a_max, file.sweep.steps)?;
    log::info!(
        "Loaded model from '{}' in {:.3} second(s)",
        path.display(),
        start.elapsed().as_secs_f64()
    );
    Ok((file.model, sweep))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> Material {
        Material {
            elastic_modulus: 210_000.0,
            poisson_ratio: 0.3,
            density: 7.85e-9,
        }
    }

    #[test]
    fn sweep_rejects_empty_and_unsorted_values() {
        assert!(ParameterSweep::new(vec![]).is_err());
        assert!(ParameterSweep::new(vec![2.0, 1.0]).is_err());
        assert!(ParameterSweep::new(vec![1.0, 1.0]).is_err());
        assert!(ParameterSweep::new(vec![1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn linspace_covers_bounds() {
        let sweep = ParameterSweep::linspace(100.0, 500.0, 5).unwrap();
        assert_eq!(sweep.values(), &[100.0, 200.0, 300.0, 400.0, 500.0]);
        assert!(ParameterSweep::linspace(500.0, 100.0, 5).is_err());
        assert!(ParameterSweep::linspace(100.0, 500.0, 0).is_err());
    }

    #[test]
    fn clip_narrows_and_rejects_empty_result() {
        let sweep = ParameterSweep::linspace(100.0, 500.0, 5).unwrap();
        let clipped = sweep.clip(Some(150.0), Some(450.0)).unwrap();
        assert_eq!(clipped.values(), &[200.0, 300.0, 400.0]);
        assert!(sweep.clip(Some(600.0), None).is_err());
    }

    #[test]
    fn geometry_validation_and_dof_count() {
        let geom = StripGeometry::uniform(4, 50.0, 2.0).unwrap();
        assert_eq!(geom.nodal_line_count(), 5);
        assert_eq!(geom.dof_count(), 10);
        assert_eq!(geom.nodal_positions(), vec![0.0, 50.0, 100.0, 150.0, 200.0]);
        assert!(StripGeometry::new(vec![50.0], vec![]).is_err());
        assert!(StripGeometry::new(vec![-1.0], vec![2.0]).is_err());
    }

    #[test]
    fn flexural_rigidity_matches_hand_calculation() {
        let d = material().flexural_rigidity(2.0);
        let expected = 210_000.0 * 8.0 / (12.0 * (1.0 - 0.09));
        assert!((d - expected).abs() < 1e-9);
    }
}
