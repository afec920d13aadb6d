//! Persisted diffractometer configuration document.
//!
//! The on-disk key set (including the Python-era `python_class` and
//! `hklpy_version` names) is kept verbatim so documents written by the
//! original acquisition toolchain restore unchanged.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constraints::AxisConstraint;
use crate::domain::{DcResult, ValidationReport};

/// Unit-cell edge lengths must stay strictly inside this range, in the
/// same length units as the wavelength.
pub const LATTICE_LENGTH_MIN: f64 = 1e-6;
pub const LATTICE_LENGTH_MAX: f64 = 1e6;

/// Six unit-cell parameters: edge lengths a, b, c and angles alpha, beta,
/// gamma (degrees, strictly between 0 and 180).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatticeConfig {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl LatticeConfig {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> DcResult<Self> {
        let lattice = Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        };
        let mut report = ValidationReport::new();
        lattice.validate_into("lattice", &mut report);
        report.into_result()?;
        Ok(lattice)
    }

    pub fn cubic(edge: f64) -> DcResult<Self> {
        Self::new(edge, edge, edge, 90.0, 90.0, 90.0)
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.alpha, self.beta, self.gamma]
    }

    pub fn from_array(values: [f64; 6]) -> Self {
        Self {
            a: values[0],
            b: values[1],
            c: values[2],
            alpha: values[3],
            beta: values[4],
            gamma: values[5],
        }
    }

    pub(crate) fn validate_into(&self, field: &str, report: &mut ValidationReport) {
        for (side, value) in [("a", self.a), ("b", self.b), ("c", self.c)] {
            report.check_range_exclusive(
                &format!("{field} side {side}"),
                value,
                LATTICE_LENGTH_MIN,
                LATTICE_LENGTH_MAX,
            );
        }
        for (angle, value) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
        ] {
            report.check_range_exclusive(&format!("{field} angle {angle}"), value, 0.0, 180.0);
        }
    }
}

/// One measured reflection: named reciprocal and real coordinates plus the
/// wavelength it was measured at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReflectionConfig {
    /// Reciprocal-space coordinates keyed by pseudo-axis name.
    pub reflection: BTreeMap<String, f64>,
    /// Real-space coordinates keyed by canonical axis name.
    pub position: BTreeMap<String, f64>,
    /// Angstrom.
    pub wavelength: f64,
    /// Whether this reflection participated in the most recent UB
    /// computation.
    pub orientation_reflection: bool,
    /// Legacy engine flag, carried verbatim.
    pub flag: i32,
}

impl ReflectionConfig {
    /// Largest physically meaningful reciprocal coordinate magnitude for
    /// this reflection's wavelength.
    pub fn q_max(&self) -> f64 {
        4.0 * PI / self.wavelength
    }

    fn validate_into(
        &self,
        field: &str,
        reciprocal_axes: &[String],
        canonical_axes: &[String],
        report: &mut ValidationReport,
    ) {
        report.check_range_exclusive(
            &format!("{field} wavelength"),
            self.wavelength,
            LATTICE_LENGTH_MIN,
            LATTICE_LENGTH_MAX,
        );

        check_axis_map(
            &format!("{field} reflection"),
            &self.reflection,
            reciprocal_axes,
            report,
        );
        check_axis_map(
            &format!("{field} position"),
            &self.position,
            canonical_axes,
            report,
        );

        if self.wavelength > 0.0 {
            let q_max = self.q_max();
            for (axis, value) in &self.reflection {
                if value.abs() > q_max {
                    report.fail(
                        format!("{field} reflection {axis}"),
                        format!("magnitude at most q_max = {q_max:.6}"),
                        value.to_string(),
                    );
                }
            }
        }
    }
}

fn check_axis_map(
    field: &str,
    map: &BTreeMap<String, f64>,
    names: &[String],
    report: &mut ValidationReport,
) {
    for axis in map.keys() {
        if !names.contains(axis) {
            report.fail(
                format!("{field} axis {axis}"),
                format!("one of {names:?}"),
                axis.clone(),
            );
        }
    }
    for name in names {
        if !map.contains_key(name) {
            report.fail(
                format!("{field} axis {name}"),
                "a coordinate for every axis",
                "missing",
            );
        }
    }
}

/// One sample: lattice, ordered reflection list, orientation matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleConfig {
    pub name: String,
    pub lattice: LatticeConfig,
    /// Insertion order is significant: it decides which reflections pair
    /// up for UB on restore.
    pub reflections: Vec<ReflectionConfig>,
    /// Crystal orientation matrix; optional on input.
    #[serde(rename = "U", default)]
    pub u: Vec<Vec<f64>>,
    #[serde(rename = "UB")]
    pub ub: Vec<Vec<f64>>,
}

impl SampleConfig {
    fn validate_into(
        &self,
        field: &str,
        reciprocal_axes: &[String],
        canonical_axes: &[String],
        report: &mut ValidationReport,
    ) {
        if self.name.trim().is_empty() {
            report.fail(format!("{field} name"), "non-empty name", "empty string");
        }
        self.lattice.validate_into(&format!("{field} lattice"), report);
        for (index, reflection) in self.reflections.iter().enumerate() {
            reflection.validate_into(
                &format!("{field} reflections[{index}]"),
                reciprocal_axes,
                canonical_axes,
                report,
            );
        }
        if !self.u.is_empty() {
            check_matrix_shape(&format!("{field} U"), &self.u, report);
        }
        check_matrix_shape(&format!("{field} UB"), &self.ub, report);
    }
}

fn check_matrix_shape(field: &str, matrix: &[Vec<f64>], report: &mut ValidationReport) {
    let square = matrix.len() == 3 && matrix.iter().all(|row| row.len() == 3);
    if !square {
        let rows = matrix.len();
        let cols: Vec<usize> = matrix.iter().map(Vec::len).collect();
        report.fail(field, "3x3 matrix", format!("{rows} row(s) with {cols:?} column(s)"));
    }
}

/// Complete self-describing snapshot of one diffractometer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationDocument {
    #[serde(default)]
    pub name: String,
    pub geometry: String,
    /// Regenerated on every capture; excluded from round-trip identity.
    #[serde(default)]
    pub datetime: String,
    #[serde(default)]
    pub python_class: String,
    pub engine: String,
    pub mode: String,
    #[serde(default)]
    pub hklpy_version: String,
    pub library: String,
    #[serde(default)]
    pub library_version: String,
    #[serde(rename = "energy_keV", default)]
    pub energy_kev: f64,
    #[serde(default)]
    pub wavelength_angstrom: f64,
    pub constraints: BTreeMap<String, AxisConstraint>,
    pub samples: BTreeMap<String, SampleConfig>,
    pub canonical_axes: Vec<String>,
    pub real_axes: Vec<String>,
    pub reciprocal_axes: Vec<String>,
}

impl ConfigurationDocument {
    /// Semantic checks that need no live diffractometer: value ranges,
    /// matrix shapes, axis cross-references within the document itself.
    /// Collects every violation before failing.
    pub fn validate_internal(&self) -> DcResult<()> {
        let mut report = ValidationReport::new();
        self.validate_internal_into(&mut report);
        report.into_result()
    }

    pub(crate) fn validate_internal_into(&self, report: &mut ValidationReport) {
        if self.canonical_axes.len() != self.real_axes.len() {
            report.fail(
                "real_axes",
                format!(
                    "{} name(s), matching canonical_axes",
                    self.canonical_axes.len()
                ),
                format!("{} name(s)", self.real_axes.len()),
            );
        }

        for (axis, constraint) in &self.constraints {
            if !self.canonical_axes.contains(axis) && !self.real_axes.contains(axis) {
                report.fail(
                    format!("constraints {axis}"),
                    format!("axis among {:?} or {:?}", self.canonical_axes, self.real_axes),
                    axis.clone(),
                );
            }
            constraint.validate_into(&format!("constraints {axis}"), report);
        }

        for (name, sample) in &self.samples {
            if name != &sample.name {
                report.fail(
                    format!("samples {name} name"),
                    format!("key {name:?}"),
                    sample.name.clone(),
                );
            }
            sample.validate_into(
                &format!("samples {name}"),
                &self.reciprocal_axes,
                &self.canonical_axes,
                report,
            );
        }
    }
}
