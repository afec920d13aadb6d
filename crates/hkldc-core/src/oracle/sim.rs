//! In-memory geometry oracle for tests and offline tooling.
//!
//! Models a four-circle vertical geometry with an `hkl` engine. The
//! reachability rule is a cubic-lattice Bragg condition: a pseudo target
//! is solvable when `sin(theta) = lambda * |hkl| / (2 a)` stays within
//! unity and at least one candidate solution passes the axis constraints.
//! UB handling is bookkeeping only; no orientation numerics are modeled.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::constraints::AxisConstraint;
use crate::domain::{DEFAULT_WAVELENGTH, DcError, DcResult, ValidationReport};
use crate::oracle::{
    GeometryOracle, Matrix3, ReflectionHandle, ReflectionSnapshot, SampleSnapshot,
};

const GEOMETRY_NAME: &str = "SIM4C";
const LIBRARY_NAME: &str = "simhkl";
const LIBRARY_VERSION: &str = "1.0.0";
const ENGINE_NAME: &str = "hkl";

const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

#[derive(Debug, Clone)]
struct SimReflection {
    pseudo: Vec<f64>,
    real: Vec<f64>,
    wavelength: f64,
    orientation_reflection: bool,
    flag: i32,
}

#[derive(Debug, Clone)]
struct SimSample {
    name: String,
    lattice: [f64; 6],
    reflections: Vec<SimReflection>,
    u: Matrix3,
    ub: Matrix3,
    ub_pair: Option<(usize, usize)>,
}

impl SimSample {
    fn new(name: &str, lattice: [f64; 6]) -> Self {
        Self {
            name: name.to_string(),
            lattice,
            reflections: Vec::new(),
            u: IDENTITY,
            ub: IDENTITY,
            ub_pair: None,
        }
    }
}

#[derive(Debug)]
pub struct SimulatedDiffractometer {
    controller_name: String,
    mode: String,
    modes: Vec<String>,
    pseudo_axes: Vec<String>,
    canonical_axes: Vec<String>,
    wavelength: f64,
    pseudo: Vec<f64>,
    physical: Vec<f64>,
    solutions: Vec<Vec<f64>>,
    constraints: BTreeMap<String, AxisConstraint>,
    samples: Vec<SimSample>,
    current_sample: String,
}

impl SimulatedDiffractometer {
    pub fn new() -> Self {
        Self::with_name("sim4c")
    }

    pub fn with_name(controller_name: &str) -> Self {
        let canonical_axes: Vec<String> = ["omega", "chi", "phi", "tth"]
            .iter()
            .map(|axis| axis.to_string())
            .collect();
        let constraints = canonical_axes
            .iter()
            .map(|axis| (axis.clone(), AxisConstraint::full_rotation()))
            .collect();
        let a0 = DEFAULT_WAVELENGTH;
        Self {
            controller_name: controller_name.to_string(),
            mode: "bissector".to_string(),
            modes: vec!["bissector".to_string(), "constant_phi".to_string()],
            pseudo_axes: ["h", "k", "l"].iter().map(|axis| axis.to_string()).collect(),
            canonical_axes,
            wavelength: DEFAULT_WAVELENGTH,
            pseudo: vec![0.0, 0.0, 0.0],
            physical: vec![0.0, 0.0, 0.0, 0.0],
            solutions: Vec::new(),
            constraints,
            samples: vec![SimSample::new("main", [a0, a0, a0, 90.0, 90.0, 90.0])],
            current_sample: "main".to_string(),
        }
    }

    /// Which reflection pair produced the sample's current UB matrix.
    pub fn ub_reflection_pair(&self, sample: &str) -> DcResult<Option<(usize, usize)>> {
        Ok(self.sample(sample)?.ub_pair)
    }

    fn sample(&self, name: &str) -> DcResult<&SimSample> {
        self.samples
            .iter()
            .find(|sample| sample.name == name)
            .ok_or_else(|| DcError::UnknownSample(name.to_string()))
    }

    fn sample_mut(&mut self, name: &str) -> DcResult<&mut SimSample> {
        self.samples
            .iter_mut()
            .find(|sample| sample.name == name)
            .ok_or_else(|| DcError::UnknownSample(name.to_string()))
    }

    fn cubic_edge(&self) -> f64 {
        self.sample(&self.current_sample)
            .map(|sample| sample.lattice[0])
            .unwrap_or(DEFAULT_WAVELENGTH)
    }

    fn bragg_theta_deg(&self, pseudo: &[f64]) -> DcResult<f64> {
        let magnitude = pseudo.iter().map(|value| value * value).sum::<f64>().sqrt();
        let sin_theta = self.wavelength * magnitude / (2.0 * self.cubic_edge());
        if sin_theta.abs() > 1.0 {
            return Err(DcError::Calculation(format!(
                "no Bragg solution for {pseudo:?}: sin(theta) = {sin_theta:.4}"
            )));
        }
        Ok(sin_theta.asin().to_degrees())
    }

    fn enumerate_solutions(&self, pseudo: &[f64]) -> DcResult<Vec<Vec<f64>>> {
        let theta = self.bragg_theta_deg(pseudo)?;
        let phi = if self.mode == "constant_phi" {
            self.constraints
                .get("phi")
                .map(|constraint| constraint.value)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let candidates = [
            vec![theta, 0.0, phi, 2.0 * theta],
            vec![-theta, 0.0, phi, -2.0 * theta],
        ];
        let solutions: Vec<Vec<f64>> = candidates
            .into_iter()
            .filter(|candidate| {
                self.canonical_axes.iter().zip(candidate).all(|(axis, value)| {
                    self.constraints
                        .get(axis)
                        .map(|constraint| constraint.contains(*value))
                        .unwrap_or(true)
                })
            })
            .collect();

        if solutions.is_empty() {
            return Err(DcError::Calculation(format!(
                "all solutions for {pseudo:?} rejected by constraints"
            )));
        }
        Ok(solutions)
    }
}

impl Default for SimulatedDiffractometer {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryOracle for SimulatedDiffractometer {
    fn geometry_name(&self) -> &str {
        GEOMETRY_NAME
    }

    fn library_name(&self) -> &str {
        LIBRARY_NAME
    }

    fn library_version(&self) -> &str {
        LIBRARY_VERSION
    }

    fn controller_name(&self) -> &str {
        &self.controller_name
    }

    fn controller_class(&self) -> &str {
        "SimulatedDiffractometer"
    }

    fn engine_name(&self) -> &str {
        ENGINE_NAME
    }

    fn engine_mode(&self) -> &str {
        &self.mode
    }

    fn engine_modes(&self) -> &[String] {
        &self.modes
    }

    fn set_engine_mode(&mut self, mode: &str) -> DcResult<()> {
        if !self.modes.iter().any(|known| known == mode) {
            let mut report = ValidationReport::new();
            report.fail("mode", format!("one of {:?}", self.modes), mode);
            return report.into_result();
        }
        self.mode = mode.to_string();
        Ok(())
    }

    fn pseudo_axis_names(&self) -> &[String] {
        &self.pseudo_axes
    }

    fn canonical_axis_names(&self) -> &[String] {
        &self.canonical_axes
    }

    fn wavelength(&self) -> f64 {
        self.wavelength
    }

    fn set_wavelength(&mut self, angstrom: f64) -> DcResult<()> {
        if angstrom <= 0.0 {
            return Err(DcError::Calculation(format!(
                "wavelength must be positive, received {angstrom}"
            )));
        }
        self.wavelength = angstrom;
        Ok(())
    }

    fn pseudo_positions(&self) -> Vec<f64> {
        self.pseudo.clone()
    }

    fn set_pseudo_positions(&mut self, positions: &[f64]) -> DcResult<()> {
        if positions.len() != self.pseudo_axes.len() {
            return Err(DcError::Calculation(format!(
                "expected {} pseudo values, received {}",
                self.pseudo_axes.len(),
                positions.len()
            )));
        }
        let solutions = self.enumerate_solutions(positions)?;
        self.pseudo = positions.to_vec();
        self.solutions = solutions;
        Ok(())
    }

    fn physical_positions(&self) -> Vec<f64> {
        self.physical.clone()
    }

    fn set_physical_positions(&mut self, positions: &[f64]) -> DcResult<()> {
        if positions.len() != self.canonical_axes.len() {
            return Err(DcError::Calculation(format!(
                "expected {} real values, received {}",
                self.canonical_axes.len(),
                positions.len()
            )));
        }
        self.physical = positions.to_vec();
        // inverse: recover |hkl| from the detector arm, direction unknown
        let theta = positions[3].to_radians() / 2.0;
        let magnitude = 2.0 * self.cubic_edge() * theta.sin() / self.wavelength;
        self.pseudo = vec![magnitude, 0.0, 0.0];
        Ok(())
    }

    fn solutions(&self) -> Vec<Vec<f64>> {
        self.solutions.clone()
    }

    fn axis_constraint(&self, canonical: &str) -> DcResult<AxisConstraint> {
        self.constraints
            .get(canonical)
            .copied()
            .ok_or_else(|| DcError::UnknownAxis(canonical.to_string()))
    }

    fn set_axis_constraint(
        &mut self,
        canonical: &str,
        constraint: AxisConstraint,
    ) -> DcResult<()> {
        if !self.constraints.contains_key(canonical) {
            return Err(DcError::UnknownAxis(canonical.to_string()));
        }
        self.constraints.insert(canonical.to_string(), constraint);
        Ok(())
    }

    fn sample_names(&self) -> Vec<String> {
        self.samples.iter().map(|sample| sample.name.clone()).collect()
    }

    fn current_sample_name(&self) -> String {
        self.current_sample.clone()
    }

    fn select_sample(&mut self, name: &str) -> DcResult<()> {
        self.sample(name)?;
        self.current_sample = name.to_string();
        Ok(())
    }

    fn new_sample(&mut self, name: &str, lattice: [f64; 6]) -> DcResult<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            let mut report = ValidationReport::new();
            report.fail("sample name", "non-empty name", "empty string");
            return report.into_result();
        }
        if self.samples.iter().any(|sample| sample.name == trimmed) {
            return Err(DcError::DuplicateSample(trimmed.to_string()));
        }
        self.samples.push(SimSample::new(trimmed, lattice));
        self.current_sample = trimmed.to_string();
        Ok(())
    }

    fn remove_sample(&mut self, name: &str) -> DcResult<()> {
        let index = self
            .samples
            .iter()
            .position(|sample| sample.name == name)
            .ok_or_else(|| DcError::UnknownSample(name.to_string()))?;
        self.samples.remove(index);
        if self.current_sample == name {
            self.current_sample = self
                .samples
                .first()
                .map(|sample| sample.name.clone())
                .unwrap_or_default();
        }
        Ok(())
    }

    fn set_sample_lattice(&mut self, name: &str, lattice: [f64; 6]) -> DcResult<()> {
        self.sample_mut(name)?.lattice = lattice;
        Ok(())
    }

    fn sample_snapshot(&self, name: &str) -> DcResult<SampleSnapshot> {
        let sample = self.sample(name)?;
        Ok(SampleSnapshot {
            name: sample.name.clone(),
            lattice: sample.lattice,
            reflections: sample
                .reflections
                .iter()
                .map(|reflection| ReflectionSnapshot {
                    pseudo: reflection.pseudo.clone(),
                    real: reflection.real.clone(),
                    wavelength: reflection.wavelength,
                    orientation_reflection: reflection.orientation_reflection,
                    flag: reflection.flag,
                })
                .collect(),
            u: sample.u,
            ub: sample.ub,
        })
    }

    fn add_reflection(
        &mut self,
        sample: &str,
        pseudo: &[f64],
        real: &[f64],
    ) -> DcResult<ReflectionHandle> {
        if pseudo.len() != self.pseudo_axes.len() || real.len() != self.canonical_axes.len() {
            return Err(DcError::Calculation(format!(
                "reflection arity mismatch: {} pseudo / {} real values",
                pseudo.len(),
                real.len()
            )));
        }
        if pseudo.iter().all(|value| *value == 0.0) {
            // the engine rejects the null vector, it carries no orientation
            return Err(DcError::Calculation(
                "reflection (0, 0, 0) carries no orientation information".to_string(),
            ));
        }
        let wavelength = self.wavelength;
        let target = self.sample_mut(sample)?;
        target.reflections.push(SimReflection {
            pseudo: pseudo.to_vec(),
            real: real.to_vec(),
            wavelength,
            orientation_reflection: false,
            flag: 1,
        });
        Ok(ReflectionHandle::new(target.reflections.len() - 1))
    }

    fn compute_ub(
        &mut self,
        sample: &str,
        first: ReflectionHandle,
        second: ReflectionHandle,
    ) -> DcResult<()> {
        let edge = {
            let target = self.sample(sample)?;
            let get = |handle: ReflectionHandle| {
                target.reflections.get(handle.index()).ok_or_else(|| {
                    DcError::Calculation(format!(
                        "no reflection {} in sample {sample:?}",
                        handle.index()
                    ))
                })
            };
            let r1 = get(first)?;
            let r2 = get(second)?;
            let cross_norm = cross_magnitude(&r1.pseudo, &r2.pseudo);
            if cross_norm < 1e-9 {
                return Err(DcError::Calculation(
                    "orientation reflections are collinear".to_string(),
                ));
            }
            target.lattice[0]
        };

        let scale = 2.0 * PI / edge;
        let target = self.sample_mut(sample)?;
        for (index, reflection) in target.reflections.iter_mut().enumerate() {
            reflection.orientation_reflection =
                index == first.index() || index == second.index();
        }
        target.u = IDENTITY;
        target.ub = [
            [scale, 0.0, 0.0],
            [0.0, scale, 0.0],
            [0.0, 0.0, scale],
        ];
        target.ub_pair = Some((first.index(), second.index()));
        Ok(())
    }
}

fn cross_magnitude(a: &[f64], b: &[f64]) -> f64 {
    let x = a[1] * b[2] - a[2] * b[1];
    let y = a[2] * b[0] - a[0] * b[2];
    let z = a[0] * b[1] - a[1] * b[0];
    (x * x + y * y + z * z).sqrt()
}
