//! Boundary to the external geometry engine.
//!
//! The trigonometric solving itself (forward/inverse kinematics, UB
//! determination, solution enumeration) lives in a native library behind
//! this trait; this crate only orchestrates it. `sim` provides an
//! in-memory stand-in with plausible Bragg-style reachability for tests
//! and offline tooling.

pub mod sim;

use crate::constraints::AxisConstraint;
use crate::domain::{DcResult, PseudoPosition, RealPosition};

/// 3x3 orientation matrix payload. Entries are opaque to this crate; only
/// the shape is ever inspected.
pub type Matrix3 = [[f64; 3]; 3];

/// Identifies one reflection within its owning sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReflectionHandle(usize);

impl ReflectionHandle {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// One measured pseudo/real correspondence, as stored by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionSnapshot {
    /// Reciprocal coordinates in reciprocal-axis order.
    pub pseudo: Vec<f64>,
    /// Motor angles in canonical-axis order.
    pub real: Vec<f64>,
    pub wavelength: f64,
    pub orientation_reflection: bool,
    pub flag: i32,
}

/// Read-only view of one sample's engine state, consumed by capture.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSnapshot {
    pub name: String,
    /// a, b, c, alpha, beta, gamma.
    pub lattice: [f64; 6],
    pub reflections: Vec<ReflectionSnapshot>,
    pub u: Matrix3,
    pub ub: Matrix3,
}

/// The geometry engine surface this crate depends on.
///
/// Implementations own all mutable calculation state (current engine mode,
/// wavelength, positions, sample registry). The `&mut self` receivers give
/// single-writer exclusion, so no lock around the native library handle is
/// needed.
pub trait GeometryOracle {
    fn geometry_name(&self) -> &str;
    fn library_name(&self) -> &str;
    fn library_version(&self) -> &str;

    /// Device-level name of the diffractometer this oracle drives.
    fn controller_name(&self) -> &str;
    /// Concrete controller type, recorded in captured documents.
    fn controller_class(&self) -> &str;

    fn engine_name(&self) -> &str;
    fn engine_mode(&self) -> &str;
    fn engine_modes(&self) -> &[String];
    /// Fails when `mode` is not one of `engine_modes`.
    fn set_engine_mode(&mut self, mode: &str) -> DcResult<()>;

    fn pseudo_axis_names(&self) -> &[String];
    fn canonical_axis_names(&self) -> &[String];

    /// Current wavelength, angstrom.
    fn wavelength(&self) -> f64;
    fn set_wavelength(&mut self, angstrom: f64) -> DcResult<()>;

    fn pseudo_positions(&self) -> PseudoPosition;
    /// Solve the forward calculation for `positions`. On success the
    /// solution list is repopulated as a side effect; on an unreachable
    /// target this fails with a calculation error.
    fn set_pseudo_positions(&mut self, positions: &[f64]) -> DcResult<()>;

    fn physical_positions(&self) -> RealPosition;
    /// Move the real axes; recomputes pseudo positions as a side effect.
    fn set_physical_positions(&mut self, positions: &[f64]) -> DcResult<()>;

    /// Real-space candidates from the most recent successful
    /// `set_pseudo_positions` call, in engine order.
    fn solutions(&self) -> Vec<RealPosition>;

    fn axis_constraint(&self, canonical: &str) -> DcResult<AxisConstraint>;
    fn set_axis_constraint(&mut self, canonical: &str, constraint: AxisConstraint)
    -> DcResult<()>;

    fn sample_names(&self) -> Vec<String>;
    fn current_sample_name(&self) -> String;
    fn select_sample(&mut self, name: &str) -> DcResult<()>;
    fn new_sample(&mut self, name: &str, lattice: [f64; 6]) -> DcResult<()>;
    fn remove_sample(&mut self, name: &str) -> DcResult<()>;
    fn set_sample_lattice(&mut self, name: &str, lattice: [f64; 6]) -> DcResult<()>;
    fn sample_snapshot(&self, name: &str) -> DcResult<SampleSnapshot>;

    /// Record a measured reflection at the oracle's current wavelength.
    fn add_reflection(
        &mut self,
        sample: &str,
        pseudo: &[f64],
        real: &[f64],
    ) -> DcResult<ReflectionHandle>;

    /// Compute the sample's UB matrix from two non-collinear reflections.
    fn compute_ub(
        &mut self,
        sample: &str,
        first: ReflectionHandle,
        second: ReflectionHandle,
    ) -> DcResult<()>;
}

/// Run `body` with the oracle's physical position captured on entry and
/// restored on every exit path.
///
/// Routines that perturb the real axes to drive a calculation (forward
/// solving, path iteration) must leave the directly-addressable motor
/// position untouched; the derived solution list is returned to the caller
/// separately.
pub fn with_physical_position_restored<O, T>(
    oracle: &mut O,
    body: impl FnOnce(&mut O) -> DcResult<T>,
) -> DcResult<T>
where
    O: GeometryOracle + ?Sized,
{
    let saved = oracle.physical_positions();
    let outcome = body(oracle);
    let restored = oracle.set_physical_positions(&saved);
    match outcome {
        Ok(value) => restored.map(|()| value),
        Err(error) => Err(error),
    }
}

/// Run `body` with the oracle temporarily set to `wavelength`, restoring
/// the prior wavelength unconditionally, even when `body` fails.
pub fn with_wavelength<O, T>(
    oracle: &mut O,
    wavelength: f64,
    body: impl FnOnce(&mut O) -> DcResult<T>,
) -> DcResult<T>
where
    O: GeometryOracle + ?Sized,
{
    let saved = oracle.wavelength();
    oracle.set_wavelength(wavelength)?;
    let outcome = body(oracle);
    let restored = oracle.set_wavelength(saved);
    match outcome {
        Ok(value) => restored.map(|()| value),
        Err(error) => Err(error),
    }
}
