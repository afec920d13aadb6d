//! Acceptance limits on forward() solutions, with undo/reset history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AX_MAX, AX_MIN, DcResult, ValidationReport};
use crate::oracle::GeometryOracle;

/// Limitations on acceptable positions from computed forward() solutions.
///
/// `value` is the constant used when the engine mode holds the axis fixed.
/// `fit` is carried for compatibility with stored configurations; it is
/// consulted only by UB refinement, never by forward solving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConstraint {
    pub low_limit: f64,
    pub high_limit: f64,
    pub value: f64,
    pub fit: bool,
}

impl AxisConstraint {
    pub fn new(low_limit: f64, high_limit: f64, value: f64, fit: bool) -> DcResult<Self> {
        let constraint = Self {
            low_limit,
            high_limit,
            value,
            fit,
        };
        let mut report = ValidationReport::new();
        constraint.validate_into("constraint", &mut report);
        report.into_result()?;
        Ok(constraint)
    }

    /// Default installed by a baseline reset.
    pub fn full_rotation() -> Self {
        Self {
            low_limit: -180.0,
            high_limit: 180.0,
            value: 0.0,
            fit: true,
        }
    }

    pub fn contains(&self, position: f64) -> bool {
        self.low_limit <= position && position <= self.high_limit
    }

    pub(crate) fn validate_into(&self, field: &str, report: &mut ValidationReport) {
        if self.low_limit > self.high_limit {
            report.fail(
                format!("{field} low_limit"),
                format!("at most high_limit ({})", self.high_limit),
                self.low_limit.to_string(),
            );
        }
        report.check_range(&format!("{field} low_limit"), self.low_limit, AX_MIN, AX_MAX);
        report.check_range(
            &format!("{field} high_limit"),
            self.high_limit,
            AX_MIN,
            AX_MAX,
        );
        report.check_range(&format!("{field} value"), self.value, AX_MIN, AX_MAX);
    }
}

/// One full set of per-axis constraints, keyed by canonical axis name.
pub type ConstraintSet = BTreeMap<String, AxisConstraint>;

/// Undo history for an oracle's axis constraints.
///
/// `apply` pushes the current live set before installing the new one, so
/// both stepwise undo and a reset to the very first configuration stay
/// available. Undo and reset with an empty history are no-ops.
#[derive(Debug, Default)]
pub struct ConstraintManager {
    stack: Vec<ConstraintSet>,
}

impl ConstraintManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn snapshot(oracle: &dyn GeometryOracle) -> DcResult<ConstraintSet> {
        let mut set = ConstraintSet::new();
        for axis in oracle.canonical_axis_names().to_vec() {
            set.insert(axis.clone(), oracle.axis_constraint(&axis)?);
        }
        Ok(set)
    }

    fn install(oracle: &mut dyn GeometryOracle, set: &ConstraintSet) -> DcResult<()> {
        for (axis, constraint) in set {
            oracle.set_axis_constraint(axis, *constraint)?;
        }
        Ok(())
    }

    /// Install `new` after saving the current constraints onto the stack.
    pub fn apply(&mut self, oracle: &mut dyn GeometryOracle, new: &ConstraintSet) -> DcResult<()> {
        self.stack.push(Self::snapshot(oracle)?);
        Self::install(oracle, new)
    }

    /// Restore the most recently saved constraint set.
    pub fn undo_last(&mut self, oracle: &mut dyn GeometryOracle) -> DcResult<()> {
        match self.stack.pop() {
            Some(previous) => Self::install(oracle, &previous),
            None => Ok(()),
        }
    }

    /// Restore the very first saved constraint set and clear the history.
    pub fn reset_to_baseline(&mut self, oracle: &mut dyn GeometryOracle) -> DcResult<()> {
        if self.stack.is_empty() {
            return Ok(());
        }
        let baseline = self.stack.swap_remove(0);
        self.stack.clear();
        Self::install(oracle, &baseline)
    }
}
