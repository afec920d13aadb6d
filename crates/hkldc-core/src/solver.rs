//! Iterative forward-path solving.
//!
//! The engine can only answer "solve this exact pseudo position"; when a
//! target is unreachable the solver walks the straight line from a known
//! start, backing off halfway on every failure and advancing halfway
//! toward the target on every success, using the engine as an oracle at
//! each probe.

use tracing::debug;

use crate::domain::{DcError, DcResult};
use crate::oracle::{GeometryOracle, with_physical_position_restored};

/// Iterative reachability solver for pseudo-space trajectories.
#[derive(Debug, Clone, Copy)]
pub struct PathSolver {
    pub max_iters: u32,
    /// Fraction of the start-to-end distance that counts as arrived.
    pub threshold: f64,
}

impl PathSolver {
    pub fn new(max_iters: u32) -> Self {
        Self {
            max_iters,
            threshold: 0.99,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Attempt to move the oracle's pseudo position from `start` to `end`,
    /// picking the first enumerated solution at every committed step.
    ///
    /// Returns the solution list for `end` once it is reachable. The
    /// oracle's physical position is restored on every exit path; only the
    /// returned solutions tell the caller where the motors could go.
    pub fn solve<O>(&self, oracle: &mut O, start: &[f64], end: &[f64]) -> DcResult<Vec<Vec<f64>>>
    where
        O: GeometryOracle + ?Sized,
    {
        self.solve_with(oracle, start, end, |_, solutions| solutions[0].clone())
    }

    /// `solve` with a caller-supplied choice among enumerated solutions.
    pub fn solve_with<O>(
        &self,
        oracle: &mut O,
        start: &[f64],
        end: &[f64],
        mut decide: impl FnMut(&[f64], &[Vec<f64>]) -> Vec<f64>,
    ) -> DcResult<Vec<Vec<f64>>>
    where
        O: GeometryOracle + ?Sized,
    {
        with_physical_position_restored(oracle, |oracle| {
            self.run(oracle, start, end, &mut decide)
        })
    }

    fn run<O>(
        &self,
        oracle: &mut O,
        start: &[f64],
        end: &[f64],
        decide: &mut dyn FnMut(&[f64], &[Vec<f64>]) -> Vec<f64>,
    ) -> DcResult<Vec<Vec<f64>>>
    where
        O: GeometryOracle + ?Sized,
    {
        // t: fraction of the way from start to end currently probed;
        // min_t: largest fraction proven reachable so far.
        let mut t = 1.0_f64;
        let mut min_t = 0.0_f64;
        let mut iters = 0_u32;
        let mut valid_pseudo: Option<Vec<f64>> = None;
        let mut valid_real: Option<Vec<f64>> = None;

        while iters < self.max_iters {
            let probe = interpolate(start, end, t);
            match oracle.set_pseudo_positions(&probe) {
                Err(_) => {
                    // unreachable probe: step back halfway toward the last
                    // proven-good fraction
                    t = (min_t + t) / 2.0;
                    debug!(t, min_t, "probe failed, backing off");
                }
                Ok(()) => {
                    if t > min_t {
                        min_t = t;
                    }
                    t = (t + 1.0) / 2.0;

                    let pseudo = oracle.pseudo_positions();
                    let solutions = oracle.solutions();
                    if solutions.is_empty() {
                        return Err(DcError::Calculation(format!(
                            "forward solve for {pseudo:?} produced no candidate solutions"
                        )));
                    }
                    let chosen = decide(&pseudo, &solutions);
                    // commit the chosen solution so the next probe starts
                    // from here; the outer guard restores the motors later
                    oracle.set_physical_positions(&chosen)?;
                    valid_pseudo = Some(pseudo);
                    valid_real = Some(chosen);

                    if t >= self.threshold {
                        break;
                    }
                }
            }
            iters += 1;
        }

        match oracle.set_pseudo_positions(end) {
            Ok(()) => {
                let solutions = oracle.solutions();
                if solutions.is_empty() {
                    return Err(DcError::Calculation(format!(
                        "forward solve for {end:?} produced no candidate solutions"
                    )));
                }
                Ok(solutions)
            }
            Err(_) => Err(DcError::Unreachable {
                iterations: iters,
                last_pseudo: valid_pseudo,
                last_real: valid_real,
            }),
        }
    }
}

/// Solve the forward calculation for one pseudo position, restoring the
/// physical position afterwards.
pub fn forward<O>(oracle: &mut O, pseudo: &[f64]) -> DcResult<Vec<Vec<f64>>>
where
    O: GeometryOracle + ?Sized,
{
    with_physical_position_restored(oracle, |oracle| {
        oracle.set_pseudo_positions(pseudo)?;
        Ok(oracle.solutions())
    })
}

/// Solve the inverse calculation for one real position, restoring the
/// physical position afterwards.
pub fn inverse<O>(oracle: &mut O, real: &[f64]) -> DcResult<Vec<f64>>
where
    O: GeometryOracle + ?Sized,
{
    with_physical_position_restored(oracle, |oracle| {
        oracle.set_physical_positions(real)?;
        Ok(oracle.pseudo_positions())
    })
}

/// Straight-line trajectory from `start` to `end` with `n` steps
/// (`n + 1` points, endpoints included).
pub fn linear_path(start: &[f64], end: &[f64], n: usize) -> Vec<Vec<f64>> {
    (0..=n)
        .map(|step| {
            let t = if n == 0 { 1.0 } else { step as f64 / n as f64 };
            interpolate(start, end, t)
        })
        .collect()
}

fn interpolate(start: &[f64], end: &[f64], t: f64) -> Vec<f64> {
    start
        .iter()
        .zip(end)
        .map(|(a, b)| (1.0 - t) * a + t * b)
        .collect()
}
