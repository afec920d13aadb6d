//! Capture and restore of complete diffractometer state.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::axes::{AxisPresentation, AxisRegistry};
use crate::constraints::AxisConstraint;
use crate::domain::{DEFAULT_WAVELENGTH, DcError, DcResult, wavelength_to_energy_kev};
use crate::oracle::{GeometryOracle, ReflectionHandle, with_wavelength};

use super::io::{ExportFormat, detect_and_parse, serialize};
use super::model::{ConfigurationDocument, LatticeConfig, ReflectionConfig, SampleConfig};
use super::validate::validate_against_live;

/// Knobs for `apply`.
///
/// `clear` resets the diffractometer to the documented baseline before
/// restoring. `restore_constraints` overwrites every documented axis
/// constraint; with it off, live constraints survive the restore.
#[derive(Debug, Clone, Copy)]
pub struct RestoreOptions {
    pub clear: bool,
    pub restore_constraints: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            clear: true,
            restore_constraints: true,
        }
    }
}

/// Save and restore diffractometer configuration.
///
/// Holds the axis registry (canonical names plus user-facing
/// presentation); the live diffractometer is always an explicit parameter,
/// never ambient state. Renames and sign inversions are applied to every
/// value that crosses the document boundary: captured constraint sets and
/// reflection positions carry user names and user signs, and `apply` maps
/// them back to engine names and signs.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationModel {
    registry: AxisRegistry,
}

impl ConfigurationModel {
    pub fn new(registry: AxisRegistry) -> Self {
        Self { registry }
    }

    /// Model with no renames or inversions for `oracle`'s axes.
    pub fn for_oracle(oracle: &dyn GeometryOracle) -> Self {
        Self::new(AxisRegistry::from_oracle(oracle, AxisPresentation::new()))
    }

    pub fn registry(&self) -> &AxisRegistry {
        &self.registry
    }

    /// Read the full live state into a validated document. Read-only on
    /// `live`; a fresh document (with a fresh timestamp) on every call.
    pub fn capture(&self, live: &dyn GeometryOracle) -> DcResult<ConfigurationDocument> {
        let presentation = self.registry.presentation();

        let mut constraints = BTreeMap::new();
        for canonical in live.canonical_axis_names().to_vec() {
            let constraint = live.axis_constraint(&canonical)?;
            constraints.insert(
                presentation.user_name(&canonical).to_string(),
                presentation.present_constraint(&canonical, constraint),
            );
        }

        let mut samples = BTreeMap::new();
        for name in live.sample_names() {
            let snapshot = live.sample_snapshot(&name)?;
            let reflections = snapshot
                .reflections
                .iter()
                .map(|reflection| ReflectionConfig {
                    reflection: zip_names(live.pseudo_axis_names(), &reflection.pseudo),
                    position: presented_positions(
                        presentation,
                        live.canonical_axis_names(),
                        &reflection.real,
                    ),
                    wavelength: reflection.wavelength,
                    orientation_reflection: reflection.orientation_reflection,
                    flag: reflection.flag,
                })
                .collect();
            samples.insert(
                name.clone(),
                SampleConfig {
                    name: snapshot.name,
                    lattice: LatticeConfig::from_array(snapshot.lattice),
                    reflections,
                    u: matrix_rows(&snapshot.u),
                    ub: matrix_rows(&snapshot.ub),
                },
            );
        }

        let wavelength = live.wavelength();
        let document = ConfigurationDocument {
            name: live.controller_name().to_string(),
            geometry: live.geometry_name().to_string(),
            datetime: utc_timestamp(),
            python_class: live.controller_class().to_string(),
            engine: live.engine_name().to_string(),
            mode: live.engine_mode().to_string(),
            hklpy_version: env!("CARGO_PKG_VERSION").to_string(),
            library: live.library_name().to_string(),
            library_version: live.library_version().to_string(),
            energy_kev: wavelength_to_energy_kev(wavelength),
            wavelength_angstrom: wavelength,
            constraints,
            samples,
            canonical_axes: live.canonical_axis_names().to_vec(),
            real_axes: self.registry.user_names(),
            reciprocal_axes: live.pseudo_axis_names().to_vec(),
        };

        // defensive: a healthy live state always passes
        validate_against_live(&document, &self.registry, live)?;
        Ok(document)
    }

    /// Capture and render in one step.
    pub fn export(&self, live: &dyn GeometryOracle, format: ExportFormat) -> DcResult<String> {
        let document = self.capture(live)?;
        serialize(&document, format)
    }

    pub fn validate(
        &self,
        document: &ConfigurationDocument,
        live: &dyn GeometryOracle,
    ) -> DcResult<()> {
        validate_against_live(document, &self.registry, live)
    }

    /// Reset `live` to the documented baseline: default wavelength, first
    /// engine mode, full-range constraints on every real axis, and a
    /// single default cubic sample named "main".
    pub fn reset(&self, live: &mut dyn GeometryOracle) -> DcResult<()> {
        live.set_wavelength(DEFAULT_WAVELENGTH)?;
        let first_mode = live
            .engine_modes()
            .first()
            .cloned()
            .unwrap_or_else(|| live.engine_mode().to_string());
        live.set_engine_mode(&first_mode)?;

        for axis in live.canonical_axis_names().to_vec() {
            live.set_axis_constraint(&axis, AxisConstraint::full_rotation())?;
        }

        for name in live.sample_names() {
            live.remove_sample(&name)?;
        }
        let a0 = DEFAULT_WAVELENGTH;
        live.new_sample("main", [a0, a0, a0, 90.0, 90.0, 90.0])?;
        Ok(())
    }

    /// Write a validated document back into live state.
    ///
    /// Validation runs first and nothing is mutated when it fails. A
    /// reflection that the engine rejects is logged and skipped; the rest
    /// of the batch continues. When a sample ends up with two or more
    /// orientation-flagged reflections, UB is computed from the last two.
    pub fn apply(
        &self,
        document: &ConfigurationDocument,
        live: &mut dyn GeometryOracle,
        options: RestoreOptions,
    ) -> DcResult<()> {
        self.validate(document, live)?;

        if options.clear {
            self.reset(live)?;
        }

        live.set_engine_mode(&document.mode)?;

        if options.restore_constraints {
            let presentation = self.registry.presentation();
            for (axis, constraint) in &document.constraints {
                let index = self.registry.resolve(axis)?;
                let canonical = self.registry.canonical_at(index);
                live.set_axis_constraint(
                    canonical,
                    presentation.accept_constraint(canonical, *constraint),
                )?;
            }
        }

        for (name, sample) in &document.samples {
            self.apply_sample(name, sample, document, live)?;
        }
        Ok(())
    }

    /// Parse text (JSON or YAML, recognized by structure) and apply it.
    pub fn restore_text(
        &self,
        text: &str,
        live: &mut dyn GeometryOracle,
        options: RestoreOptions,
    ) -> DcResult<()> {
        let document = detect_and_parse(text)?;
        self.apply(&document, live, options)
    }

    fn apply_sample(
        &self,
        name: &str,
        sample: &SampleConfig,
        document: &ConfigurationDocument,
        live: &mut dyn GeometryOracle,
    ) -> DcResult<()> {
        let lattice = sample.lattice.as_array();
        if live.sample_names().iter().any(|known| known == name) {
            live.set_sample_lattice(name, lattice)?;
        } else {
            live.new_sample(name, lattice)?;
        }

        let presentation = self.registry.presentation();
        let mut orientation: Vec<ReflectionHandle> = Vec::new();
        for (index, reflection) in sample.reflections.iter().enumerate() {
            let pseudo = ordered_values(&reflection.reflection, &document.reciprocal_axes);
            let real: Vec<f64> = document
                .canonical_axes
                .iter()
                .map(|axis| {
                    let value = reflection.position.get(axis).copied().unwrap_or_default();
                    presentation.accept(axis, value)
                })
                .collect();

            let added = with_wavelength(live, reflection.wavelength, |live| {
                live.add_reflection(name, &pseudo, &real)
            });
            match added {
                Ok(handle) => {
                    if reflection.orientation_reflection {
                        orientation.push(handle);
                    }
                }
                Err(error) => {
                    let error = DcError::ReflectionAdd {
                        sample: name.to_string(),
                        index,
                        reason: error.to_string(),
                    };
                    warn!(%error, "skipping reflection the engine rejected");
                }
            }
        }

        if orientation.len() >= 2 {
            let second = orientation[orientation.len() - 1];
            let first = orientation[orientation.len() - 2];
            if let Err(error) = live.compute_ub(name, first, second) {
                warn!(sample = name, %error, "UB computation failed, orientation left as-is");
            } else {
                debug!(sample = name, "UB recomputed from restored reflections");
            }
        }
        Ok(())
    }
}

fn presented_positions(
    presentation: &AxisPresentation,
    names: &[String],
    values: &[f64],
) -> BTreeMap<String, f64> {
    names
        .iter()
        .zip(values)
        .map(|(axis, value)| (axis.clone(), presentation.present(axis, *value)))
        .collect()
}

fn zip_names(names: &[String], values: &[f64]) -> BTreeMap<String, f64> {
    names
        .iter()
        .cloned()
        .zip(values.iter().copied())
        .collect()
}

fn ordered_values(map: &BTreeMap<String, f64>, names: &[String]) -> Vec<f64> {
    names
        .iter()
        .map(|name| map.get(name).copied().unwrap_or_default())
        .collect()
}

fn matrix_rows(matrix: &[[f64; 3]; 3]) -> Vec<Vec<f64>> {
    matrix.iter().map(|row| row.to_vec()).collect()
}

/// "YYYY-MM-DD HH:MM:SS" in UTC, without pulling in a date-time crate.
fn utc_timestamp() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    let (year, month, day) = civil_from_days((seconds / 86_400) as i64);
    let rem = seconds % 86_400;
    format!(
        "{year:04}-{month:02}-{day:02} {:02}:{:02}:{:02}",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

// days-since-epoch to civil date (Howard Hinnant's algorithm)
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe as i64 + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
