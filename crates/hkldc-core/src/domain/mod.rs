pub mod errors;

pub use errors::{DcError, DcResult, ErrorCategory, ValidationReport, Violation};

/// Angstrom to keV conversion for X-rays (1 angstrom ~= 12.39842 keV).
pub const A_KEV: f64 = 12.398_419_84;

/// Wavelength installed by a baseline reset, angstrom.
pub const DEFAULT_WAVELENGTH: f64 = 1.54;

/// Lowest value any real-space axis can take, degrees.
pub const AX_MIN: f64 = -360.0;

/// Highest value any real-space axis can take, degrees.
pub const AX_MAX: f64 = 360.0;

/// Reciprocal-space coordinates, one entry per pseudo axis of the active
/// engine (e.g. h, k, l).
pub type PseudoPosition = Vec<f64>;

/// Motor angles, one entry per canonical real axis, degrees.
pub type RealPosition = Vec<f64>;

pub fn wavelength_to_energy_kev(wavelength: f64) -> f64 {
    A_KEV / wavelength
}

pub fn energy_kev_to_wavelength(energy: f64) -> f64 {
    A_KEV / energy
}
