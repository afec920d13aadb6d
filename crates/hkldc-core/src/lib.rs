//! Diffractometer control core: geometry-engine orchestration, iterative
//! forward-path solving, and validated configuration save/restore.
//!
//! The trigonometric solving itself lives behind the [`oracle::GeometryOracle`]
//! trait; this crate contributes the object model around it, the
//! [`solver::PathSolver`] reachability walk, and the
//! [`config::ConfigurationModel`] capture/apply contract.

pub mod axes;
pub mod config;
pub mod constraints;
pub mod domain;
pub mod oracle;
pub mod solver;

pub use axes::{AxisPresentation, AxisRegistry};
pub use config::{ConfigurationDocument, ConfigurationModel, ExportFormat, RestoreOptions};
pub use constraints::{AxisConstraint, ConstraintManager, ConstraintSet};
pub use domain::{DcError, DcResult, ErrorCategory};
pub use oracle::GeometryOracle;
pub use solver::PathSolver;
