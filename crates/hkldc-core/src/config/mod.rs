//! Validated save/restore of diffractometer configuration.
//!
//! Three layers, validated in order: structural (serde parse in `io`),
//! document-internal semantic (`model`), and live cross-checks
//! (`validate`). `restore` drives the full capture/apply workflow.

pub mod io;
pub mod model;
pub mod restore;
pub mod validate;

pub use io::{ExportFormat, detect_and_parse, from_json, from_value, from_yaml, serialize,
    to_json, to_value, to_yaml};
pub use model::{ConfigurationDocument, LatticeConfig, ReflectionConfig, SampleConfig};
pub use restore::{ConfigurationModel, RestoreOptions};
pub use validate::validate_against_live;
