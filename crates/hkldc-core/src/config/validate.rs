//! Semantic validation of a document against a live diffractometer.

use crate::axes::AxisRegistry;
use crate::domain::{DcResult, ValidationReport};
use crate::oracle::GeometryOracle;

use super::model::ConfigurationDocument;

/// Check every document invariant plus the cross-checks against `live`:
/// geometry identity, library, engine, mode membership, exact axis-name
/// sequences, and constraint-key resolution. All violations are collected
/// into one report; nothing is mutated.
pub fn validate_against_live(
    document: &ConfigurationDocument,
    registry: &AxisRegistry,
    live: &dyn GeometryOracle,
) -> DcResult<()> {
    let mut report = ValidationReport::new();
    document.validate_internal_into(&mut report);

    if document.geometry != live.geometry_name() {
        report.fail(
            "geometry",
            live.geometry_name(),
            document.geometry.clone(),
        );
    }
    if document.library != live.library_name() {
        report.fail("library", live.library_name(), document.library.clone());
    }
    if document.engine != live.engine_name() {
        report.fail("engine", live.engine_name(), document.engine.clone());
    }
    if !live.engine_modes().iter().any(|mode| mode == &document.mode) {
        report.fail(
            "mode",
            format!("one of {:?}", live.engine_modes()),
            document.mode.clone(),
        );
    }

    if document.canonical_axes != live.canonical_axis_names() {
        report.fail(
            "canonical_axes",
            format!("{:?}", live.canonical_axis_names()),
            format!("{:?}", document.canonical_axes),
        );
    }
    if document.reciprocal_axes != live.pseudo_axis_names() {
        report.fail(
            "reciprocal_axes",
            format!("{:?}", live.pseudo_axis_names()),
            format!("{:?}", document.reciprocal_axes),
        );
    }
    let user_names = registry.user_names();
    if document.real_axes != user_names {
        report.fail(
            "real_axes",
            format!("{user_names:?}"),
            format!("{:?}", document.real_axes),
        );
    }

    for axis in document.constraints.keys() {
        if registry.resolve(axis).is_err() {
            report.fail(
                format!("constraints {axis}"),
                "a resolvable axis name",
                axis.clone(),
            );
        }
    }

    report.into_result()
}

#[cfg(test)]
mod tests {
    use super::validate_against_live;
    use crate::axes::{AxisPresentation, AxisRegistry};
    use crate::config::io::from_json;
    use crate::config::model::ConfigurationDocument;
    use crate::config::restore::ConfigurationModel;
    use crate::oracle::sim::SimulatedDiffractometer;

    fn live_document(oracle: &SimulatedDiffractometer) -> ConfigurationDocument {
        ConfigurationModel::for_oracle(oracle)
            .capture(oracle)
            .expect("capture should succeed")
    }

    fn registry(oracle: &SimulatedDiffractometer) -> AxisRegistry {
        AxisRegistry::from_oracle(oracle, AxisPresentation::new())
    }

    #[test]
    fn captured_document_validates_against_its_source() {
        let oracle = SimulatedDiffractometer::new();
        let doc = live_document(&oracle);
        validate_against_live(&doc, &registry(&oracle), &oracle)
            .expect("own capture should validate");
    }

    #[test]
    fn geometry_mismatch_names_the_field_and_both_values() {
        let oracle = SimulatedDiffractometer::new();
        let mut doc = live_document(&oracle);
        doc.geometry = "E6C".to_string();

        let error = validate_against_live(&doc, &registry(&oracle), &oracle)
            .expect_err("foreign geometry should fail");
        let message = error.to_string();
        assert!(message.contains("geometry"));
        assert!(message.contains("E6C"));
        assert!(message.contains("SIM4C"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let oracle = SimulatedDiffractometer::new();
        let mut doc = live_document(&oracle);
        doc.mode = "psi_constant".to_string();
        let error = validate_against_live(&doc, &registry(&oracle), &oracle)
            .expect_err("unknown mode should fail");
        assert!(error.to_string().contains("mode"));
    }

    #[test]
    fn axis_sequence_must_match_exactly() {
        let oracle = SimulatedDiffractometer::new();
        let mut doc = live_document(&oracle);
        // same set, different order
        doc.canonical_axes.swap(0, 3);
        doc.real_axes.swap(0, 3);
        let error = validate_against_live(&doc, &registry(&oracle), &oracle)
            .expect_err("reordered axes should fail");
        assert!(error.to_string().contains("canonical_axes"));
    }

    #[test]
    fn constraint_keys_resolve_through_user_names() {
        let oracle = SimulatedDiffractometer::new();
        let presentation = AxisPresentation::new().rename("tth", "delta");
        let registry = AxisRegistry::from_oracle(&oracle, presentation.clone());
        let model = ConfigurationModel::new(registry);
        let doc = model.capture(&oracle).expect("capture should succeed");
        assert!(doc.constraints.contains_key("delta"));

        let registry = AxisRegistry::from_oracle(&oracle, presentation);
        validate_against_live(&doc, &registry, &oracle)
            .expect("renamed constraint keys should resolve");
    }

    #[test]
    fn validation_is_idempotent() {
        let oracle = SimulatedDiffractometer::new();
        let doc = live_document(&oracle);
        let registry = registry(&oracle);
        let first = validate_against_live(&doc, &registry, &oracle);
        let second = validate_against_live(&doc, &registry, &oracle);
        assert_eq!(first.is_ok(), second.is_ok());
    }

    #[test]
    fn hand_authored_document_with_wrong_library_fails() {
        let oracle = SimulatedDiffractometer::new();
        let text = r#"
        {
            "geometry": "SIM4C",
            "engine": "hkl",
            "mode": "bissector",
            "library": "gi.repository.Hkl",
            "constraints": {},
            "samples": {},
            "canonical_axes": ["omega", "chi", "phi", "tth"],
            "real_axes": ["omega", "chi", "phi", "tth"],
            "reciprocal_axes": ["h", "k", "l"]
        }
        "#;
        let doc = from_json(text).expect("document should parse");
        let error = validate_against_live(&doc, &registry(&oracle), &oracle)
            .expect_err("foreign library should fail");
        assert!(error.to_string().contains("library"));
    }
}
