//! Serialization round trips for configuration documents, in memory and
//! across a file boundary.

use std::fs;

use hkldc_core::config::{
    ConfigurationModel, ExportFormat, RestoreOptions, detect_and_parse, from_json, from_yaml,
    serialize, to_json, to_yaml,
};
use hkldc_core::constraints::AxisConstraint;
use hkldc_core::oracle::GeometryOracle;
use hkldc_core::oracle::sim::SimulatedDiffractometer;

fn populated_oracle() -> SimulatedDiffractometer {
    let mut oracle = SimulatedDiffractometer::new();
    oracle.set_engine_mode("constant_phi").expect("mode");
    oracle
        .set_axis_constraint(
            "chi",
            AxisConstraint::new(-90.0, 90.0, 0.0, true).expect("constraint"),
        )
        .expect("constraint install");
    let r1 = oracle
        .add_reflection("main", &[1.0, 0.0, 0.0], &[30.0, 0.0, 0.0, 60.0])
        .expect("r1");
    let r2 = oracle
        .add_reflection("main", &[0.0, 1.0, 0.0], &[30.0, 90.0, 0.0, 60.0])
        .expect("r2");
    oracle.compute_ub("main", r1, r2).expect("UB");
    oracle
}

#[test]
fn json_text_round_trips_to_an_equal_document() {
    let oracle = populated_oracle();
    let model = ConfigurationModel::for_oracle(&oracle);
    let document = model.capture(&oracle).expect("capture");

    let text = to_json(&document).expect("render");
    let parsed = from_json(&text).expect("parse");
    assert_eq!(parsed, document);
}

#[test]
fn yaml_text_round_trips_to_an_equal_document() {
    let oracle = populated_oracle();
    let model = ConfigurationModel::for_oracle(&oracle);
    let document = model.capture(&oracle).expect("capture");

    let text = to_yaml(&document).expect("render");
    let parsed = from_yaml(&text).expect("parse");
    assert_eq!(parsed, document);
}

#[test]
fn dict_format_renders_parseable_json() {
    let oracle = populated_oracle();
    let model = ConfigurationModel::for_oracle(&oracle);
    let document = model.capture(&oracle).expect("capture");

    let text = serialize(&document, ExportFormat::Dict).expect("render");
    let parsed = from_json(&text).expect("parse");
    assert_eq!(parsed, document);
}

#[test]
fn exported_file_restores_onto_a_fresh_diffractometer() {
    let source = populated_oracle();
    let model = ConfigurationModel::for_oracle(&source);
    let captured = model.capture(&source).expect("capture");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("diffractometer.yml");
    fs::write(&path, model.export(&source, ExportFormat::Yaml).expect("export"))
        .expect("write");

    let text = fs::read_to_string(&path).expect("read");
    let document = detect_and_parse(&text).expect("parse");

    let mut target = SimulatedDiffractometer::new();
    model
        .apply(&document, &mut target, RestoreOptions::default())
        .expect("apply");

    let mut recaptured = model.capture(&target).expect("recapture");
    recaptured.datetime = captured.datetime.clone();
    assert_eq!(recaptured, captured);
}

#[test]
fn detection_distinguishes_json_from_yaml() {
    let oracle = populated_oracle();
    let model = ConfigurationModel::for_oracle(&oracle);
    let document = model.capture(&oracle).expect("capture");

    let json = to_json(&document).expect("json");
    let yaml = to_yaml(&document).expect("yaml");
    assert_eq!(detect_and_parse(&json).expect("json parse"), document);
    assert_eq!(detect_and_parse(&yaml).expect("yaml parse"), document);
}
