use std::fs;
use std::path::Path;

use anyhow::Context;
use hkldc_core::config::{ConfigurationDocument, detect_and_parse, from_json, from_yaml};

use super::CliError;

/// Read and structurally parse a configuration file. The extension picks
/// the parser; unrecognized extensions fall back to content detection.
pub(super) fn read_document(path: &Path) -> Result<ConfigurationDocument, CliError> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration '{}'", path.display()))?;
    let parsed = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => from_json(&text),
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            from_yaml(&text)
        }
        _ => detect_and_parse(&text),
    };
    parsed.map_err(CliError::from)
}

pub(super) fn write_rendered(output: Option<&Path>, text: &str) -> Result<(), CliError> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create output directory '{}'", parent.display())
                    })?;
                }
            }
            fs::write(path, text)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}

pub(super) fn render_summary(document: &ConfigurationDocument) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Geometry: {} ({} engine, {} mode)",
        document.geometry, document.engine, document.mode
    ));
    lines.push(format!(
        "Library: {} {}",
        document.library, document.library_version
    ));
    if !document.datetime.is_empty() {
        lines.push(format!("Captured: {}", document.datetime));
    }
    lines.push(format!(
        "Wavelength: {} angstrom ({:.4} keV)",
        document.wavelength_angstrom, document.energy_kev
    ));
    lines.push(format!("Real axes: {}", document.real_axes.join(", ")));
    lines.push(format!(
        "Reciprocal axes: {}",
        document.reciprocal_axes.join(", ")
    ));

    lines.push("Constraints:".to_string());
    for (axis, constraint) in &document.constraints {
        lines.push(format!(
            "  {axis}: [{}, {}] value {}{}",
            constraint.low_limit,
            constraint.high_limit,
            constraint.value,
            if constraint.fit { "" } else { " (frozen)" },
        ));
    }

    lines.push("Samples:".to_string());
    for (name, sample) in &document.samples {
        let lattice = &sample.lattice;
        let oriented = sample
            .reflections
            .iter()
            .filter(|reflection| reflection.orientation_reflection)
            .count();
        lines.push(format!(
            "  {name}: a={} b={} c={} alpha={} beta={} gamma={}",
            lattice.a, lattice.b, lattice.c, lattice.alpha, lattice.beta, lattice.gamma
        ));
        lines.push(format!(
            "    {} reflection(s), {} used for orientation",
            sample.reflections.len(),
            oriented
        ));
    }
    lines.join("\n")
}
