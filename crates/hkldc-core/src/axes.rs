//! Axis naming: canonical engine names, user-facing renames, sign flips.

use std::collections::{BTreeMap, BTreeSet};

use crate::constraints::AxisConstraint;
use crate::domain::{DcError, DcResult};
use crate::oracle::GeometryOracle;

/// User-facing presentation of the engine's canonical real axes.
///
/// Holds a bijective canonical-to-user rename map plus the set of axes
/// whose sign is flipped between the engine and the user. Every read or
/// write that crosses the boundary goes through the same presentation so
/// renames and inversions can never disagree between call sites.
#[derive(Debug, Clone, Default)]
pub struct AxisPresentation {
    renames: BTreeMap<String, String>,
    inverted: BTreeSet<String>,
}

impl AxisPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(mut self, canonical: &str, user: &str) -> Self {
        self.renames.insert(canonical.to_string(), user.to_string());
        self
    }

    pub fn invert(mut self, canonical: &str) -> Self {
        self.inverted.insert(canonical.to_string());
        self
    }

    /// User-facing name for a canonical axis (the canonical name itself
    /// when no rename applies).
    pub fn user_name<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.renames
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }

    /// Canonical name behind a user-facing one, when a rename applies.
    pub fn canonical_name(&self, user: &str) -> Option<&str> {
        self.renames
            .iter()
            .find(|(_, mapped)| mapped.as_str() == user)
            .map(|(canonical, _)| canonical.as_str())
    }

    pub fn is_inverted(&self, canonical: &str) -> bool {
        self.inverted.contains(canonical)
    }

    /// Engine value to user value.
    pub fn present(&self, canonical: &str, value: f64) -> f64 {
        if self.is_inverted(canonical) { -value } else { value }
    }

    /// User value to engine value. Sign flips are involutions, so this is
    /// the same transform as `present`.
    pub fn accept(&self, canonical: &str, value: f64) -> f64 {
        self.present(canonical, value)
    }

    /// Engine constraint to user constraint. Negation reverses an
    /// interval, so the limits swap as their signs flip.
    pub fn present_constraint(
        &self,
        canonical: &str,
        constraint: AxisConstraint,
    ) -> AxisConstraint {
        if !self.is_inverted(canonical) {
            return constraint;
        }
        AxisConstraint {
            low_limit: -constraint.high_limit,
            high_limit: -constraint.low_limit,
            value: -constraint.value,
            fit: constraint.fit,
        }
    }

    /// User constraint to engine constraint; the same involution as
    /// `present_constraint`.
    pub fn accept_constraint(
        &self,
        canonical: &str,
        constraint: AxisConstraint,
    ) -> AxisConstraint {
        self.present_constraint(canonical, constraint)
    }
}

/// Canonical axis index lookup by either naming scheme.
#[derive(Debug, Clone, Default)]
pub struct AxisRegistry {
    canonical: Vec<String>,
    presentation: AxisPresentation,
}

impl AxisRegistry {
    pub fn new(canonical: Vec<String>, presentation: AxisPresentation) -> Self {
        Self {
            canonical,
            presentation,
        }
    }

    pub fn from_oracle(oracle: &dyn GeometryOracle, presentation: AxisPresentation) -> Self {
        Self::new(oracle.canonical_axis_names().to_vec(), presentation)
    }

    pub fn canonical_names(&self) -> &[String] {
        &self.canonical
    }

    pub fn user_names(&self) -> Vec<String> {
        self.canonical
            .iter()
            .map(|axis| self.presentation.user_name(axis).to_string())
            .collect()
    }

    pub fn presentation(&self) -> &AxisPresentation {
        &self.presentation
    }

    /// Resolve an axis by user-facing name first, canonical name second.
    pub fn resolve(&self, name: &str) -> DcResult<usize> {
        let canonical = self.presentation.canonical_name(name).unwrap_or(name);
        self.canonical
            .iter()
            .position(|axis| axis == canonical)
            .ok_or_else(|| DcError::UnknownAxis(name.to_string()))
    }

    pub fn canonical_at(&self, index: usize) -> &str {
        &self.canonical[index]
    }
}

#[cfg(test)]
mod tests {
    use super::{AxisPresentation, AxisRegistry};
    use crate::constraints::AxisConstraint;
    use crate::domain::DcError;

    fn registry() -> AxisRegistry {
        let presentation = AxisPresentation::new()
            .rename("tth", "delta")
            .invert("chi");
        AxisRegistry::new(
            ["omega", "chi", "phi", "tth"]
                .iter()
                .map(|axis| axis.to_string())
                .collect(),
            presentation,
        )
    }

    #[test]
    fn resolve_prefers_user_name_then_canonical() {
        let registry = registry();
        assert_eq!(registry.resolve("delta").expect("user name"), 3);
        assert_eq!(registry.resolve("tth").expect("canonical name"), 3);
        assert_eq!(registry.resolve("omega").expect("unrenamed axis"), 0);
    }

    #[test]
    fn unknown_axis_is_an_error() {
        let error = registry().resolve("mu").expect_err("mu should be unknown");
        assert!(matches!(error, DcError::UnknownAxis(name) if name == "mu"));
    }

    #[test]
    fn user_names_follow_the_rename_map() {
        assert_eq!(registry().user_names(), vec!["omega", "chi", "phi", "delta"]);
    }

    #[test]
    fn inversion_flips_sign_both_ways() {
        let registry = registry();
        let presentation = registry.presentation();
        assert_eq!(presentation.present("chi", 12.5), -12.5);
        assert_eq!(presentation.accept("chi", -12.5), 12.5);
        assert_eq!(presentation.present("omega", 12.5), 12.5);
    }

    #[test]
    fn inverted_constraint_swaps_limits_as_it_negates() {
        let registry = registry();
        let presentation = registry.presentation();
        let engine = AxisConstraint::new(-90.0, 120.0, 5.0, true)
            .expect("constraint should construct");

        let user = presentation.present_constraint("chi", engine);
        assert_eq!(
            (user.low_limit, user.high_limit, user.value, user.fit),
            (-120.0, 90.0, -5.0, true)
        );
        assert_eq!(presentation.accept_constraint("chi", user), engine);
        assert_eq!(presentation.present_constraint("omega", engine), engine);
    }
}
