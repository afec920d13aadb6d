use std::fmt::{Display, Formatter};

pub type DcResult<T> = Result<T, DcError>;

/// Coarse failure classes with stable process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Success,
    InputValidation,
    IoSystem,
    Computation,
    Internal,
}

impl ErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidation => 2,
            Self::IoSystem => 3,
            Self::Computation => 4,
            Self::Internal => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidation => "InputValidation",
            Self::IoSystem => "IoSystem",
            Self::Computation => "Computation",
            Self::Internal => "Internal",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// One semantic validation failure, named precisely enough to find the
/// offending entry in a long configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, received {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Collected semantic violations from one validation pass.
///
/// Validation accumulates every independent failure rather than stopping at
/// the first, so one pass reports everything wrong with a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(
        &mut self,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) {
        self.violations.push(Violation::new(field, expected, actual));
    }

    pub fn check_range(&mut self, field: &str, value: f64, low: f64, high: f64) {
        if !(low <= value && value <= high) {
            self.fail(
                field,
                format!("value between {low} and {high}"),
                value.to_string(),
            );
        }
    }

    /// Open interval variant; endpoints are rejected.
    pub fn check_range_exclusive(&mut self, field: &str, value: f64, low: f64, high: f64) {
        if !(low < value && value < high) {
            self.fail(
                field,
                format!("value strictly between {low} and {high}"),
                value.to_string(),
            );
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> DcResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DcError::Validation(self))
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "; {violation}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DcError {
    #[error(
        "unable to reach position after {iterations} iteration(s); \
         last valid pseudo {last_pseudo:?}, last valid real {last_real:?}"
    )]
    Unreachable {
        iterations: u32,
        last_pseudo: Option<Vec<f64>>,
        last_real: Option<Vec<f64>>,
    },

    #[error("configuration structure invalid: {0}")]
    Structural(String),

    #[error("configuration rejected: {0}")]
    Validation(ValidationReport),

    #[error("unknown sample {0:?}")]
    UnknownSample(String),

    #[error("sample {0:?} already defined")]
    DuplicateSample(String),

    #[error("unknown axis {0:?}")]
    UnknownAxis(String),

    #[error("cannot add reflection {index} to sample {sample:?}: {reason}")]
    ReflectionAdd {
        sample: String,
        index: usize,
        reason: String,
    },

    #[error("calculation failed: {0}")]
    Calculation(String),

    #[error("unrecognized export format {0:?}, expected dict, json, or yaml")]
    Format(String),
}

impl DcError {
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Unreachable { .. } | Self::Calculation(_) => ErrorCategory::Computation,
            Self::Structural(_)
            | Self::Validation(_)
            | Self::Format(_)
            | Self::UnknownAxis(_) => ErrorCategory::InputValidation,
            Self::UnknownSample(_) | Self::DuplicateSample(_) | Self::ReflectionAdd { .. } => {
                ErrorCategory::InputValidation
            }
        }
    }

    pub const fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.category().label(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::{DcError, ErrorCategory, ValidationReport};

    #[test]
    fn category_exit_codes_are_stable() {
        let cases = [
            (ErrorCategory::Success, 0),
            (ErrorCategory::InputValidation, 2),
            (ErrorCategory::IoSystem, 3),
            (ErrorCategory::Computation, 4),
            (ErrorCategory::Internal, 5),
        ];
        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code);
        }
    }

    #[test]
    fn report_collects_every_violation() {
        let mut report = ValidationReport::new();
        report.check_range("omega low_limit", -400.0, -360.0, 360.0);
        report.check_range_exclusive("lattice alpha", 180.0, 0.0, 180.0);
        report.check_range("omega value", 0.0, -360.0, 360.0);

        assert_eq!(report.violations().len(), 2);
        let error = report.into_result().expect_err("report should fail");
        assert_eq!(error.exit_code(), 2);
        assert!(error.to_string().contains("omega low_limit"));
        assert!(error.to_string().contains("lattice alpha"));
    }

    #[test]
    fn empty_report_converts_to_ok() {
        assert!(ValidationReport::new().into_result().is_ok());
    }

    #[test]
    fn unreachable_error_exposes_diagnostics() {
        let error = DcError::Unreachable {
            iterations: 7,
            last_pseudo: Some(vec![1.0, 0.5, 0.0]),
            last_real: None,
        };
        assert_eq!(error.category(), ErrorCategory::Computation);
        assert!(error.diagnostic_line().starts_with("ERROR: [Computation]"));
        assert!(error.to_string().contains("7 iteration(s)"));
    }
}
