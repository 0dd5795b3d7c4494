// src/rules/offense.rs
//! Severity and correction-status enumerations, and the immutable offense
//! record itself.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::error::{PrecinctError, Result};
use crate::rules::Badge;
use crate::source::Span;

/// Severity ladder, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Refactor,
    Convention,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Parses a user-supplied severity string.
    ///
    /// # Errors
    ///
    /// Returns [`PrecinctError::UnknownSeverity`] for anything outside the
    /// ladder; callers treat this as a configuration error.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "refactor" => Ok(Severity::Refactor),
            "convention" => Ok(Severity::Convention),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(PrecinctError::UnknownSeverity(s.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Refactor => "refactor",
            Severity::Convention => "convention",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Default severity for a department: correctness departments warn,
    /// everything else is a convention.
    #[must_use]
    pub fn department_default(department: Option<&str>) -> Self {
        match department {
            Some("Lint") => Severity::Warning,
            _ => Severity::Convention,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to an offense's correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Correctable (or not) but nothing was changed.
    Uncorrected,
    /// A real fix was queued.
    Corrected,
    /// No real fix was possible; a suppressing marker was inserted instead.
    CorrectedWithTodo,
    /// The rule cannot correct this offense.
    Unsupported,
    /// The offense's line is suppressed by an inline directive.
    Disabled,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Uncorrected => "uncorrected",
            Status::Corrected => "corrected",
            Status::CorrectedWithTodo => "corrected_with_todo",
            Status::Unsupported => "unsupported",
            Status::Disabled => "disabled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected violation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offense {
    pub severity: Severity,
    #[serde(skip)]
    pub span: Span,
    pub line: usize,
    pub column: usize,
    /// The full text of the violated line, for display.
    pub source_line: String,
    pub message: String,
    pub badge: Badge,
    pub status: Status,
}

impl Offense {
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.span.is_global()
    }

    #[must_use]
    pub fn corrected(&self) -> bool {
        matches!(self.status, Status::Corrected | Status::CorrectedWithTodo)
    }
}

// Ordering is lexicographic over (line, column, badge, message, severity) so
// aggregate reports come out stable regardless of rule scheduling.
impl Ord for Offense {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.column, &self.badge, &self.message, self.severity).cmp(&(
            other.line,
            other.column,
            &other.badge,
            &other.message,
            other.severity,
        ))
    }
}

impl PartialOrd for Offense {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Offense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}: {}",
            self.line,
            self.column + 1,
            self.severity,
            self.badge,
            self.message
        )
    }
}
