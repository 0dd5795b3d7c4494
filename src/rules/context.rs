// src/rules/context.rs
//! Per-investigation accumulator handed to a rule's callbacks. Owns the
//! offense list, the pending corrector and the autocorrect policy resolved
//! from class capability + configuration + run options.

use std::collections::HashSet;

use crate::config::Config;
use crate::corrector::Corrector;
use crate::error::Result;
use crate::rules::{Badge, Offense, RuleClass, RuleReport, Severity, Status};
use crate::source::{SourceUnit, Span};

/// Run-level switches the caller picks per invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvestigationOptions {
    /// Whether the caller asked for corrections this run (`--fix`).
    pub autocorrect: bool,
    /// Safe mode: rules flagged `safe_autocorrect = false` keep reporting
    /// but stop rewriting.
    pub safe: bool,
}

pub struct Context<'a> {
    unit: &'a SourceUnit,
    badge: Badge,
    supports_autocorrect: bool,
    autocorrect_active: bool,
    disable_uncorrectable: bool,
    severity: Severity,
    offenses: Vec<Offense>,
    /// Exact source ranges already reported; duplicates are dropped.
    seen: HashSet<(usize, usize)>,
    pending: Corrector,
    ignored: Vec<Span>,
}

impl<'a> Context<'a> {
    /// Resolves this rule's effective settings against the configuration.
    ///
    /// # Errors
    ///
    /// Configuration errors (an unknown severity string) surface here,
    /// before any callback runs; the orchestrator records them per rule.
    pub fn new(
        class: &RuleClass,
        config: &Config,
        unit: &'a SourceUnit,
        options: InvestigationOptions,
    ) -> Result<Self> {
        let badge = class.badge().clone();
        let rule_config = config.for_badge(&badge);
        let severity = match rule_config.severity_override()? {
            Some(severity) => severity,
            None => Severity::department_default(badge.department()),
        };
        let safe_blocked = options.safe && !rule_config.safe_autocorrect.unwrap_or(true);
        let autocorrect_active = class.supports_autocorrect()
            && rule_config.autocorrect.active(options.autocorrect)
            && !safe_blocked;

        Ok(Self {
            unit,
            badge,
            supports_autocorrect: class.supports_autocorrect(),
            autocorrect_active,
            disable_uncorrectable: config.disable_uncorrectable,
            severity,
            offenses: Vec::new(),
            seen: HashSet::new(),
            pending: Corrector::new(&unit.buffer),
            ignored: Vec::new(),
        })
    }

    #[must_use]
    pub fn badge(&self) -> &Badge {
        &self.badge
    }

    #[must_use]
    pub fn unit(&self) -> &SourceUnit {
        self.unit
    }

    #[must_use]
    pub fn autocorrect_active(&self) -> bool {
        self.autocorrect_active
    }

    /// Marks a subtree as exempt: later offenses inside it are dropped.
    pub fn ignore(&mut self, span: Span) {
        self.ignored.push(span);
    }

    #[must_use]
    pub fn is_ignored(&self, span: &Span) -> bool {
        self.ignored.iter().any(|outer| outer.contains(span))
    }

    /// Reports an offense with the rule's resolved severity.
    pub fn add_offense(&mut self, span: &Span, message: impl Into<String>) {
        self.add_offense_with_severity(span, message, self.severity);
    }

    /// Reports an offense with an explicit severity, overriding config and
    /// department defaults.
    pub fn add_offense_with_severity(
        &mut self,
        span: &Span,
        message: impl Into<String>,
        severity: Severity,
    ) {
        let status = if self.enabled_line(span) {
            Status::Uncorrected
        } else {
            Status::Disabled
        };
        self.push(*span, &message.into(), severity, status);
    }

    /// Reports a unit-wide offense at the zero-width sentinel location.
    /// Global offenses can never be corrected.
    pub fn add_global_offense(&mut self, message: impl Into<String>) {
        self.push(
            Span::GLOBAL,
            &message.into(),
            self.severity,
            Status::Unsupported,
        );
    }

    /// Reports an offense and offers a correction for it. The closure gets
    /// a fresh corrector; the resulting status depends on whether it
    /// produced edits and whether autocorrection is active (see the status
    /// enum). Suppressed lines record `Disabled` and never run the closure.
    ///
    /// # Errors
    ///
    /// A rule whose correction clobbers its own earlier edits gets the
    /// clobber back as a rule-execution error.
    ///
    /// # Panics
    ///
    /// Panics when the rule's class does not declare autocorrect support -
    /// that is an integration defect in the embedding code, not a property
    /// of the analyzed source.
    pub fn correct(
        &mut self,
        span: &Span,
        message: impl Into<String>,
        build: impl FnOnce(&mut Corrector),
    ) -> Result<()> {
        assert!(
            self.supports_autocorrect,
            "{} does not declare autocorrect support",
            self.badge
        );
        if self.is_ignored(span) || self.seen.contains(&(span.start, span.end)) {
            return Ok(());
        }
        if !self.enabled_line(span) {
            self.push(*span, &message.into(), self.severity, Status::Disabled);
            return Ok(());
        }

        let mut corrector = Corrector::new(&self.unit.buffer);
        build(&mut corrector);

        let status = if !corrector.is_empty() {
            if self.autocorrect_active {
                self.pending.merge(&corrector)?;
                Status::Corrected
            } else {
                Status::Uncorrected
            }
        } else if self.autocorrect_active && self.disable_uncorrectable {
            // No real fix; mark the line so the offense stops reporting.
            let eol = self.unit.buffer.end_of_line(span);
            self.pending
                .insert_after(&eol, format!("  # precinct:todo {}", self.badge));
            Status::CorrectedWithTodo
        } else {
            Status::Unsupported
        };

        self.push(*span, &message.into(), self.severity, status);
        Ok(())
    }

    fn enabled_line(&self, span: &Span) -> bool {
        self.unit.suppressions.enabled_line(&self.badge, span.line)
    }

    fn push(&mut self, span: Span, message: &str, severity: Severity, status: Status) {
        if self.is_ignored(&span) {
            return;
        }
        if !self.seen.insert((span.start, span.end)) {
            return;
        }
        self.offenses.push(Offense {
            severity,
            span,
            line: span.line,
            column: span.column,
            source_line: self.unit.buffer.line_text(span.line).to_string(),
            message: message.to_string(),
            badge: self.badge.clone(),
            status,
        });
    }

    /// Freezes the accumulated state into an immutable report.
    pub(crate) fn finish(self) -> RuleReport {
        RuleReport {
            badge: self.badge,
            offenses: self.offenses,
            corrector: if self.pending.is_empty() {
                None
            } else {
                Some(self.pending)
            },
        }
    }
}
