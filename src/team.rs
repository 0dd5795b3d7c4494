// src/team.rs
//! Orchestration of many rules over one source unit: the two-round
//! dispatch (correction-capable rules first), corrector merging with
//! conflict resolution, and per-rule error accumulation.

use std::sync::Arc;

use crate::commissioner::{Commissioner, Subscriber};
use crate::config::Config;
use crate::corrector::Corrector;
use crate::rules::{
    Context, InvestigationError, InvestigationOptions, Offense, RuleClass, RuleReport,
};
use crate::source::SourceUnit;

/// Aggregate result of one unit's investigation.
#[derive(Debug)]
pub struct TeamReport {
    /// Per-rule frozen reports, in the order the rules ran.
    pub reports: Vec<RuleReport>,
    /// Every offense across all rules, in display order.
    pub offenses: Vec<Offense>,
    /// Captured rule-execution failures; one rule failing never stops the
    /// others.
    pub errors: Vec<InvestigationError>,
    /// Correction conflicts and other non-fatal notices.
    pub warnings: Vec<String>,
    /// The rewritten source, present when any correction applied.
    pub corrected_source: Option<String>,
    /// True when `corrected_source` differs from the input buffer.
    pub updated: bool,
}

/// Runs a fixed set of rule classes against source units. Construct one
/// team per configuration; each `investigate` call builds fresh rule
/// instances, so a team is reusable across units and shareable across
/// threads at unit granularity.
pub struct Team {
    classes: Vec<RuleClass>,
    config: Arc<Config>,
    options: InvestigationOptions,
}

impl Team {
    #[must_use]
    pub fn new(
        mut classes: Vec<RuleClass>,
        config: Arc<Config>,
        options: InvestigationOptions,
    ) -> Self {
        // Stable badge order: report aggregation and correction precedence
        // must not depend on registration order.
        classes.sort_by(|a, b| a.badge().cmp(b.badge()));
        Self {
            classes,
            config,
            options,
        }
    }

    #[must_use]
    pub fn classes(&self) -> &[RuleClass] {
        &self.classes
    }

    /// Investigates one unit: runs the correction-capable rules, then -
    /// unless a correction already landed - the rest; merges the surviving
    /// correctors and renders the corrected source.
    #[must_use]
    pub fn investigate(&self, unit: &SourceUnit) -> TeamReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let relevant: Vec<&RuleClass> = self
            .classes
            .iter()
            .filter(|class| self.applies(class, unit, &mut errors))
            .collect();

        let (correcting, observing): (Vec<&RuleClass>, Vec<&RuleClass>) =
            relevant.into_iter().partition(|class| {
                class.supports_autocorrect()
                    && self
                        .config
                        .for_badge(class.badge())
                        .autocorrect
                        .active(self.options.autocorrect)
            });

        let mut reports = self.run_round(&correcting, unit, &mut errors);
        let produced_fixes = reports.iter().any(|r| r.corrector.is_some());

        // When the first round queued fixes, the remaining rules would be
        // reporting against soon-to-change text; they get their turn on the
        // next round, after the rewrite lands.
        if !produced_fixes {
            reports.extend(self.run_round(&observing, unit, &mut errors));
        }

        let corrected_source = self.apply_corrections(&reports, unit, &mut warnings);

        let mut offenses: Vec<Offense> = reports
            .iter()
            .flat_map(|r| r.offenses.iter().cloned())
            .collect();
        offenses.sort();

        let updated = corrected_source
            .as_deref()
            .is_some_and(|text| text != unit.buffer.text());

        TeamReport {
            reports,
            offenses,
            errors,
            warnings,
            corrected_source,
            updated,
        }
    }

    /// Include/exclude filtering; a bad pattern is that rule's
    /// configuration error, not a run-stopper.
    fn applies(
        &self,
        class: &RuleClass,
        unit: &SourceUnit,
        errors: &mut Vec<InvestigationError>,
    ) -> bool {
        let rule_config = self.config.for_badge(class.badge());
        match rule_config.applies_to(unit.name()) {
            Ok(applies) => applies,
            Err(cause) => {
                errors.push(InvestigationError {
                    badge: class.badge().clone(),
                    node: None,
                    cause,
                });
                false
            }
        }
    }

    fn run_round(
        &self,
        classes: &[&RuleClass],
        unit: &SourceUnit,
        errors: &mut Vec<InvestigationError>,
    ) -> Vec<RuleReport> {
        let mut subscribers = Vec::with_capacity(classes.len());
        for class in classes {
            match Context::new(class, self.config.as_ref(), unit, self.options) {
                Ok(ctx) => subscribers.push(Subscriber::new(class.instantiate(), ctx)),
                Err(cause) => errors.push(InvestigationError {
                    badge: class.badge().clone(),
                    node: None,
                    cause,
                }),
            }
        }
        if subscribers.is_empty() {
            return Vec::new();
        }
        let (reports, round_errors) = Commissioner::new(subscribers).investigate(unit);
        errors.extend(round_errors);
        reports
    }

    /// Merges rule correctors into one aggregate rewrite. Reports iterate
    /// in stable badge order; a rule mutually incompatible with an earlier
    /// contributor is skipped, and a clobbering merge drops only that
    /// rule's contribution (its offenses stand).
    fn apply_corrections(
        &self,
        reports: &[RuleReport],
        unit: &SourceUnit,
        warnings: &mut Vec<String>,
    ) -> Option<String> {
        let mut ordered: Vec<&RuleReport> = reports.iter().collect();
        ordered.sort_by(|a, b| a.badge.cmp(&b.badge));

        let mut aggregate = Corrector::new(&unit.buffer);
        let mut rendered: Option<String> = None;
        let mut contributed: Vec<&RuleClass> = Vec::new();

        for report in ordered {
            let Some(corrector) = &report.corrector else {
                continue;
            };
            let Some(class) = self.classes.iter().find(|c| c.badge() == &report.badge) else {
                continue;
            };

            if let Some(conflict) = contributed.iter().find(|c| c.conflicts_with(class)) {
                warnings.push(format!(
                    "{}: corrections skipped (incompatible with {})",
                    report.badge,
                    conflict.badge()
                ));
                continue;
            }

            // Trial-merge so one rule's conflicting rewrite cannot poison
            // the batch.
            let mut candidate = aggregate.clone();
            let outcome = candidate
                .merge(corrector)
                .and_then(|()| candidate.rewrite());
            match outcome {
                Ok(text) => {
                    aggregate = candidate;
                    rendered = Some(text);
                    contributed.push(class);
                }
                Err(cause) => {
                    warnings.push(format!(
                        "{}: corrections dropped ({cause})",
                        report.badge
                    ));
                }
            }
        }

        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PrecinctError, Result};
    use crate::rules::{Context, Rule};
    use crate::source::{Node, NodeKind, SourceBuffer, Span};

    // A rule that flags every `Ident` node.
    struct FlagIdents;
    impl Rule for FlagIdents {
        fn subscriptions(&self) -> &'static [NodeKind] {
            &[NodeKind::Ident]
        }
        fn on_enter(&mut self, node: &Node, ctx: &mut Context) -> Result<()> {
            ctx.add_offense(&node.span, "identifier spotted");
            Ok(())
        }
    }

    // A rule that errors on the first `Ident` it sees.
    struct Explodes;
    impl Rule for Explodes {
        fn subscriptions(&self) -> &'static [NodeKind] {
            &[NodeKind::Ident]
        }
        fn on_enter(&mut self, _node: &Node, _ctx: &mut Context) -> Result<()> {
            Err(PrecinctError::rule("internal failure"))
        }
    }

    fn unit() -> SourceUnit {
        let text = "alpha\n";
        let buffer = SourceBuffer::new("test.py", text);
        let ident = Node::named(NodeKind::Ident, "alpha", buffer.span(0, 5));
        let root = Node::new(NodeKind::Program, buffer.span(0, text.len()))
            .with_children(vec![ident]);
        SourceUnit::new(buffer, Some(root))
    }

    #[test]
    fn test_offenses_aggregate_sorted() {
        let classes = vec![
            RuleClass::new("Lint/Z", || FlagIdents),
            RuleClass::new("Lint/A", || FlagIdents),
        ];
        let team = Team::new(classes, Arc::new(Config::default()), InvestigationOptions::default());
        let report = team.investigate(&unit());
        assert_eq!(report.offenses.len(), 2);
        assert_eq!(report.offenses[0].badge.to_string(), "Lint/A");
        assert_eq!(report.offenses[1].badge.to_string(), "Lint/Z");
        assert!(!report.updated);
    }

    #[test]
    fn test_failing_rule_does_not_stop_others() {
        let classes = vec![
            RuleClass::new("Lint/Boom", || Explodes),
            RuleClass::new("Lint/Fine", || FlagIdents),
        ];
        let team = Team::new(classes, Arc::new(Config::default()), InvestigationOptions::default());
        let report = team.investigate(&unit());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].badge.to_string(), "Lint/Boom");
        assert_eq!(report.offenses.len(), 1);
        assert_eq!(report.offenses[0].badge.to_string(), "Lint/Fine");
    }
}
