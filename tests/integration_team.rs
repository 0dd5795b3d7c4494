// tests/integration_team.rs
//! Orchestration scenarios: registry-driven enablement, the two-round
//! dispatch, correction merging and conflict resolution, per-rule error
//! isolation, and fix-point idempotence.

use std::sync::Arc;

use precinct_core::config::Config;
use precinct_core::error::PrecinctError;
use precinct_core::parse::parse_unit;
use precinct_core::rules::{
    Context, InvestigationOptions, Registry, Rule, RuleClass, Status,
};
use precinct_core::source::{Node, NodeKind, SourceUnit};
use precinct_core::team::Team;
use precinct_core::Result;

fn fixing() -> InvestigationOptions {
    InvestigationOptions {
        autocorrect: true,
        safe: false,
    }
}

fn team_for(classes: Vec<RuleClass>, options: InvestigationOptions) -> Team {
    Team::new(classes, Arc::new(Config::default()), options)
}

// Replaces every identifier with a fixed text; used to manufacture
// correction conflicts.
struct ReplaceIdents(&'static str);

impl Rule for ReplaceIdents {
    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Ident]
    }

    fn on_enter(&mut self, node: &Node, ctx: &mut Context) -> Result<()> {
        let span = node.span;
        let text = self.0;
        ctx.correct(&span, format!("rewrite to `{text}`"), |c| {
            c.replace(&span, text);
        })
    }
}

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

struct Explodes;

impl Rule for Explodes {
    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Ident]
    }

    fn on_enter(&mut self, _node: &Node, _ctx: &mut Context) -> Result<()> {
        Err(PrecinctError::rule("synthetic failure"))
    }
}

#[test]
fn test_unused_variable_scenario() {
    // One registered rule set, `x = 1` never read again: exactly one
    // offense, badged Lint/UnusedVariable.
    let registry = Registry::with_builtin_rules();
    let config = Arc::new(Config::default());
    let team = Team::new(
        registry.enabled(&config),
        config,
        InvestigationOptions::default(),
    );

    let unit = parse_unit("t.py", "x = 1\n").unwrap();
    let report = team.investigate(&unit);

    assert!(report.errors.is_empty());
    assert_eq!(report.offenses.len(), 1);
    assert_eq!(report.offenses[0].badge.to_string(), "Lint/UnusedVariable");
    assert_eq!(report.offenses[0].status, Status::Uncorrected);
    assert!(report.corrected_source.is_none());
}

#[test]
fn test_conflicting_corrections_drop_one_and_warn() {
    let classes = vec![
        RuleClass::new("Style/Alpha", || ReplaceIdents("alpha")).autocorrectable(),
        RuleClass::new("Style/Beta", || ReplaceIdents("beta")).autocorrectable(),
    ];
    let team = team_for(classes, fixing());
    let unit = parse_unit("t.py", "value\n").unwrap();

    let report = team.investigate(&unit);

    // Stable badge order processes Alpha first; Beta's clobbering rewrite
    // is dropped with one warning, but its offense survives.
    assert_eq!(report.corrected_source.as_deref(), Some("alpha\n"));
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Style/Beta"));
    let badges: Vec<String> = report
        .offenses
        .iter()
        .map(|o| o.badge.to_string())
        .collect();
    assert!(badges.contains(&"Style/Alpha".to_string()));
    assert!(badges.contains(&"Style/Beta".to_string()));
}

#[test]
fn test_incompatible_classes_skip_later_contributor() {
    let classes = vec![
        RuleClass::new("Style/First", || ReplaceIdents("first")).autocorrectable(),
        RuleClass::new("Style/Second", || {
            // Would edit a disjoint range, so only the declared
            // incompatibility can stop it.
            struct AppendBang;
            impl Rule for AppendBang {
                fn subscriptions(&self) -> &'static [NodeKind] {
                    &[NodeKind::Ident]
                }
                fn on_enter(&mut self, node: &Node, ctx: &mut Context) -> Result<()> {
                    let span = node.span;
                    ctx.correct(&span, "append", |c| c.insert_after(&span, "  # noted"))
                }
            }
            AppendBang
        })
        .autocorrectable()
        .incompatible_with(&["Style/First"]),
    ];
    let team = team_for(classes, fixing());
    let unit = parse_unit("t.py", "value\n").unwrap();

    let report = team.investigate(&unit);

    assert_eq!(report.corrected_source.as_deref(), Some("first\n"));
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("incompatible with Style/First")));
}

#[test]
fn test_one_failing_rule_among_four() {
    let classes = vec![
        RuleClass::new("Lint/Boom", || Explodes),
        RuleClass::new("Lint/One", || FlagIdents),
        RuleClass::new("Lint/Three", || FlagIdents),
        RuleClass::new("Lint/Two", || FlagIdents),
    ];
    let team = team_for(classes, InvestigationOptions::default());
    let unit = parse_unit("t.py", "value\n").unwrap();

    let report = team.investigate(&unit);

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].badge.to_string(), "Lint/Boom");
    let reporting: Vec<String> = report
        .offenses
        .iter()
        .map(|o| o.badge.to_string())
        .collect();
    assert_eq!(reporting, vec!["Lint/One", "Lint/Three", "Lint/Two"]);
}

#[test]
fn test_second_round_skipped_while_fixes_pending() {
    let classes = vec![
        RuleClass::new("Style/Fixer", || ReplaceIdents("fixed")).autocorrectable(),
        RuleClass::new("Style/Observer", || FlagIdents),
    ];
    let team = team_for(classes, fixing());

    // Round with pending fixes: the observer's offenses would be stale
    // against the soon-to-change text, so it does not run.
    let unit = parse_unit("t.py", "value\n").unwrap();
    let report = team.investigate(&unit);
    assert!(report.corrected_source.is_some());
    assert!(report
        .offenses
        .iter()
        .all(|o| o.badge.to_string() == "Style/Fixer"));

    // No fixable material: the observer runs normally.
    let unit = parse_unit("t.py", "1\n").unwrap();
    let report = team.investigate(&unit);
    assert!(report.corrected_source.is_none());
}

#[test]
fn test_observer_runs_when_autocorrect_off() {
    let classes = vec![
        RuleClass::new("Style/Fixer", || ReplaceIdents("fixed")).autocorrectable(),
        RuleClass::new("Style/Observer", || FlagIdents),
    ];
    let team = team_for(classes, InvestigationOptions::default());
    let unit = parse_unit("t.py", "value\n").unwrap();

    let report = team.investigate(&unit);

    // Nothing corrects, so both rules report.
    assert!(report.corrected_source.is_none());
    let badges: Vec<String> = report
        .offenses
        .iter()
        .map(|o| o.badge.to_string())
        .collect();
    assert!(badges.contains(&"Style/Fixer".to_string()));
    assert!(badges.contains(&"Style/Observer".to_string()));
}

#[test]
fn test_suppressed_line_reports_disabled_and_never_rewrites() {
    let registry = Registry::with_builtin_rules();
    let config = Arc::new(Config::default());
    let team = Team::new(registry.enabled(&config), config, fixing());

    let unit = parse_unit(
        "t.py",
        "x = 1  # precinct:disable Lint/UnusedVariable\n",
    )
    .unwrap();
    let report = team.investigate(&unit);

    assert_eq!(report.offenses.len(), 1);
    assert_eq!(report.offenses[0].status, Status::Disabled);
    assert!(report.corrected_source.is_none());
}

#[test]
fn test_fix_point_idempotence() {
    // Investigating the corrected output again yields zero further
    // corrections once the underlying violations are actually fixed.
    let registry = Registry::with_builtin_rules();
    let config = Arc::new(Config::default());
    let team = Team::new(registry.enabled(&config), config, fixing());

    let unit = parse_unit("t.py", "x = 1\nbreakpoint()\n").unwrap();
    let first = team.investigate(&unit);
    let corrected = first.corrected_source.expect("first run corrects");
    assert!(first.updated);
    assert_eq!(corrected, "_x = 1\n\n");

    let unit = parse_unit("t.py", &corrected).unwrap();
    let second = team.investigate(&unit);
    assert!(second.corrected_source.is_none());
    assert!(!second.updated);
    assert!(second.offenses.is_empty());
}

#[test]
fn test_unit_level_include_exclude() {
    let config = Config::from_toml(
        "[\"Style/Observer\"]\nexclude = [\"generated\"]\n",
    )
    .unwrap();
    let classes = vec![RuleClass::new("Style/Observer", || FlagIdents)];
    let team = Team::new(classes, Arc::new(config), InvestigationOptions::default());

    let unit = parse_unit("src/generated/t.py", "value\n").unwrap();
    assert!(team.investigate(&unit).offenses.is_empty());

    let unit = parse_unit("src/app/t.py", "value\n").unwrap();
    assert_eq!(team.investigate(&unit).offenses.len(), 1);
}

#[test]
fn test_invalid_unit_reaches_rules_via_on_invalid() {
    struct GlobalOnInvalid;
    impl Rule for GlobalOnInvalid {
        fn on_invalid(&mut self, ctx: &mut Context) -> Result<()> {
            ctx.add_global_offense("could not parse unit");
            Ok(())
        }
    }

    let classes = vec![RuleClass::new("Lint/Syntax", || GlobalOnInvalid)];
    let team = team_for(classes, InvestigationOptions::default());
    let unit = SourceUnit::invalid("broken.py", "def broken(:\n");

    let report = team.investigate(&unit);
    assert_eq!(report.offenses.len(), 1);
    assert!(report.offenses[0].is_global());
    assert_eq!(report.offenses[0].status, Status::Unsupported);
}
