// src/rules/mod.rs
//! The analysis-rule contract: identity, offense records, the visit
//! callbacks a rule may implement, and the per-investigation context the
//! engine hands it.

mod badge;
pub mod builtin;
mod context;
mod offense;
mod registry;

pub use badge::Badge;
pub use context::{Context, InvestigationOptions};
pub use offense::{Offense, Severity, Status};
pub use registry::{Qualified, Registry};

use std::fmt;
use std::sync::Arc;

use crate::error::{PrecinctError, Result};
use crate::force::ScopeHooks;
use crate::source::{Node, NodeKind, SourceUnit, Span};

/// Which invocations a rule subscribed to `Call` nodes wants. `Named` rules
/// are never invoked for calls to anything outside their list.
#[derive(Debug, Clone, Copy)]
pub enum CallFilter {
    All,
    Named(&'static [&'static str]),
}

impl CallFilter {
    #[must_use]
    pub fn admits(&self, method: &str) -> bool {
        match self {
            CallFilter::All => true,
            CallFilter::Named(names) => names.contains(&method),
        }
    }
}

/// One independent analysis unit. Implementations hold only their own
/// analysis state; offenses and corrections go through the [`Context`].
///
/// Instances are built fresh per investigated unit by their class's
/// factory, so state left behind by a previous unit cannot leak. Every
/// callback returns a `Result`: an `Err` mutes the rule for the rest of the
/// walk and is surfaced in the aggregate report's error list - it never
/// aborts the investigation.
pub trait Rule {
    /// Reset point before any callback for a unit fires.
    fn begin_investigation(&mut self, _unit: &SourceUnit) {}

    /// Node kinds whose pre-order visit this rule observes.
    fn subscriptions(&self) -> &'static [NodeKind] {
        &[]
    }

    /// Node kinds whose post-order visit this rule observes. Childless
    /// kinds never fire these.
    fn leave_subscriptions(&self) -> &'static [NodeKind] {
        &[]
    }

    /// Refinement for `Call` subscriptions.
    fn call_filter(&self) -> CallFilter {
        CallFilter::All
    }

    fn on_enter(&mut self, _node: &Node, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn on_leave(&mut self, _node: &Node, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    /// Sole callback for a syntactically invalid unit; the walk is skipped.
    fn on_invalid(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    /// Fires after the walk, before the report freezes.
    fn on_end(&mut self, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    /// Opt-in to the scope/dataflow pass's hook points.
    fn scope_hooks(&mut self) -> Option<&mut dyn ScopeHooks> {
        None
    }
}

type RuleFactory = Arc<dyn Fn() -> Box<dyn Rule> + Send + Sync>;

/// Class-level rule metadata: identity, capabilities and the factory that
/// builds a fresh instance per investigated unit. Read-only after startup
/// and safe to share across threads.
#[derive(Clone)]
pub struct RuleClass {
    badge: Badge,
    supports_autocorrect: bool,
    incompatible_with: &'static [&'static str],
    build: RuleFactory,
}

impl RuleClass {
    pub fn new<R, F>(badge: &str, factory: F) -> Self
    where
        R: Rule + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            badge: Badge::parse(badge),
            supports_autocorrect: false,
            incompatible_with: &[],
            build: Arc::new(move || Box::new(factory())),
        }
    }

    /// Declares the class-level "I support automatic correction" flag.
    #[must_use]
    pub fn autocorrectable(mut self) -> Self {
        self.supports_autocorrect = true;
        self
    }

    /// Declares rule classes whose fixes are known to conflict with this
    /// one's even when no literal range clobbers.
    #[must_use]
    pub fn incompatible_with(mut self, badges: &'static [&'static str]) -> Self {
        self.incompatible_with = badges;
        self
    }

    #[must_use]
    pub fn badge(&self) -> &Badge {
        &self.badge
    }

    #[must_use]
    pub fn supports_autocorrect(&self) -> bool {
        self.supports_autocorrect
    }

    /// True when this class and `other` must not contribute corrections in
    /// the same round. Either side declaring the other is enough.
    #[must_use]
    pub fn conflicts_with(&self, other: &RuleClass) -> bool {
        let listed = |list: &[&str], badge: &Badge| {
            list.iter().any(|entry| Badge::parse(entry).matches(badge))
        };
        listed(self.incompatible_with, other.badge())
            || listed(other.incompatible_with, self.badge())
    }

    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Rule> {
        (self.build)()
    }
}

impl fmt::Debug for RuleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleClass")
            .field("badge", &self.badge)
            .field("supports_autocorrect", &self.supports_autocorrect)
            .field("incompatible_with", &self.incompatible_with)
            .finish()
    }
}

/// Frozen result of one rule's investigation of one unit.
#[derive(Debug)]
pub struct RuleReport {
    pub badge: Badge,
    pub offenses: Vec<Offense>,
    /// Pending corrections, absent when the rule queued none.
    pub corrector: Option<crate::corrector::Corrector>,
}

/// A captured rule-execution failure: which rule, where, and why.
#[derive(Debug)]
pub struct InvestigationError {
    pub badge: Badge,
    /// Node being visited when the callback failed, when there was one.
    pub node: Option<(NodeKind, Span)>,
    pub cause: PrecinctError,
}

impl fmt::Display for InvestigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some((kind, span)) => write!(
                f,
                "{}: error at {kind:?} (line {}): {}",
                self.badge, span.line, self.cause
            ),
            None => write!(f, "{}: {}", self.badge, self.cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;
    impl Rule for Nop {}

    #[test]
    fn test_call_filter() {
        assert!(CallFilter::All.admits("anything"));
        let named = CallFilter::Named(&["breakpoint", "set_trace"]);
        assert!(named.admits("breakpoint"));
        assert!(!named.admits("print"));
    }

    #[test]
    fn test_class_metadata() {
        let class = RuleClass::new("Lint/Nop", || Nop).autocorrectable();
        assert_eq!(class.badge().to_string(), "Lint/Nop");
        assert!(class.supports_autocorrect());
        let _instance = class.instantiate();
    }

    #[test]
    fn test_conflicts_either_direction() {
        let a = RuleClass::new("Style/A", || Nop).incompatible_with(&["Style/B"]);
        let b = RuleClass::new("Style/B", || Nop);
        let c = RuleClass::new("Style/C", || Nop);
        assert!(a.conflicts_with(&b));
        assert!(b.conflicts_with(&a));
        assert!(!a.conflicts_with(&c));
    }
}
