// src/force/mod.rs
//! Auxiliary analysis passes ("forces") that run alongside rule callbacks
//! and expose their own hook points. The scope/dataflow tracker in
//! [`variables`] is the one force this crate ships.

mod variables;

pub use variables::{
    Assignment, Reference, Scope, ScopeKind, ScopeView, Variable, VariableForce,
};

use crate::commissioner::Subscriber;
use crate::error::Result;
use crate::rules::{Context, InvestigationError};
use crate::source::Node;

/// An auxiliary traversal the dispatcher runs over a valid unit before the
/// rule-callback walk. Forces deliver their findings to interested rules
/// through their own hook traits rather than through node callbacks.
pub trait Force {
    fn name(&self) -> &'static str;

    fn investigate(
        &mut self,
        root: &Node,
        subscribers: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    );
}

/// Hook points of the scope/dataflow pass. Rules opt in by returning
/// `Some(self)` from [`crate::rules::Rule::scope_hooks`]; every method
/// defaults to a no-op so implementors override only the transitions they
/// care about. Errors mute the rule exactly like node-callback errors.
pub trait ScopeHooks {
    fn before_entering_scope(&mut self, _scope: &ScopeView<'_>, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn after_entering_scope(&mut self, _scope: &ScopeView<'_>, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn before_leaving_scope(&mut self, _scope: &ScopeView<'_>, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn after_leaving_scope(&mut self, _scope: &ScopeView<'_>, _ctx: &mut Context) -> Result<()> {
        Ok(())
    }

    fn before_declaring_variable(
        &mut self,
        _variable: &Variable,
        _scope: &ScopeView<'_>,
        _ctx: &mut Context,
    ) -> Result<()> {
        Ok(())
    }

    fn after_declaring_variable(
        &mut self,
        _variable: &Variable,
        _scope: &ScopeView<'_>,
        _ctx: &mut Context,
    ) -> Result<()> {
        Ok(())
    }
}
