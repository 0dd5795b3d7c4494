// src/rules/builtin/unused_variable.rs
//! Flags local bindings that are never read, using the scope/dataflow
//! pass. The fix renames the binding with an underscore prefix, the
//! conventional "intentionally unused" marker - which also keeps the rule
//! quiet on its own output.

use crate::error::Result;
use crate::force::{ScopeHooks, ScopeView};
use crate::rules::{Context, Rule};

pub struct UnusedVariable;

impl Rule for UnusedVariable {
    fn scope_hooks(&mut self) -> Option<&mut dyn ScopeHooks> {
        Some(self)
    }
}

impl ScopeHooks for UnusedVariable {
    fn after_leaving_scope(&mut self, scope: &ScopeView<'_>, ctx: &mut Context) -> Result<()> {
        for variable in scope.variables() {
            // Parameters are part of a signature; renaming them is a
            // different rule's business.
            if variable.from_param || variable.name.starts_with('_') {
                continue;
            }
            if !variable.unused() {
                continue;
            }
            let span = variable.decl_span;
            let replacement = format!("_{}", variable.name);
            let message = format!("unused variable `{}`", variable.name);
            ctx.correct(&span, message, |corrector| {
                corrector.replace(&span, replacement);
            })?;
        }
        Ok(())
    }
}
