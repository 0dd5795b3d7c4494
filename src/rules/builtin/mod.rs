// src/rules/builtin/mod.rs
//! The small built-in rule set. These exist so the binary and the
//! end-to-end tests exercise every engine path; anything beyond that
//! belongs in an embedding crate's own catalog.

mod breakpoint;
mod unused_variable;

pub use breakpoint::Breakpoint;
pub use unused_variable::UnusedVariable;

use crate::rules::RuleClass;

/// Classes for every built-in rule, ready to enlist.
#[must_use]
pub fn classes() -> Vec<RuleClass> {
    vec![
        RuleClass::new("Lint/Breakpoint", || Breakpoint).autocorrectable(),
        RuleClass::new("Lint/UnusedVariable", || UnusedVariable).autocorrectable(),
    ]
}
