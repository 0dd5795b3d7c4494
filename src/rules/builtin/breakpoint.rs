// src/rules/builtin/breakpoint.rs
//! Flags debugger entry points left in committed code and removes them.

use crate::error::Result;
use crate::rules::{CallFilter, Context, Rule};
use crate::source::{Node, NodeKind};

pub struct Breakpoint;

impl Rule for Breakpoint {
    fn subscriptions(&self) -> &'static [NodeKind] {
        &[NodeKind::Call]
    }

    // The dispatcher's fast path: never invoked for any other call name.
    fn call_filter(&self) -> CallFilter {
        CallFilter::Named(&["breakpoint", "set_trace"])
    }

    fn on_enter(&mut self, node: &Node, ctx: &mut Context) -> Result<()> {
        let span = node.span;
        let message = format!("debugger entry point `{}` left in code", node.name_str());
        ctx.correct(&span, message, |corrector| corrector.remove(&span))
    }
}
