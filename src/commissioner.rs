// src/commissioner.rs
//! Single-pass tree-visiting dispatcher. Builds per-kind dispatch tables
//! once from the subscriptions each rule declares, then walks the tree
//! depth-first, invoking only the callbacks that are actually implemented
//! for each tag. Rule failures are captured, never propagated.

use std::collections::HashMap;

use crate::force::{Force, VariableForce};
use crate::rules::{CallFilter, Context, InvestigationError, Rule, RuleReport};
use crate::source::{Node, NodeKind, SourceUnit};

/// One enrolled rule: its fresh instance, its per-investigation context,
/// and whether an earlier failure muted it for the rest of the walk.
pub struct Subscriber<'a> {
    pub rule: Box<dyn Rule>,
    pub ctx: Context<'a>,
    pub muted: bool,
}

impl<'a> Subscriber<'a> {
    #[must_use]
    pub fn new(rule: Box<dyn Rule>, ctx: Context<'a>) -> Self {
        Self {
            rule,
            ctx,
            muted: false,
        }
    }
}

/// Dispatch tables for one investigation round.
pub struct Commissioner<'a> {
    subscribers: Vec<Subscriber<'a>>,
    /// kind -> subscriber indices wanting the pre-order visit. `Call` is
    /// handled by the fast-path indexes below instead.
    enter_table: HashMap<NodeKind, Vec<usize>>,
    leave_table: HashMap<NodeKind, Vec<usize>>,
    /// Fast path for invocation nodes: method name -> interested rules.
    call_named: HashMap<&'static str, Vec<usize>>,
    /// `Call` subscribers with no name restriction; always invoked.
    call_all: Vec<usize>,
    forces: Vec<Box<dyn Force>>,
    errors: Vec<InvestigationError>,
}

impl<'a> Commissioner<'a> {
    #[must_use]
    pub fn new(mut subscribers: Vec<Subscriber<'a>>) -> Self {
        let mut enter_table: HashMap<NodeKind, Vec<usize>> = HashMap::new();
        let mut leave_table: HashMap<NodeKind, Vec<usize>> = HashMap::new();
        let mut call_named: HashMap<&'static str, Vec<usize>> = HashMap::new();
        let mut call_all = Vec::new();
        let mut wants_scopes = false;

        for (idx, sub) in subscribers.iter_mut().enumerate() {
            for &kind in sub.rule.subscriptions() {
                if kind == NodeKind::Call {
                    match sub.rule.call_filter() {
                        CallFilter::All => call_all.push(idx),
                        CallFilter::Named(names) => {
                            for name in names {
                                call_named.entry(name).or_default().push(idx);
                            }
                        }
                    }
                } else {
                    enter_table.entry(kind).or_default().push(idx);
                }
            }
            for &kind in sub.rule.leave_subscriptions() {
                leave_table.entry(kind).or_default().push(idx);
            }
            if sub.rule.scope_hooks().is_some() {
                wants_scopes = true;
            }
        }

        let forces: Vec<Box<dyn Force>> = if wants_scopes {
            vec![Box::new(VariableForce::new())]
        } else {
            Vec::new()
        };

        Self {
            subscribers,
            enter_table,
            leave_table,
            call_named,
            call_all,
            forces,
            errors: Vec::new(),
        }
    }

    /// Runs forces and one depth-first walk, then freezes per-rule reports.
    /// Syntactically invalid units skip the walk entirely in favor of the
    /// single invalid-unit callback.
    pub fn investigate(mut self, unit: &SourceUnit) -> (Vec<RuleReport>, Vec<InvestigationError>) {
        for sub in &mut self.subscribers {
            sub.rule.begin_investigation(unit);
        }

        match &unit.root {
            None => {
                for idx in 0..self.subscribers.len() {
                    self.invoke(idx, None, Phase::Invalid);
                }
            }
            Some(root) => {
                let mut forces = std::mem::take(&mut self.forces);
                for force in &mut forces {
                    force.investigate(root, &mut self.subscribers, &mut self.errors);
                }
                self.walk(root);
            }
        }

        for idx in 0..self.subscribers.len() {
            self.invoke(idx, None, Phase::End);
        }

        let reports = self
            .subscribers
            .into_iter()
            .map(|sub| sub.ctx.finish())
            .collect();
        (reports, self.errors)
    }

    fn walk(&mut self, node: &Node) {
        self.dispatch_enter(node);
        // Tags known to never have children skip both the descent and the
        // post-order phase.
        if !node.kind.is_childless() {
            for child in &node.children {
                self.walk(child);
            }
            self.dispatch_leave(node);
        }
    }

    fn dispatch_enter(&mut self, node: &Node) {
        if node.kind == NodeKind::Call {
            for i in 0..self.call_all.len() {
                let idx = self.call_all[i];
                self.invoke(idx, Some(node), Phase::Enter);
            }
            if let Some(indices) = self.call_named.get(node.name_str()) {
                for idx in indices.clone() {
                    self.invoke(idx, Some(node), Phase::Enter);
                }
            }
            return;
        }
        if let Some(indices) = self.enter_table.get(&node.kind) {
            for idx in indices.clone() {
                self.invoke(idx, Some(node), Phase::Enter);
            }
        }
    }

    fn dispatch_leave(&mut self, node: &Node) {
        if let Some(indices) = self.leave_table.get(&node.kind) {
            for idx in indices.clone() {
                self.invoke(idx, Some(node), Phase::Leave);
            }
        }
    }

    fn invoke(&mut self, idx: usize, node: Option<&Node>, phase: Phase) {
        let sub = &mut self.subscribers[idx];
        if sub.muted {
            return;
        }
        let result = match (phase, node) {
            (Phase::Enter, Some(node)) => sub.rule.on_enter(node, &mut sub.ctx),
            (Phase::Leave, Some(node)) => sub.rule.on_leave(node, &mut sub.ctx),
            (Phase::Invalid, None) => sub.rule.on_invalid(&mut sub.ctx),
            (Phase::End, None) => sub.rule.on_end(&mut sub.ctx),
            _ => Ok(()),
        };
        if let Err(cause) = result {
            sub.muted = true;
            self.errors.push(InvestigationError {
                badge: sub.ctx.badge().clone(),
                node: node.map(|n| (n.kind, n.span)),
                cause,
            });
        }
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Enter,
    Leave,
    Invalid,
    End,
}
