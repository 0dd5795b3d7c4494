// src/force/variables.rs
//! Scope and dataflow tracking: which names are declared where, which
//! assignments ever get read, with loop back-edges accounted for.
//!
//! Scopes and variables live in index arenas; parent links and the
//! loop-reconciliation event log work over plain indices, never
//! back-references into the tree.

use std::collections::{HashMap, HashSet};

use super::{Force, ScopeHooks};
use crate::commissioner::Subscriber;
use crate::rules::InvestigationError;
use crate::source::{Node, NodeKind, Span};

/// Kind of lexical boundary. `Function` and `Class` bodies are opaque to
/// name lookup from inside them; a `Lambda` reads through to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    TopLevel,
    Function,
    Lambda,
    Class,
}

impl ScopeKind {
    fn transparent(self) -> bool {
        matches!(self, ScopeKind::Lambda)
    }
}

/// One lexical binding boundary.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<usize>,
    pub span: Span,
    pub(crate) bindings: HashMap<String, usize>,
}

/// One recorded write to a variable. `referenced` means some reference can
/// read this value, possibly on a later loop iteration.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub span: Span,
    pub referenced: bool,
}

/// One recorded read of a variable.
#[derive(Debug, Clone)]
pub struct Reference {
    pub span: Span,
}

/// One named local binding with its full read/write history.
#[derive(Debug)]
pub struct Variable {
    pub name: String,
    pub decl_span: Span,
    pub scope: usize,
    /// Declared as a formal parameter rather than by assignment.
    pub from_param: bool,
    pub assignments: Vec<Assignment>,
    pub references: Vec<Reference>,
}

impl Variable {
    /// Never read at all.
    #[must_use]
    pub fn unused(&self) -> bool {
        self.references.is_empty()
    }

    /// Writes whose value no reference can ever observe.
    #[must_use]
    pub fn dead_assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(|a| !a.referenced)
    }
}

/// Read access to one scope and the variable arena, as handed to hooks.
#[derive(Clone, Copy)]
pub struct ScopeView<'f> {
    scope: &'f Scope,
    vars: &'f [Variable],
}

impl<'f> ScopeView<'f> {
    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        self.scope.kind
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.scope.span
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'f Variable> {
        self.scope.bindings.get(name).map(|&id| &self.vars[id])
    }

    /// The scope's own variables, in declaration order.
    #[must_use]
    pub fn variables(&self) -> Vec<&'f Variable> {
        let mut vars: Vec<&Variable> = self
            .scope
            .bindings
            .values()
            .map(|&id| &self.vars[id])
            .collect();
        vars.sort_by_key(|v| (v.decl_span.start, v.decl_span.end));
        vars
    }
}

#[derive(Debug, Clone, Copy)]
enum EventKind {
    /// Index into the variable's assignment list.
    Assign(usize),
    Reference,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    var: usize,
    kind: EventKind,
}

enum ScopeHook {
    BeforeEntering,
    AfterEntering,
    BeforeLeaving,
    AfterLeaving,
}

/// The scope/dataflow force. One instance per investigation; after the
/// traversal the arenas stay readable for tests and embedders.
#[derive(Default)]
pub struct VariableForce {
    scopes: Vec<Scope>,
    vars: Vec<Variable>,
    stack: Vec<usize>,
    events: Vec<Event>,
}

impl Force for VariableForce {
    fn name(&self) -> &'static str {
        "variables"
    }

    fn investigate(
        &mut self,
        root: &Node,
        subscribers: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        self.enter_scope(ScopeKind::TopLevel, root.span, subscribers, errors);
        for child in &root.children {
            self.process(child, subscribers, errors);
        }
        self.leave_scope(subscribers, errors);
    }
}

impl VariableForce {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Runs the pass with no hook subscribers; the arenas carry the result.
    pub fn run(&mut self, root: &Node) {
        let mut errors = Vec::new();
        self.investigate(root, &mut [], &mut errors);
    }

    fn process(
        &mut self,
        node: &Node,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        match node.kind {
            NodeKind::FuncDef | NodeKind::Lambda | NodeKind::ClassDef => {
                self.process_scope_node(node, subs, errors);
            }
            NodeKind::Assign => {
                // RHS first: `x = x + 1` reads the prior value.
                for child in &node.children {
                    self.process(child, subs, errors);
                }
                if let Some(name) = node.name.clone() {
                    self.assign(&name, node.name_span_or_self(), subs, errors);
                }
            }
            NodeKind::OpAssign => {
                for child in &node.children {
                    self.process(child, subs, errors);
                }
                if let Some(name) = node.name.clone() {
                    self.reference(&name, node.name_span_or_self());
                    self.assign(&name, node.name_span_or_self(), subs, errors);
                }
            }
            NodeKind::PatternBind => {
                if let Some(name) = node.name.clone() {
                    self.assign(&name, node.name_span_or_self(), subs, errors);
                }
            }
            NodeKind::Ident => {
                if let Some(name) = &node.name {
                    self.reference(name, node.span);
                }
            }
            NodeKind::Param | NodeKind::RestParam => {
                if let Some(name) = node.name.clone() {
                    self.declare(&name, node.name_span_or_self(), true, subs, errors);
                }
            }
            NodeKind::DefaultParam => {
                // Outside a scope-introducing parent the default value just
                // evaluates in place.
                for child in &node.children {
                    self.process(child, subs, errors);
                }
                if let Some(name) = node.name.clone() {
                    self.declare(&name, node.name_span_or_self(), true, subs, errors);
                }
            }
            NodeKind::While | NodeKind::DoWhile => self.process_loop(node, subs, errors),
            NodeKind::For => self.process_for(node, subs, errors),
            NodeKind::Rescue => self.process_rescue(node, subs, errors),
            NodeKind::CaptureEnv => self.capture_environment(node.span),
            _ => {
                if !node.kind.is_childless() {
                    for child in &node.children {
                        self.process(child, subs, errors);
                    }
                }
            }
        }
    }

    fn process_scope_node(
        &mut self,
        node: &Node,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        let params = node.children.iter().find(|c| c.kind == NodeKind::Params);

        // Twisted children: default-argument expressions execute in the
        // enclosing scope, before the new scope exists.
        if let Some(params) = params {
            for param in &params.children {
                if param.kind == NodeKind::DefaultParam {
                    for value in &param.children {
                        self.process(value, subs, errors);
                    }
                }
            }
        }

        let kind = match node.kind {
            NodeKind::FuncDef => ScopeKind::Function,
            NodeKind::Lambda => ScopeKind::Lambda,
            _ => ScopeKind::Class,
        };
        self.enter_scope(kind, node.span, subs, errors);

        if let Some(params) = params {
            for param in &params.children {
                let declares = matches!(
                    param.kind,
                    NodeKind::Param | NodeKind::DefaultParam | NodeKind::RestParam
                );
                if declares {
                    if let Some(name) = param.name.clone() {
                        self.declare(&name, param.name_span_or_self(), true, subs, errors);
                    }
                }
            }
        }

        for child in &node.children {
            if child.kind != NodeKind::Params {
                self.process(child, subs, errors);
            }
        }

        self.leave_scope(subs, errors);
    }

    /// Loops are straight-lined, then reconciled: a second iteration can
    /// read a value written by a later statement of the first. `While`
    /// carries its condition first, `DoWhile` its body first; child order
    /// already reflects evaluation order.
    fn process_loop(
        &mut self,
        node: &Node,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        let mark = self.events.len();
        for child in &node.children {
            self.process(child, subs, errors);
        }
        self.reconcile(mark);
    }

    fn process_for(
        &mut self,
        node: &Node,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        let mark = self.events.len();
        let mut children = node.children.iter();
        // The iterable evaluates once, before the loop variable binds.
        if let Some(iterable) = children.next() {
            self.process(iterable, subs, errors);
        }
        if let Some(name) = node.name.clone() {
            self.assign(&name, node.name_span_or_self(), subs, errors);
        }
        for child in children {
            self.process(child, subs, errors);
        }
        self.reconcile(mark);
    }

    /// An exception handler whose body can `retry` is a loop in effect.
    fn process_rescue(
        &mut self,
        node: &Node,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        let mark = self.events.len();
        for child in &node.children {
            self.process(child, subs, errors);
        }
        if contains_retry(node) {
            self.reconcile(mark);
        }
    }

    /// Marks every in-loop assignment to a name that is also referenced in
    /// the same loop body: collected `(assignment, reference)` events are
    /// matched by variable id, not by re-walking the tree.
    fn reconcile(&mut self, mark: usize) {
        let referenced: HashSet<usize> = self.events[mark..]
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Reference))
            .map(|e| e.var)
            .collect();
        if referenced.is_empty() {
            return;
        }
        let assigns: Vec<(usize, usize)> = self.events[mark..]
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Assign(idx) if referenced.contains(&e.var) => Some((e.var, idx)),
                _ => None,
            })
            .collect();
        for (var, idx) in assigns {
            self.vars[var].assignments[idx].referenced = true;
        }
    }

    fn enter_scope(
        &mut self,
        kind: ScopeKind,
        span: Span,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            parent: self.stack.last().copied(),
            span,
            bindings: HashMap::new(),
        });
        self.fire_scope(id, &ScopeHook::BeforeEntering, subs, errors);
        self.stack.push(id);
        self.fire_scope(id, &ScopeHook::AfterEntering, subs, errors);
    }

    fn leave_scope(&mut self, subs: &mut [Subscriber<'_>], errors: &mut Vec<InvestigationError>) {
        let id = *self.stack.last().expect("scope stack underflow");
        self.fire_scope(id, &ScopeHook::BeforeLeaving, subs, errors);
        self.stack.pop();
        self.fire_scope(id, &ScopeHook::AfterLeaving, subs, errors);
    }

    fn current(&self) -> usize {
        *self.stack.last().expect("scope stack underflow")
    }

    /// Scopes whose bindings are visible from the current one: itself, plus
    /// ancestors reached through transparent boundaries.
    fn visible_chain(&self) -> Vec<usize> {
        let mut chain = vec![self.current()];
        let mut id = self.current();
        while self.scopes[id].kind.transparent() {
            match self.scopes[id].parent {
                Some(parent) => {
                    chain.push(parent);
                    id = parent;
                }
                None => break,
            }
        }
        chain
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.visible_chain()
            .into_iter()
            .find_map(|scope| self.scopes[scope].bindings.get(name).copied())
    }

    /// Registers `name` in the current scope if absent, firing the
    /// declaration hooks; returns the variable's arena id.
    fn declare(
        &mut self,
        name: &str,
        span: Span,
        from_param: bool,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) -> usize {
        let current = self.current();
        if let Some(&existing) = self.scopes[current].bindings.get(name) {
            return existing;
        }
        let var = Variable {
            name: name.to_string(),
            decl_span: span,
            scope: current,
            from_param,
            assignments: Vec::new(),
            references: Vec::new(),
        };
        self.fire_var(&var, current, true, subs, errors);
        let id = self.vars.len();
        self.vars.push(var);
        self.scopes[current].bindings.insert(name.to_string(), id);
        self.fire_var_by_id(id, current, false, subs, errors);
        id
    }

    /// Records a write. The write lands on the visible variable when one
    /// exists, else declares a fresh one in the current scope.
    fn assign(
        &mut self,
        name: &str,
        span: Span,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        let var = match self.lookup(name) {
            Some(id) => id,
            None => self.declare(name, span, false, subs, errors),
        };
        let idx = self.vars[var].assignments.len();
        self.vars[var].assignments.push(Assignment {
            span,
            referenced: false,
        });
        self.events.push(Event {
            var,
            kind: EventKind::Assign(idx),
        });
    }

    /// Records a read of the nearest visible binding. Unknown names are
    /// not ours to track (method calls, globals).
    fn reference(&mut self, name: &str, span: Span) {
        let Some(var) = self.lookup(name) else {
            return;
        };
        self.vars[var].references.push(Reference { span });
        if let Some(last) = self.vars[var].assignments.last_mut() {
            last.referenced = true;
        }
        self.events.push(Event {
            var,
            kind: EventKind::Reference,
        });
    }

    /// A bare capture of the whole binding environment conservatively reads
    /// every accessible variable.
    fn capture_environment(&mut self, span: Span) {
        for scope in self.visible_chain() {
            let ids: Vec<usize> = self.scopes[scope].bindings.values().copied().collect();
            for id in ids {
                let var = &mut self.vars[id];
                for assignment in &mut var.assignments {
                    assignment.referenced = true;
                }
                var.references.push(Reference { span });
                self.events.push(Event {
                    var: id,
                    kind: EventKind::Reference,
                });
            }
        }
    }

    fn fire_scope(
        &self,
        id: usize,
        hook: &ScopeHook,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        let view = ScopeView {
            scope: &self.scopes[id],
            vars: &self.vars,
        };
        for sub in subs.iter_mut() {
            if sub.muted {
                continue;
            }
            let Some(hooks) = sub.rule.scope_hooks() else {
                continue;
            };
            let result = match hook {
                ScopeHook::BeforeEntering => hooks.before_entering_scope(&view, &mut sub.ctx),
                ScopeHook::AfterEntering => hooks.after_entering_scope(&view, &mut sub.ctx),
                ScopeHook::BeforeLeaving => hooks.before_leaving_scope(&view, &mut sub.ctx),
                ScopeHook::AfterLeaving => hooks.after_leaving_scope(&view, &mut sub.ctx),
            };
            if let Err(cause) = result {
                sub.muted = true;
                errors.push(InvestigationError {
                    badge: sub.ctx.badge().clone(),
                    node: None,
                    cause,
                });
            }
        }
    }

    fn fire_var(
        &self,
        var: &Variable,
        scope: usize,
        before: bool,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        let view = ScopeView {
            scope: &self.scopes[scope],
            vars: &self.vars,
        };
        for sub in subs.iter_mut() {
            if sub.muted {
                continue;
            }
            let Some(hooks) = sub.rule.scope_hooks() else {
                continue;
            };
            let result = if before {
                hooks.before_declaring_variable(var, &view, &mut sub.ctx)
            } else {
                hooks.after_declaring_variable(var, &view, &mut sub.ctx)
            };
            if let Err(cause) = result {
                sub.muted = true;
                errors.push(InvestigationError {
                    badge: sub.ctx.badge().clone(),
                    node: None,
                    cause,
                });
            }
        }
    }

    fn fire_var_by_id(
        &self,
        id: usize,
        scope: usize,
        before: bool,
        subs: &mut [Subscriber<'_>],
        errors: &mut Vec<InvestigationError>,
    ) {
        // Split off the variable so the view and the variable can coexist.
        let var = &self.vars[id];
        self.fire_var(var, scope, before, subs, errors);
    }
}

fn contains_retry(node: &Node) -> bool {
    node.children
        .iter()
        .any(|c| c.kind == NodeKind::Retry || contains_retry(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Node;

    fn span(start: usize) -> Span {
        Span::new(start, start + 1, 1, start)
    }

    fn assign(name: &str, start: usize, rhs: Vec<Node>) -> Node {
        Node::named(NodeKind::Assign, name, span(start)).with_children(rhs)
    }

    fn ident(name: &str, start: usize) -> Node {
        Node::named(NodeKind::Ident, name, span(start))
    }

    fn program(children: Vec<Node>) -> Node {
        Node::new(NodeKind::Program, Span::new(0, 100, 1, 0)).with_children(children)
    }

    fn run(root: &Node) -> VariableForce {
        let mut force = VariableForce::new();
        force.run(root);
        force
    }

    fn var<'f>(force: &'f VariableForce, name: &str) -> &'f Variable {
        force
            .variables()
            .iter()
            .find(|v| v.name == name)
            .expect("variable not tracked")
    }

    #[test]
    fn test_unreferenced_assignment() {
        let root = program(vec![assign("x", 0, vec![])]);
        let force = run(&root);
        let x = var(&force, "x");
        assert!(x.unused());
        assert_eq!(x.dead_assignments().count(), 1);
    }

    #[test]
    fn test_straight_line_reference() {
        let root = program(vec![assign("x", 0, vec![]), ident("x", 10)]);
        let force = run(&root);
        let x = var(&force, "x");
        assert!(!x.unused());
        assert_eq!(x.dead_assignments().count(), 0);
    }

    #[test]
    fn test_self_referential_assignment_reads_prior_value() {
        // x = 1; x = x + 1 - the second write reads the first.
        let root = program(vec![
            assign("x", 0, vec![]),
            assign("x", 10, vec![ident("x", 14)]),
        ]);
        let force = run(&root);
        let x = var(&force, "x");
        assert_eq!(x.assignments.len(), 2);
        assert!(x.assignments[0].referenced);
        assert!(!x.assignments[1].referenced, "second write never read");
    }

    #[test]
    fn test_loop_back_edge_marks_later_assignment() {
        // while cond: use(y); y = y + 1
        // The reference earlier in the body reads the assignment on the
        // next iteration, so the assignment counts as referenced.
        let body = Node::new(NodeKind::Body, span(20)).with_children(vec![
            Node::named(NodeKind::Call, "use", span(21)).with_children(vec![ident("y", 22)]),
            assign("y", 30, vec![ident("y", 34)]),
        ]);
        let root = program(vec![
            assign("y", 0, vec![]),
            Node::new(NodeKind::While, span(15))
                .with_children(vec![Node::new(NodeKind::Literal, span(16)), body]),
        ]);
        let force = run(&root);
        let y = var(&force, "y");
        assert_eq!(y.dead_assignments().count(), 0, "loop write is live");
    }

    #[test]
    fn test_loop_without_reference_stays_dead() {
        // while cond: y = compute()  - nothing reads y anywhere.
        let body = Node::new(NodeKind::Body, span(20))
            .with_children(vec![assign("y", 21, vec![])]);
        let root = program(vec![Node::new(NodeKind::While, span(15))
            .with_children(vec![Node::new(NodeKind::Literal, span(16)), body])]);
        let force = run(&root);
        let y = var(&force, "y");
        assert!(y.unused());
        assert_eq!(y.dead_assignments().count(), 1);
    }

    #[test]
    fn test_do_while_body_before_condition() {
        // do { x = next() } while (x): the condition reads the body's write.
        let body = Node::new(NodeKind::Body, span(10))
            .with_children(vec![assign("x", 11, vec![])]);
        let root = program(vec![Node::new(NodeKind::DoWhile, span(5))
            .with_children(vec![body, ident("x", 20)])]);
        let force = run(&root);
        let x = var(&force, "x");
        assert!(!x.unused());
        assert_eq!(x.dead_assignments().count(), 0);
    }

    #[test]
    fn test_retry_block_reconciles_like_a_loop() {
        // rescue body: use(z); z = refreshed(); retry
        let root = program(vec![
            assign("z", 0, vec![]),
            Node::new(NodeKind::Rescue, span(10)).with_children(vec![
                Node::named(NodeKind::Call, "use", span(11)).with_children(vec![ident("z", 12)]),
                assign("z", 20, vec![]),
                Node::new(NodeKind::Retry, span(30)),
            ]),
        ]);
        let force = run(&root);
        let z = var(&force, "z");
        assert_eq!(z.dead_assignments().count(), 0);
    }

    #[test]
    fn test_rescue_without_retry_is_straight_line() {
        let root = program(vec![Node::new(NodeKind::Rescue, span(10)).with_children(vec![
            Node::named(NodeKind::Call, "use", span(11)).with_children(vec![ident("z", 12)]),
            assign("z", 20, vec![]),
        ])]);
        let force = run(&root);
        let z = var(&force, "z");
        assert_eq!(z.dead_assignments().count(), 1, "no back edge without retry");
    }

    #[test]
    fn test_function_scope_is_opaque() {
        // x declared at top level; a function body referencing x does not
        // resolve to it.
        let func = Node::named(NodeKind::FuncDef, "f", span(10))
            .with_children(vec![
                Node::new(NodeKind::Params, span(11)),
                Node::new(NodeKind::Body, span(12)).with_children(vec![ident("x", 13)]),
            ]);
        let root = program(vec![assign("x", 0, vec![]), func]);
        let force = run(&root);
        assert!(var(&force, "x").unused());
    }

    #[test]
    fn test_lambda_scope_reads_through() {
        let lambda = Node::new(NodeKind::Lambda, span(10)).with_children(vec![
            Node::new(NodeKind::Params, span(11)),
            Node::new(NodeKind::Body, span(12)).with_children(vec![ident("x", 13)]),
        ]);
        let root = program(vec![assign("x", 0, vec![]), lambda]);
        let force = run(&root);
        assert!(!var(&force, "x").unused());
    }

    #[test]
    fn test_default_param_value_evaluates_in_enclosing_scope() {
        // size = 1; lambda (n = size): n
        let params = Node::new(NodeKind::Params, span(11)).with_children(vec![
            Node::named(NodeKind::DefaultParam, "n", span(12))
                .with_children(vec![ident("size", 13)]),
        ]);
        let lambda = Node::new(NodeKind::Lambda, span(10)).with_children(vec![
            params,
            Node::new(NodeKind::Body, span(14)).with_children(vec![ident("n", 15)]),
        ]);
        let root = program(vec![assign("size", 0, vec![]), lambda]);
        let force = run(&root);
        assert!(!var(&force, "size").unused(), "default value read it");
        assert!(!var(&force, "n").unused());
        // `size` resolved against the top level, not the lambda scope.
        assert_eq!(var(&force, "size").scope, 0);
    }

    #[test]
    fn test_params_declare_in_their_scope() {
        let func = Node::named(NodeKind::FuncDef, "f", span(10)).with_children(vec![
            Node::new(NodeKind::Params, span(11)).with_children(vec![
                Node::named(NodeKind::Param, "a", span(12)),
                Node::named(NodeKind::RestParam, "rest", span(13)),
            ]),
            Node::new(NodeKind::Body, span(14)).with_children(vec![ident("a", 15)]),
        ]);
        let root = program(vec![func]);
        let force = run(&root);
        let a = var(&force, "a");
        assert!(a.from_param);
        assert!(!a.unused());
        assert!(var(&force, "rest").unused());
    }

    #[test]
    fn test_capture_env_marks_everything_referenced() {
        let root = program(vec![
            assign("a", 0, vec![]),
            assign("b", 5, vec![]),
            Node::new(NodeKind::CaptureEnv, span(10)),
        ]);
        let force = run(&root);
        assert!(!var(&force, "a").unused());
        assert!(!var(&force, "b").unused());
        assert_eq!(var(&force, "a").dead_assignments().count(), 0);
    }

    #[test]
    fn test_op_assign_reads_then_writes() {
        let root = program(vec![
            assign("n", 0, vec![]),
            Node::named(NodeKind::OpAssign, "n", span(10)),
        ]);
        let force = run(&root);
        let n = var(&force, "n");
        assert_eq!(n.assignments.len(), 2);
        assert!(n.assignments[0].referenced, "compound assignment read it");
    }

    #[test]
    fn test_for_declares_loop_variable() {
        // for item in use(items): consume(item)
        let root = program(vec![
            assign("items", 0, vec![]),
            Node::named(NodeKind::For, "item", span(10)).with_children(vec![
                ident("items", 11),
                Node::new(NodeKind::Body, span(12)).with_children(vec![
                    Node::named(NodeKind::Call, "consume", span(13))
                        .with_children(vec![ident("item", 14)]),
                ]),
            ]),
        ]);
        let force = run(&root);
        assert!(!var(&force, "items").unused());
        assert!(!var(&force, "item").unused());
    }

    #[test]
    fn test_scope_view_orders_by_declaration() {
        let root = program(vec![assign("b", 5, vec![]), assign("a", 10, vec![])]);
        let mut force = VariableForce::new();
        force.run(&root);
        let view = ScopeView {
            scope: &force.scopes()[0],
            vars: force.variables(),
        };
        let names: Vec<&str> = view.variables().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
