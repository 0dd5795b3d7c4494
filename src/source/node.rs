// src/source/node.rs
//! The engine's tree: a closed set of discriminant tags over plain owned
//! nodes. Parsers lower their concrete syntax into this shape (see
//! `crate::parse`); the engine and rules never see the parser's types.

use super::buffer::Span;

/// Discriminant tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Top-level unit.
    Program,
    /// Ordered statement sequence.
    Body,
    /// Method/function invocation. High-frequency tag: dispatch can filter
    /// by the call's target name before invoking a rule.
    Call,
    /// Named function definition. Introduces an opaque scope.
    FuncDef,
    /// Anonymous closure. Introduces a scope transparent to its parent;
    /// default-argument expressions evaluate in the enclosing scope.
    Lambda,
    /// Class-like body. Introduces an opaque scope.
    ClassDef,
    /// Formal parameter list.
    Params,
    /// Plain formal parameter.
    Param,
    /// Parameter with a default value (single child: the default expression).
    DefaultParam,
    /// Rest/splat parameter.
    RestParam,
    /// Local assignment; `name` is the target, single child is the RHS.
    Assign,
    /// Compound assignment (`x += ...`): reads then writes `name`.
    OpAssign,
    /// Pattern-match capture target.
    PatternBind,
    /// Local variable reference.
    Ident,
    If,
    /// Pre-condition loop: condition child first, then body.
    While,
    /// Post-condition loop: body executes before the condition is tested.
    DoWhile,
    /// Iteration loop; `name` is the loop variable, children are the
    /// iterable then the body.
    For,
    /// Exception handler construct; with a `Retry` inside, a loop in effect.
    Rescue,
    /// Restart of the enclosing rescue body.
    Retry,
    /// Bare capture of the entire enclosing binding environment.
    CaptureEnv,
    Return,
    Literal,
    /// Anything the engine has no special knowledge of; children still walk.
    Other,
}

/// Tags that never carry children: descent and the leave callback are
/// skipped for them.
pub const CHILDLESS: &[NodeKind] = &[
    NodeKind::Param,
    NodeKind::RestParam,
    NodeKind::PatternBind,
    NodeKind::Ident,
    NodeKind::Retry,
    NodeKind::CaptureEnv,
    NodeKind::Literal,
];

impl NodeKind {
    #[must_use]
    pub fn is_childless(self) -> bool {
        CHILDLESS.contains(&self)
    }

    /// True for the kinds VariableForce treats as loops.
    #[must_use]
    pub fn is_loop(self) -> bool {
        matches!(self, NodeKind::While | NodeKind::DoWhile | NodeKind::For)
    }
}

/// One node of the analyzed tree. Immutable for the duration of an
/// investigation.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Inner discriminant where the tag has one: the call's target method
    /// name, the assignment/reference/parameter variable name.
    pub name: Option<String>,
    /// Span of just the name token, when narrower than the node. Rewrites
    /// that rename a binding target this instead of the whole node.
    pub name_span: Option<Span>,
    pub children: Vec<Node>,
    pub span: Span,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            name: None,
            name_span: None,
            children: Vec::new(),
            span,
        }
    }

    #[must_use]
    pub fn named(kind: NodeKind, name: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            name_span: None,
            children: Vec::new(),
            span,
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_name_span(mut self, span: Span) -> Self {
        self.name_span = Some(span);
        self
    }

    /// The name token's span, falling back to the whole node.
    #[must_use]
    pub fn name_span_or_self(&self) -> Span {
        self.name_span.unwrap_or(self.span)
    }

    /// Name as a plain str, empty when absent.
    #[must_use]
    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Number of nodes in this subtree, including self.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        1 + self.children.iter().map(Node::descendant_count).sum::<usize>()
    }
}
