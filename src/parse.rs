// src/parse.rs
//! Lowers a tree-sitter-python parse into the engine's tagged tree. This is
//! the one module that knows tree-sitter exists; the engine and rules only
//! ever see `crate::source` types, and tests are free to build trees by
//! hand instead.

use tree_sitter::{Node as TsNode, Parser};

use crate::error::{PrecinctError, Result};
use crate::source::{Node, NodeKind, SourceBuffer, SourceUnit, Span};

/// Zero-argument calls treated as capturing the entire enclosing binding
/// environment.
const CAPTURE_ALL_CALLS: &[&str] = &["locals", "vars", "globals"];

/// Parses Python source into a [`SourceUnit`]. A source whose parse carries
/// ERROR or MISSING nodes yields an invalid unit (no tree), which the
/// dispatcher answers with the single invalid-unit callback.
///
/// # Errors
///
/// Only on grammar-loading failure, which indicates a build problem rather
/// than bad input.
pub fn parse_unit(name: &str, text: &str) -> Result<SourceUnit> {
    let mut parser = Parser::new();
    parser
        .set_language(tree_sitter_python::language())
        .map_err(|e| PrecinctError::Parse(e.to_string()))?;

    let Some(tree) = parser.parse(text, None) else {
        return Ok(SourceUnit::invalid(name, text));
    };
    let root = tree.root_node();
    if root.has_error() {
        return Ok(SourceUnit::invalid(name, text));
    }

    let buffer = SourceBuffer::new(name, text);
    let program = Node::new(NodeKind::Program, ts_span(&buffer, root))
        .with_children(lower_children(root, text, &buffer));
    Ok(SourceUnit::new(buffer, Some(program)))
}

fn ts_span(buffer: &SourceBuffer, node: TsNode) -> Span {
    buffer.span(node.start_byte(), node.end_byte())
}

fn node_text<'s>(node: TsNode, src: &'s str) -> &'s str {
    &src[node.byte_range()]
}

fn lower_children(node: TsNode, src: &str, buffer: &SourceBuffer) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter_map(|child| lower(child, src, buffer))
        .collect()
}

#[allow(clippy::too_many_lines)]
fn lower(node: TsNode, src: &str, buffer: &SourceBuffer) -> Option<Node> {
    let span = ts_span(buffer, node);
    match node.kind() {
        "comment" => None,

        // Statement wrapper; the engine sees the expression directly.
        "expression_statement" => {
            let mut children = lower_children(node, src, buffer);
            match children.len() {
                0 => None,
                1 => children.pop(),
                _ => Some(Node::new(NodeKind::Other, span).with_children(children)),
            }
        }

        "block" => Some(Node::new(NodeKind::Body, span).with_children(lower_children(
            node,
            src,
            buffer,
        ))),

        "assignment" => Some(lower_assignment(node, src, buffer, span)),

        "augmented_assignment" => {
            let left = node.child_by_field_name("left")?;
            let rhs = node
                .child_by_field_name("right")
                .and_then(|right| lower(right, src, buffer));
            if left.kind() == "identifier" {
                let mut out = Node::named(NodeKind::OpAssign, node_text(left, src), span)
                    .with_name_span(ts_span(buffer, left));
                out.children.extend(rhs);
                Some(out)
            } else {
                let mut children: Vec<Node> = lower(left, src, buffer).into_iter().collect();
                children.extend(rhs);
                Some(Node::new(NodeKind::Other, span).with_children(children))
            }
        }

        "call" => Some(lower_call(node, src, buffer, span)),

        "identifier" => Some(Node::named(NodeKind::Ident, node_text(node, src), span)),

        "function_definition" => {
            let name = node.child_by_field_name("name")?;
            let params = node
                .child_by_field_name("parameters")
                .map(|p| lower_params(p, src, buffer));
            let body = node
                .child_by_field_name("body")
                .and_then(|b| lower(b, src, buffer));
            let mut children = Vec::new();
            children.extend(params);
            children.extend(body);
            Some(
                Node::named(NodeKind::FuncDef, node_text(name, src), span)
                    .with_name_span(ts_span(buffer, name))
                    .with_children(children),
            )
        }

        "lambda" => {
            let params = node
                .child_by_field_name("parameters")
                .map(|p| lower_params(p, src, buffer))
                .unwrap_or_else(|| Node::new(NodeKind::Params, span));
            let body = node
                .child_by_field_name("body")
                .and_then(|b| lower(b, src, buffer));
            let mut children = vec![params];
            children.extend(body);
            Some(Node::new(NodeKind::Lambda, span).with_children(children))
        }

        "class_definition" => {
            let name = node.child_by_field_name("name")?;
            let body = node
                .child_by_field_name("body")
                .and_then(|b| lower(b, src, buffer));
            Some(
                Node::named(NodeKind::ClassDef, node_text(name, src), span)
                    .with_name_span(ts_span(buffer, name))
                    .with_children(body.into_iter().collect()),
            )
        }

        "while_statement" => {
            let condition = node
                .child_by_field_name("condition")
                .and_then(|c| lower(c, src, buffer));
            let body = node
                .child_by_field_name("body")
                .and_then(|b| lower(b, src, buffer));
            let mut children: Vec<Node> = condition.into_iter().collect();
            children.extend(body);
            Some(Node::new(NodeKind::While, span).with_children(children))
        }

        "for_statement" => Some(lower_for(node, src, buffer, span)),

        "try_statement" => Some(Node::new(NodeKind::Rescue, span).with_children(
            lower_children(node, src, buffer),
        )),

        "if_statement" | "elif_clause" | "else_clause" | "except_clause" | "finally_clause" => {
            let kind = if node.kind() == "if_statement" {
                NodeKind::If
            } else {
                NodeKind::Other
            };
            Some(Node::new(kind, span).with_children(lower_children(node, src, buffer)))
        }

        "return_statement" => Some(Node::new(NodeKind::Return, span).with_children(
            lower_children(node, src, buffer),
        )),

        "string" | "integer" | "float" | "true" | "false" | "none" | "ellipsis" => {
            Some(Node::new(NodeKind::Literal, span))
        }

        _ => {
            let children = lower_children(node, src, buffer);
            Some(Node::new(NodeKind::Other, span).with_children(children))
        }
    }
}

fn lower_assignment(node: TsNode, src: &str, buffer: &SourceBuffer, span: Span) -> Node {
    let left = node.child_by_field_name("left");
    let rhs = node
        .child_by_field_name("right")
        .and_then(|right| lower(right, src, buffer));

    match left {
        Some(target) if target.kind() == "identifier" => {
            let mut out = Node::named(NodeKind::Assign, node_text(target, src), span)
                .with_name_span(ts_span(buffer, target));
            out.children.extend(rhs);
            out
        }
        Some(target) if matches!(target.kind(), "pattern_list" | "tuple_pattern") => {
            // Destructuring: the RHS evaluates first, then each name binds.
            let mut children: Vec<Node> = rhs.into_iter().collect();
            let mut cursor = target.walk();
            for piece in target.named_children(&mut cursor) {
                if piece.kind() == "identifier" {
                    children.push(Node::named(
                        NodeKind::PatternBind,
                        node_text(piece, src),
                        ts_span(buffer, piece),
                    ));
                }
            }
            Node::new(NodeKind::Other, span).with_children(children)
        }
        Some(target) => {
            // Attribute/subscript targets are not local bindings; their
            // object expressions still count as references.
            let mut children: Vec<Node> = lower(target, src, buffer).into_iter().collect();
            children.extend(rhs);
            Node::new(NodeKind::Other, span).with_children(children)
        }
        None => Node::new(NodeKind::Other, span).with_children(rhs.into_iter().collect()),
    }
}

fn lower_call(node: TsNode, src: &str, buffer: &SourceBuffer, span: Span) -> Node {
    let function = node.child_by_field_name("function");
    let args = node.child_by_field_name("arguments");
    let arg_nodes: Vec<Node> = args
        .map(|a| lower_children(a, src, buffer))
        .unwrap_or_default();

    match function {
        Some(f) if f.kind() == "identifier" => {
            let name = node_text(f, src);
            if arg_nodes.is_empty() && CAPTURE_ALL_CALLS.contains(&name) {
                return Node::new(NodeKind::CaptureEnv, span);
            }
            Node::named(NodeKind::Call, name, span)
                .with_name_span(ts_span(buffer, f))
                .with_children(arg_nodes)
        }
        Some(f) if f.kind() == "attribute" => {
            let method = f
                .child_by_field_name("attribute")
                .map_or("", |attr| node_text(attr, src));
            let receiver = f
                .child_by_field_name("object")
                .and_then(|obj| lower(obj, src, buffer));
            let mut children: Vec<Node> = receiver.into_iter().collect();
            children.extend(arg_nodes);
            Node::named(NodeKind::Call, method, span)
                .with_name_span(ts_span(buffer, f))
                .with_children(children)
        }
        Some(f) => {
            let mut children: Vec<Node> = lower(f, src, buffer).into_iter().collect();
            children.extend(arg_nodes);
            Node::new(NodeKind::Other, span).with_children(children)
        }
        None => Node::new(NodeKind::Other, span).with_children(arg_nodes),
    }
}

fn lower_for(node: TsNode, src: &str, buffer: &SourceBuffer, span: Span) -> Node {
    let iterable = node
        .child_by_field_name("right")
        .and_then(|r| lower(r, src, buffer));
    let body = node
        .child_by_field_name("body")
        .and_then(|b| lower(b, src, buffer));
    let left = node.child_by_field_name("left");

    match left {
        Some(target) if target.kind() == "identifier" => {
            let mut children: Vec<Node> = iterable.into_iter().collect();
            children.extend(body);
            Node::named(NodeKind::For, node_text(target, src), span)
                .with_name_span(ts_span(buffer, target))
                .with_children(children)
        }
        _ => {
            // Tuple loop targets bind via explicit pattern nodes between
            // the iterable and the body.
            let mut children: Vec<Node> = iterable.into_iter().collect();
            if let Some(target) = left {
                let mut cursor = target.walk();
                for piece in target.named_children(&mut cursor) {
                    if piece.kind() == "identifier" {
                        children.push(Node::named(
                            NodeKind::PatternBind,
                            node_text(piece, src),
                            ts_span(buffer, piece),
                        ));
                    }
                }
            }
            children.extend(body);
            Node::new(NodeKind::For, span).with_children(children)
        }
    }
}

fn lower_params(node: TsNode, src: &str, buffer: &SourceBuffer) -> Node {
    let span = ts_span(buffer, node);
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for param in node.named_children(&mut cursor) {
        match param.kind() {
            "identifier" => out.push(Node::named(
                NodeKind::Param,
                node_text(param, src),
                ts_span(buffer, param),
            )),
            "default_parameter" | "typed_default_parameter" => {
                let Some(name) = param.child_by_field_name("name") else {
                    continue;
                };
                let value = param
                    .child_by_field_name("value")
                    .and_then(|v| lower(v, src, buffer));
                let mut lowered = Node::named(
                    NodeKind::DefaultParam,
                    node_text(name, src),
                    ts_span(buffer, param),
                )
                .with_name_span(ts_span(buffer, name));
                lowered.children.extend(value);
                out.push(lowered);
            }
            "typed_parameter" => {
                let mut inner = param.walk();
                let name = param
                    .named_children(&mut inner)
                    .find(|c| c.kind() == "identifier");
                if let Some(name) = name {
                    out.push(Node::named(
                        NodeKind::Param,
                        node_text(name, src),
                        ts_span(buffer, name),
                    ));
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                let mut inner = param.walk();
                let name = param
                    .named_children(&mut inner)
                    .find(|c| c.kind() == "identifier");
                if let Some(name) = name {
                    out.push(Node::named(
                        NodeKind::RestParam,
                        node_text(name, src),
                        ts_span(buffer, param),
                    ));
                }
            }
            _ => {}
        }
    }
    Node::new(NodeKind::Params, span).with_children(out)
}
