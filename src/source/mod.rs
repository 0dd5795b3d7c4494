// src/source/mod.rs
//! Source-side data model: the immutable buffer, the engine's tree, and the
//! bundle handed to an investigation.

mod buffer;
mod node;

pub use buffer::{SourceBuffer, Span};
pub use node::{Node, NodeKind, CHILDLESS};

use crate::suppression::SuppressionIndex;

/// One analyzable unit: a named buffer, its lowered tree (absent when the
/// source failed to parse), and the unit's inline suppression index.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub buffer: SourceBuffer,
    /// `None` for syntactically invalid input; the dispatcher then skips
    /// the walk and fires the single invalid-unit callback instead.
    pub root: Option<Node>,
    pub suppressions: SuppressionIndex,
}

impl SourceUnit {
    #[must_use]
    pub fn new(buffer: SourceBuffer, root: Option<Node>) -> Self {
        let suppressions = SuppressionIndex::parse(buffer.text());
        Self {
            buffer,
            root,
            suppressions,
        }
    }

    /// A unit built straight from text and an already-lowered tree; used by
    /// tests and embedders that bring their own parser.
    #[must_use]
    pub fn from_parts(name: &str, text: &str, root: Node) -> Self {
        Self::new(SourceBuffer::new(name, text), Some(root))
    }

    /// An unparsable unit.
    #[must_use]
    pub fn invalid(name: &str, text: &str) -> Self {
        Self::new(SourceBuffer::new(name, text), None)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.buffer.name()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.root.is_some()
    }
}
