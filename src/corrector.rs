// src/corrector.rs
//! The rewrite transaction: an edit set against one immutable source
//! buffer, rendered in a single pass. Conflicting rewrites ("clobbering")
//! are a hard failure, never a silent pick.

use std::sync::Arc;

use crate::error::{PrecinctError, Result};
use crate::source::{SourceBuffer, Span};

/// How an edit's text lands relative to its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EditKind {
    /// Zero-width insertion at the range's end.
    InsertAfter,
    /// Zero-width insertion at the range's start.
    InsertBefore,
    /// Deletion of the range. Overlapping removals coalesce.
    Remove,
    /// Replacement of the range.
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub kind: EditKind,
    pub text: String,
}

impl Edit {
    /// Sort key: position, then kind so that zero-width insertions at a
    /// boundary render close-markers before open-markers, then text for
    /// determinism.
    fn key(&self) -> (usize, usize, EditKind, &str) {
        (self.start, self.end, self.kind, &self.text)
    }

    /// Interior overlap; zero-width edits never overlap anything.
    fn overlaps(&self, other: &Edit) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// Accumulates non-overlapping text edits against one source buffer and
/// renders the corrected text. One instance per rule per investigation;
/// the orchestrator merges them into an aggregate before rendering.
#[derive(Debug, Clone)]
pub struct Corrector {
    source: Arc<str>,
    edits: Vec<Edit>,
}

impl Corrector {
    #[must_use]
    pub fn new(buffer: &SourceBuffer) -> Self {
        Self::from_text(buffer.text())
    }

    #[must_use]
    pub fn from_text(source: &str) -> Self {
        Self {
            source: Arc::from(source),
            edits: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    fn push(&mut self, start: usize, end: usize, kind: EditKind, text: String) {
        self.edits.push(Edit {
            start,
            end,
            kind,
            text,
        });
    }

    pub fn insert_before(&mut self, span: &Span, text: impl Into<String>) {
        self.push(span.start, span.start, EditKind::InsertBefore, text.into());
    }

    pub fn insert_after(&mut self, span: &Span, text: impl Into<String>) {
        self.push(span.end, span.end, EditKind::InsertAfter, text.into());
    }

    pub fn replace(&mut self, span: &Span, text: impl Into<String>) {
        self.push(span.start, span.end, EditKind::Replace, text.into());
    }

    pub fn remove(&mut self, span: &Span) {
        self.push(span.start, span.end, EditKind::Remove, String::new());
    }

    pub fn wrap(&mut self, span: &Span, before: impl Into<String>, after: impl Into<String>) {
        self.insert_before(span, before);
        self.insert_after(span, after);
    }

    /// Exchanges the text of two disjoint ranges. Adjacent ranges lower to
    /// a removal plus an insertion; anything else is a pair of replaces.
    pub fn swap(&mut self, a: &Span, b: &Span) {
        let (first, second) = if a.start <= b.start { (a, b) } else { (b, a) };
        let first_text = self.source[first.start..first.end].to_string();
        if first.end == second.start {
            self.remove(first);
            self.insert_after(second, first_text);
        } else {
            let second_text = self.source[second.start..second.end].to_string();
            self.replace(first, second_text);
            self.replace(second, first_text);
        }
    }

    /// Unions another corrector over the same buffer into this one.
    ///
    /// # Errors
    ///
    /// [`PrecinctError::BufferMismatch`] when the two correctors were built
    /// against different buffers; [`PrecinctError::Clobber`] when the other
    /// corrector rewrites a range this one already rewrites differently.
    /// Identical `(range, kind, text)` edits merge idempotently.
    pub fn merge(&mut self, other: &Corrector) -> Result<()> {
        if self.source.len() != other.source.len() {
            return Err(PrecinctError::BufferMismatch(
                self.source.len(),
                other.source.len(),
            ));
        }
        for edit in &other.edits {
            let direct_clobber = self.edits.iter().find(|ours| {
                ours.start == edit.start
                    && ours.end == edit.end
                    && ours.kind == edit.kind
                    && ours.text != edit.text
            });
            if let Some(ours) = direct_clobber {
                return Err(PrecinctError::Clobber {
                    start: edit.start,
                    end: edit.end,
                    ours: ours.text.clone(),
                    theirs: edit.text.clone(),
                });
            }
        }
        self.edits.extend(other.edits.iter().cloned());
        Ok(())
    }

    /// Adopts a corrector built against a unit embedded inside this buffer,
    /// translating its ranges by the embedding offset. Bounds are validated
    /// when the aggregate renders.
    pub fn import(&mut self, other: &Corrector, offset: usize) {
        for edit in &other.edits {
            self.push(
                edit.start + offset,
                edit.end + offset,
                edit.kind,
                edit.text.clone(),
            );
        }
    }

    /// Renders the corrected text by applying every edit against the
    /// original buffer in one pass. The original is never mutated; zero
    /// edits round-trips it byte for byte.
    ///
    /// # Errors
    ///
    /// [`PrecinctError::EditOutOfBounds`] when an edit falls outside the
    /// buffer; [`PrecinctError::Clobber`] when two overlapping edits would
    /// produce different text (overlapping removals are tolerated and
    /// coalesced).
    pub fn rewrite(&self) -> Result<String> {
        let applied = self.validate()?;

        let src = &*self.source;
        let mut out = String::with_capacity(src.len());
        let mut cursor = 0;
        for edit in &applied {
            out.push_str(&src[cursor..edit.start]);
            out.push_str(&edit.text);
            cursor = cursor.max(edit.end);
        }
        out.push_str(&src[cursor..]);
        Ok(out)
    }

    /// Normalizes, sorts and conflict-checks the edit set, returning the
    /// edits in application order.
    fn validate(&self) -> Result<Vec<Edit>> {
        let len = self.source.len();
        for edit in &self.edits {
            if edit.start > edit.end || edit.end > len {
                return Err(PrecinctError::EditOutOfBounds {
                    start: edit.start,
                    end: edit.end,
                    len,
                });
            }
        }

        let mut edits = self.edits.clone();
        edits.sort_by(|a, b| a.key().cmp(&b.key()));
        edits.dedup();

        // Edits are position-sorted, so any overlap involves the ranged
        // edit with the greatest end seen so far ("covering"); zero-width
        // insertions between two covered regions can sit in between.
        let mut applied: Vec<Edit> = Vec::with_capacity(edits.len());
        let mut covering: Option<usize> = None;
        for edit in edits {
            if let Some(ci) = covering {
                let prev = &mut applied[ci];
                let conflict = if edit.start == edit.end {
                    // An insertion strictly inside a rewritten range would
                    // land in text that no longer exists.
                    prev.start < edit.start && edit.start < prev.end
                } else {
                    prev.overlaps(&edit)
                };
                if conflict {
                    // Last-applicable semantics for overlapping removals;
                    // any other overlap is two different rewrites of the
                    // same bytes.
                    if prev.kind == EditKind::Remove && edit.kind == EditKind::Remove {
                        prev.end = prev.end.max(edit.end);
                        continue;
                    }
                    return Err(PrecinctError::Clobber {
                        start: edit.start,
                        end: edit.end,
                        ours: prev.text.clone(),
                        theirs: edit.text,
                    });
                }
            }
            let ranged = edit.start < edit.end;
            let end = edit.end;
            applied.push(edit);
            if ranged {
                let extends = covering.map_or(true, |ci| applied[ci].end < end);
                if extends {
                    covering = Some(applied.len() - 1);
                }
            }
        }
        Ok(applied)
    }
}
