// src/source/buffer.rs
//! Immutable source text plus the byte/line bookkeeping every other
//! component leans on.

/// A byte range into one [`SourceBuffer`], with the line/column of its start
/// precomputed so offense rendering never re-scans the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// 1-based line of `start`.
    pub line: usize,
    /// 0-based column of `start`.
    pub column: usize,
}

impl Span {
    /// Sentinel zero-width location used by global offenses.
    pub const GLOBAL: Span = Span {
        start: 0,
        end: 0,
        line: 0,
        column: 0,
    };

    #[must_use]
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        *self == Span::GLOBAL
    }

    /// True if `other` lies entirely within this span.
    #[must_use]
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// The source text of one unit, immutable for the duration of an
/// investigation.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    name: String,
    text: String,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// (1-based line, 0-based column) of a byte offset.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line_idx + 1, offset - self.line_starts[line_idx])
    }

    /// Text of a 1-based line, without its trailing newline. Empty for
    /// out-of-range lines (including the global sentinel's line 0).
    #[must_use]
    pub fn line_text(&self, line: usize) -> &str {
        if line == 0 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map_or(self.text.len(), |next| next - 1);
        &self.text[start..end.max(start)]
    }

    /// Builds a span for a byte range, resolving line/column of its start.
    #[must_use]
    pub fn span(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.line_col(start);
        Span::new(start, end, line, column)
    }

    /// The text a span covers.
    #[must_use]
    pub fn slice(&self, span: &Span) -> &str {
        &self.text[span.start..span.end]
    }

    /// Zero-width span at the end of the line containing `span`, just before
    /// the newline. Used to append end-of-line markers.
    #[must_use]
    pub fn end_of_line(&self, span: &Span) -> Span {
        let (line, _) = self.line_col(span.start);
        let start = self.line_starts[line - 1];
        let end = self
            .line_starts
            .get(line)
            .map_or(self.text.len(), |next| next - 1);
        Span::new(end.max(start), end.max(start), line, end.max(start) - start)
    }
}
