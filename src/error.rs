// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrecinctError {
    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("ambiguous rule name `{name}`: matches {}", candidates.join(", "))]
    AmbiguousRule {
        name: String,
        candidates: Vec<String>,
    },

    #[error("unknown severity `{0}` (expected info, refactor, convention, warning, error or fatal)")]
    UnknownSeverity(String),

    #[error("conflicting corrections for bytes {start}..{end}: `{ours}` vs `{theirs}`")]
    Clobber {
        start: usize,
        end: usize,
        ours: String,
        theirs: String,
    },

    #[error("edit {start}..{end} is outside the source buffer (len {len})")]
    EditOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("correctors target different buffers ({0} vs {1} bytes)")]
    BufferMismatch(usize, usize),

    #[error("parser error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Rule(String),
}

pub type Result<T> = std::result::Result<T, PrecinctError>;

// Allow `?` on std::io::Error by converting with an unknown path.
impl From<std::io::Error> for PrecinctError {
    fn from(source: std::io::Error) -> Self {
        PrecinctError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

impl PrecinctError {
    /// Wraps an arbitrary message as a rule-execution error. Rules use this
    /// to surface internal failures without aborting the investigation.
    pub fn rule(msg: impl Into<String>) -> Self {
        PrecinctError::Rule(msg.into())
    }
}
