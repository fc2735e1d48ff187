//! Error types for termgroup.
//!
//! Library crates use [`TermGroupError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::fmt;
use std::path::PathBuf;

/// Where an empty section list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyOrigin {
    /// The caller's header configuration produced no sections.
    Configuration,
    /// A sections source (file path or builtin name) held no sections.
    Source(String),
}

impl fmt::Display for EmptyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "header configuration"),
            Self::Source(source) => write!(f, "{source}"),
        }
    }
}

/// Top-level error type for all termgroup operations.
#[derive(Debug, thiserror::Error)]
pub enum TermGroupError {
    /// A referenced term identifier is absent from the graph.
    #[error("unknown term: {term}")]
    UnknownTerm { term: String },

    /// Invalid or inconsistent caller-supplied headers or settings.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A source or configuration yielded zero sections.
    #[error("no sections found in {origin}")]
    EmptySections { origin: EmptyOrigin },

    /// A section encoding violates catch-all placement, name uniqueness,
    /// or cannot be parsed at all.
    #[error("malformed sections in {input}{}: {message}", line_suffix(.line))]
    MalformedSections {
        input: String,
        line: Option<usize>,
        message: String,
    },

    /// Filesystem I/O failure while reading or writing.
    #[error("storage error at {path:?}: {source}")]
    Storage {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TermGroupError>;

impl TermGroupError {
    /// Create an unknown-term error.
    pub fn unknown_term(term: impl Into<String>) -> Self {
        Self::UnknownTerm { term: term.into() }
    }

    /// Create a configuration error from any displayable message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Empty section list caused by the caller's header configuration.
    pub fn empty_configuration() -> Self {
        Self::EmptySections {
            origin: EmptyOrigin::Configuration,
        }
    }

    /// Empty section list read from a named source.
    pub fn empty_source(source: impl Into<String>) -> Self {
        Self::EmptySections {
            origin: EmptyOrigin::Source(source.into()),
        }
    }

    /// Create a malformed-sections error, optionally pinned to a 1-based line.
    pub fn malformed(input: impl Into<String>, line: Option<usize>, msg: impl Into<String>) -> Self {
        Self::MalformedSections {
            input: input.into(),
            line,
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
