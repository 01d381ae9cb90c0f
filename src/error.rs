//! Error types for dataset loading.

use thiserror::Error;

/// Why the reference dataset could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The source could not be accessed (missing path, I/O failure, unknown format)
    SourceUnavailable,
    /// The source was read but is structurally invalid
    ParseFailure,
}

impl std::fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadErrorKind::SourceUnavailable => write!(f, "source unavailable"),
            LoadErrorKind::ParseFailure => write!(f, "parse failure"),
        }
    }
}

/// A failed load attempt. Never cached: the next `ensure_loaded` retries.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {detail}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub detail: String,
}

impl LoadError {
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            kind: LoadErrorKind::SourceUnavailable,
            detail: detail.into(),
        }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self {
            kind: LoadErrorKind::ParseFailure,
            detail: detail.into(),
        }
    }
}
