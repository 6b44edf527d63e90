// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Error types shared across the crate.

use crate::composition::PatternUid;
use thiserror::Error;

/// Everything that can go wrong while editing, loading, or saving a score.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file isn't JSON, or doesn't match the document shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file parsed, but its contents break a structural rule.
    #[error("invalid score file: {0}")]
    InvalidFile(String),

    /// A pattern with this name already exists.
    #[error("a pattern named '{0}' already exists")]
    DuplicatePatternName(String),

    /// No pattern has this uid.
    #[error("pattern {0} not found")]
    PatternNotFound(PatternUid),

    /// An internal cross-reference that must hold did not.
    #[error("inconsistent score state: {0}")]
    Inconsistent(String),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, ScoreError>;
