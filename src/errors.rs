//! Error types for pattern matching.
//!
//! All errors here are deterministic functions of the expression set and the
//! sentence: there is no I/O and nothing is retried. Zero matches is a normal
//! `Ok` outcome, never an error.

use thiserror::Error;

use crate::annotation::AnnotationKind;

/// Errors that can occur while building a matcher or matching a sentence.
#[derive(Debug, Error)]
pub enum MatchError {
    /// An expression references an annotation kind the sentence cannot supply.
    ///
    /// This is a configuration error (a missing analysis layer), not a failed
    /// match, and is surfaced rather than downgraded to zero results.
    #[error("unsupported annotation kind: {0}")]
    UnsupportedAnnotation(AnnotationKind),

    /// A structurally invalid expression tree.
    ///
    /// Rejected when the matcher is constructed, before any sentence is
    /// touched.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),
}

/// Result type for matcher operations.
pub type MatchResult<T> = Result<T, MatchError>;
