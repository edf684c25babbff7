//! Pattern-expression matching over annotated token sequences.
//!
//! This crate evaluates pattern expressions against sentences that carry
//! pre-computed annotation layers (tokens, stems, part-of-speech tags,
//! chunks, concepts). An expression tree is compiled once into a
//! [`SentenceMatcher`] and reused across sentences; each match call indexes
//! only the annotations the expressions reference and evaluates bottom-up
//! through a span-set algebra.
//!
//! ## Core Types
//!
//! - [`Expression`] - The pattern expression tree (leaves, OR / IS / ISNT /
//!   SEQUENCE, repetition, containment, captures, regex)
//! - [`Sentence`] / [`AnnotatedSentence`] - The annotated-sentence contract
//!   and a layer-by-layer implementation of it
//! - [`SentenceMatcher`] - Compiled expressions, ready to match
//! - [`Matches`] / [`Match`] / [`CaptureGroups`] - Match results
//!
//! ## Example
//!
//! ```
//! use sentence_patterns::{AnnotatedSentence, Expression, SentenceMatcher};
//!
//! let expression = Expression::sequence(vec![
//!     Expression::token("big"),
//!     Expression::token("dog"),
//! ]);
//! let matcher = SentenceMatcher::for_expression(expression)?;
//!
//! let sentence = AnnotatedSentence::from_tokens(&["my", "big", "dog"]);
//! let matches = matcher.match_sentence(&sentence)?;
//! assert_eq!(matches.len(), 1);
//! assert_eq!((matches[0].start(), matches[0].end()), (1, 3));
//! # Ok::<(), sentence_patterns::MatchError>(())
//! ```

mod algebra;
mod annotation;
mod errors;
mod expr;
mod matcher;
mod matches;
mod span;
mod vector;

// Sentence and annotation types
pub use annotation::{
    AnnotatedSentence,
    Annotation,
    AnnotationKind,
    Sentence,
    SENTENCE_END,
    SENTENCE_START,
};

// Expression tree
pub use expr::{
    AnnotationPattern,
    CompoundOp,
    Expression,
};

// Matching
pub use matcher::SentenceMatcher;
pub use matches::{
    CaptureGroups,
    Match,
    Matches,
};

// Spans and errors
pub use errors::{MatchError, MatchResult};
pub use span::Span;
