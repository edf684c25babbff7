//! Token-index spans.

use serde::{Deserialize, Serialize};

/// A half-open token interval within one sentence.
///
/// `start` is inclusive and `end` exclusive, both in token-index units.
/// Spans order by `(start, end)`, which is the canonical iteration order of
/// every span vector in this crate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    /// Inclusive start token index
    pub start: usize,
    /// Exclusive end token index
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The number of tokens covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true for zero-width spans (e.g. boundary markers and the
    /// zero-occurrence case of repetition).
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `other` lies inside this span: it starts at or after
    /// our start, strictly before our end, and ends at or before our end.
    pub fn contains(&self, other: Span) -> bool {
        other.start >= self.start && other.start < self.end && other.end <= self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.start, self.end)
    }
}
