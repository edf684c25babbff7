//! Public match results.
//!
//! A [`Matches`] collection is the materialized form of one evaluated
//! expression's span vector: ordered by `(start, end)`, duplicate-free, with
//! capture groups attached to the entries that have them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::vector::SpanVector;

/// Named sub-spans captured within a single match.
///
/// Labels are unique per map; inserting an existing label replaces its span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureGroups {
    groups: BTreeMap<String, Span>,
}

impl CaptureGroups {
    /// An empty group map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a label to a span, replacing any previous binding.
    pub fn insert(&mut self, label: String, span: Span) {
        self.groups.insert(label, span);
    }

    /// The span bound to a label, if any.
    pub fn get(&self, label: &str) -> Option<Span> {
        self.groups.get(label).copied()
    }

    /// The labels in this map, in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Iterate over `(label, span)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Span)> {
        self.groups.iter().map(|(label, span)| (label.as_str(), *span))
    }

    /// The number of bound labels.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true when no labels are bound.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Absorb all bindings of `other`, its bindings winning on collision.
    pub fn merge(&mut self, other: CaptureGroups) {
        self.groups.extend(other.groups);
    }
}

/// A single instance of an expression matching within a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// The matched span
    pub span: Span,
    /// Captured sub-spans, absent when nothing was captured
    pub capture_groups: Option<CaptureGroups>,
}

impl Match {
    /// The start position of the match.
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// The end position of the match.
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// The captured sub-spans, if any.
    pub fn captures(&self) -> Option<&CaptureGroups> {
        self.capture_groups.as_ref()
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.span)?;
        if let Some(groups) = &self.capture_groups {
            write!(f, ":{{")?;
            for (i, (label, span)) in groups.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{label}={span}")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

/// The ordered, deduplicated matches of one evaluated expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matches {
    matches: Vec<Match>,
}

impl Matches {
    /// Materialize a span vector's entries as matches, attaching capture
    /// groups where present.
    pub(crate) fn from_vector(vector: &SpanVector) -> Self {
        let matches = (0..vector.len())
            .map(|pos| Match {
                span: vector.span(pos),
                capture_groups: vector.captures(pos),
            })
            .collect();
        Self { matches }
    }

    /// The number of matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns true when there are no matches.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The match at the given position, if any.
    pub fn get(&self, pos: usize) -> Option<&Match> {
        self.matches.get(pos)
    }

    /// Iterate over the matches in canonical `(start, end)` order.
    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    /// A de-overlapped view suitable for final annotation emission.
    ///
    /// Matches are sorted by `(start asc, end desc)` and kept greedily when
    /// their start is at or after the end of the last kept match, so the
    /// longest match at each position wins and the result never overlaps.
    pub fn without_subsumed(&self) -> Matches {
        let mut sorted: Vec<Match> = self.matches.clone();
        sorted.sort_by(|a, b| {
            a.start()
                .cmp(&b.start())
                .then_with(|| b.end().cmp(&a.end()))
        });

        let mut kept = Vec::new();
        let mut last_end = 0usize;
        for m in sorted {
            if kept.is_empty() || m.start() >= last_end {
                last_end = m.end();
                kept.push(m);
            }
        }
        Matches { matches: kept }
    }
}

impl std::ops::Index<usize> for Matches {
    type Output = Match;

    fn index(&self, pos: usize) -> &Match {
        &self.matches[pos]
    }
}

impl<'a> IntoIterator for &'a Matches {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

impl IntoIterator for Matches {
    type Item = Match;
    type IntoIter = std::vec::IntoIter<Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

impl std::fmt::Display for Matches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, m) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{m}")?;
        }
        write!(f, "]")
    }
}
