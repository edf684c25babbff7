//! Span vectors and capture provenance.
//!
//! A [`SpanVector`] is an ordered, duplicate-free set of spans over one
//! sentence, the unit of intermediate computation in the algebra. Entries are
//! always enumerable in ascending `(start, end)` order; the two-pointer scans
//! in [`crate::algebra`] rely on that invariant.
//!
//! Capture information rides along only when an operand already carries it,
//! so plain vectors pay no overhead. The variants encode the three
//! provenance strategies:
//!
//! - [`SpanVector::Labeled`] binds every entry's own span to a name (the
//!   result of a capture expression).
//! - [`SpanVector::SourceBased`] is used when entries are taken verbatim from
//!   the inputs (OR / IS / ISNT): groups are recovered by looking the same
//!   span up in each capturing input.
//! - [`SpanVector::Constructive`] is used when entries are new combinations
//!   (sequence / with / repeat): each entry records which input entries
//!   contributed to it, and group lookup unions their groups lazily.

use std::rc::Rc;

use crate::matches::CaptureGroups;
use crate::span::Span;

/// A contributing entry of a capturing input vector.
#[derive(Debug, Clone)]
pub struct Origin {
    pub(crate) source: Rc<SpanVector>,
    pub(crate) pos: usize,
}

impl Origin {
    pub(crate) fn new(source: Rc<SpanVector>, pos: usize) -> Self {
        Self { source, pos }
    }
}

/// An ordered, duplicate-free set of spans, with optional capture provenance.
#[derive(Debug, Clone)]
pub enum SpanVector {
    /// No capture information
    Plain(Vec<Span>),
    /// Every entry's own span carries `label`, on top of any groups the
    /// inner vector already had
    Labeled {
        label: String,
        inner: Rc<SpanVector>,
    },
    /// Entries appear verbatim in the capturing `sources`
    SourceBased {
        entries: Vec<Span>,
        sources: Vec<Rc<SpanVector>>,
    },
    /// Entries are combinations; `origins[i]` lists the capturing input
    /// entries that produced `entries[i]`
    Constructive {
        entries: Vec<Span>,
        origins: Vec<Vec<Origin>>,
    },
}

impl Default for SpanVector {
    fn default() -> Self {
        Self::empty()
    }
}

impl SpanVector {
    /// The empty vector.
    pub fn empty() -> Self {
        SpanVector::Plain(Vec::new())
    }

    /// A plain vector from arbitrary spans, normalized into canonical order
    /// with duplicates removed.
    pub fn from_spans(mut spans: Vec<Span>) -> Self {
        spans.sort_unstable();
        spans.dedup();
        SpanVector::Plain(spans)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.spans().len()
    }

    /// Returns true if the vector has no entries.
    pub fn is_empty(&self) -> bool {
        self.spans().is_empty()
    }

    /// The entries in ascending `(start, end)` order.
    pub fn spans(&self) -> &[Span] {
        match self {
            SpanVector::Plain(spans) => spans,
            SpanVector::Labeled { inner, .. } => inner.spans(),
            SpanVector::SourceBased { entries, .. }
            | SpanVector::Constructive { entries, .. } => entries,
        }
    }

    /// The entry at the given position.
    ///
    /// # Panics
    /// Panics if `pos` is out of range.
    pub fn span(&self, pos: usize) -> Span {
        self.spans()[pos]
    }

    /// The position of an exact span, if present.
    pub fn position_of(&self, span: Span) -> Option<usize> {
        self.spans().binary_search(&span).ok()
    }

    /// Whether this vector carries capture information for any entry.
    pub fn is_capturing(&self) -> bool {
        !matches!(self, SpanVector::Plain(_))
    }

    /// The capture groups of the entry at `pos`.
    ///
    /// Returns `None` when the entry carries no groups; asking a plain vector
    /// or an uncaptured entry is not an error.
    pub fn captures(&self, pos: usize) -> Option<CaptureGroups> {
        match self {
            SpanVector::Plain(_) => None,
            SpanVector::Labeled { label, inner } => {
                let mut groups = inner.captures(pos).unwrap_or_default();
                // The outer label wins over an inner group of the same name.
                groups.insert(label.clone(), inner.span(pos));
                Some(groups)
            }
            SpanVector::SourceBased { entries, sources } => {
                let span = *entries.get(pos)?;
                let mut groups = CaptureGroups::default();
                for source in sources {
                    if let Some(source_pos) = source.position_of(span) {
                        if let Some(sub) = source.captures(source_pos) {
                            groups.merge(sub);
                        }
                    }
                }
                if groups.is_empty() {
                    None
                } else {
                    Some(groups)
                }
            }
            SpanVector::Constructive { origins, .. } => {
                let mut groups = CaptureGroups::default();
                for origin in origins.get(pos)? {
                    if let Some(sub) = origin.source.captures(origin.pos) {
                        groups.merge(sub);
                    }
                }
                if groups.is_empty() {
                    None
                } else {
                    Some(groups)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(pairs: &[(usize, usize)]) -> Vec<Span> {
        pairs.iter().map(|&(s, e)| Span::new(s, e)).collect()
    }

    #[test]
    fn from_spans_sorts_and_deduplicates() {
        let v = SpanVector::from_spans(spans(&[(2, 3), (0, 1), (2, 3), (0, 2)]));
        assert_eq!(v.spans(), spans(&[(0, 1), (0, 2), (2, 3)]).as_slice());
        assert_eq!(v.len(), 3);
        assert!(!v.is_capturing());
    }

    #[test]
    fn plain_entries_have_no_captures() {
        let v = SpanVector::from_spans(spans(&[(0, 1)]));
        assert_eq!(v.captures(0), None);
    }

    #[test]
    fn labeled_vector_binds_each_entry_to_its_own_span() {
        let inner = Rc::new(SpanVector::from_spans(spans(&[(0, 1), (2, 3)])));
        let labeled = SpanVector::Labeled {
            label: "x".to_string(),
            inner,
        };
        assert!(labeled.is_capturing());
        let groups = labeled.captures(1).unwrap();
        assert_eq!(groups.get("x"), Some(Span::new(2, 3)));
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn nested_labels_accumulate_and_outer_wins_on_collision() {
        let base = Rc::new(SpanVector::from_spans(spans(&[(1, 4)])));
        let once = Rc::new(SpanVector::Labeled {
            label: "inner".to_string(),
            inner: base,
        });
        let twice = SpanVector::Labeled {
            label: "outer".to_string(),
            inner: once.clone(),
        };
        let groups = twice.captures(0).unwrap();
        assert_eq!(groups.get("inner"), Some(Span::new(1, 4)));
        assert_eq!(groups.get("outer"), Some(Span::new(1, 4)));

        let shadowing = SpanVector::Labeled {
            label: "inner".to_string(),
            inner: once,
        };
        let groups = shadowing.captures(0).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("inner"), Some(Span::new(1, 4)));
    }

    #[test]
    fn source_based_lookup_finds_groups_by_exact_span() {
        let captured = Rc::new(SpanVector::Labeled {
            label: "hit".to_string(),
            inner: Rc::new(SpanVector::from_spans(spans(&[(1, 2)]))),
        });
        let v = SpanVector::SourceBased {
            entries: spans(&[(0, 1), (1, 2)]),
            sources: vec![captured],
        };
        // (0,1) is not in the capturing source
        assert_eq!(v.captures(0), None);
        let groups = v.captures(1).unwrap();
        assert_eq!(groups.get("hit"), Some(Span::new(1, 2)));
    }

    #[test]
    fn constructive_lookup_unions_origin_groups() {
        let left = Rc::new(SpanVector::Labeled {
            label: "a".to_string(),
            inner: Rc::new(SpanVector::from_spans(spans(&[(0, 1)]))),
        });
        let right = Rc::new(SpanVector::Labeled {
            label: "b".to_string(),
            inner: Rc::new(SpanVector::from_spans(spans(&[(1, 3)]))),
        });
        let v = SpanVector::Constructive {
            entries: spans(&[(0, 3)]),
            origins: vec![vec![Origin::new(left, 0), Origin::new(right, 0)]],
        };
        let groups = v.captures(0).unwrap();
        assert_eq!(groups.get("a"), Some(Span::new(0, 1)));
        assert_eq!(groups.get("b"), Some(Span::new(1, 3)));
    }

    #[test]
    fn constructive_entry_without_origins_has_no_captures() {
        let v = SpanVector::Constructive {
            entries: spans(&[(0, 2)]),
            origins: vec![vec![]],
        };
        assert_eq!(v.captures(0), None);
    }
}
