//! Vector implementations of the pattern operators.
//!
//! Every operator is a pure function over sorted span vectors. The sequence
//! and containment joins use monotonic two-pointer scans instead of nested
//! loops; this is sound only because the outer vector's entries are visited
//! in ascending `(start, end)` order, so the inner lower bound never moves
//! backwards. Results are normalized (sorted, deduplicated) before they are
//! returned, which re-establishes the ordering invariant for the next
//! operator up the tree.
//!
//! Capture provenance is selected automatically from the operands: plain
//! inputs produce plain outputs; selective operators (OR / IS / ISNT) wrap
//! capturing inputs as lookup sources; constructive operators (sequence /
//! with, and repeat through them) record per-entry origins.

use std::rc::Rc;

use crate::span::Span;
use crate::vector::{Origin, SpanVector};

/// Left-fold adjacency concatenation.
///
/// For consecutive vectors A, B: every pair `(s,e) ∈ A`, `(e,e2) ∈ B` joined
/// at the shared position emits `(s,e2)`. Folding short-circuits as soon as
/// an intermediate result is empty.
pub fn sequence(vectors: &[Rc<SpanVector>]) -> Rc<SpanVector> {
    let Some((first, rest)) = vectors.split_first() else {
        return Rc::new(SpanVector::empty());
    };
    let mut result = Rc::clone(first);
    for v in rest {
        result = sequence_pair(&result, v);
        if result.is_empty() {
            break;
        }
    }
    result
}

fn sequence_pair(a: &Rc<SpanVector>, b: &Rc<SpanVector>) -> Rc<SpanVector> {
    let mut builder = ResultBuilder::for_inputs(&[a, b]);
    let b_spans = b.spans();
    let mut lower = 0;
    for (i, &span) in a.spans().iter().enumerate() {
        // `lower` only advances: `a` is sorted by start, so the first
        // possibly-adjacent entry of `b` is non-decreasing.
        while lower < b_spans.len() && b_spans[lower].start < span.start {
            lower += 1;
        }
        if lower == b_spans.len() {
            break;
        }
        for (j, &next) in b_spans.iter().enumerate().skip(lower) {
            if next.start == span.end {
                builder.push(Span::new(span.start, next.end), &[(a, i), (b, j)]);
            } else if next.start > span.end {
                break;
            }
        }
    }
    builder.finish()
}

/// Exact-span set union. The union of nothing is the empty vector.
pub fn or(vectors: &[Rc<SpanVector>]) -> Rc<SpanVector> {
    let mut entries: Vec<Span> = Vec::new();
    for v in vectors {
        entries.extend_from_slice(v.spans());
    }
    entries.sort_unstable();
    entries.dedup();
    selective_result(entries, vectors)
}

/// Exact-span set intersection.
pub fn is(vectors: &[Rc<SpanVector>]) -> Rc<SpanVector> {
    let Some((first, rest)) = vectors.split_first() else {
        return Rc::new(SpanVector::empty());
    };
    let entries = first
        .spans()
        .iter()
        .copied()
        .filter(|&span| rest.iter().all(|v| v.position_of(span).is_some()))
        .collect();
    selective_result(entries, vectors)
}

/// Exact-span set difference `a \ b`.
pub fn isnt(a: &Rc<SpanVector>, b: &Rc<SpanVector>) -> Rc<SpanVector> {
    let entries = a
        .spans()
        .iter()
        .copied()
        .filter(|&span| b.position_of(span).is_none())
        .collect();
    selective_result(entries, &[Rc::clone(a), Rc::clone(b)])
}

/// Bounded repetition of `v`, between `min` and `max` adjacent occurrences.
///
/// The zero-occurrence case is represented explicitly as a zero-width span at
/// every token boundary, which is the identity of concatenation and is what
/// makes optional elements compose inside sequences. All intermediate lengths
/// are OR-ed together; extension stops early once a length yields nothing.
pub fn repeat(v: &Rc<SpanVector>, min: usize, max: usize, max_tokens: usize) -> Rc<SpanVector> {
    let mut result = if min == 0 {
        let boundaries = (0..=max_tokens).map(|i| Span::new(i, i)).collect();
        Rc::new(SpanVector::Plain(boundaries))
    } else {
        let copies: Vec<Rc<SpanVector>> = (0..min).map(|_| Rc::clone(v)).collect();
        sequence(&copies)
    };

    if result.is_empty() {
        return result;
    }

    let mut lengths = vec![Rc::clone(&result)];
    for _ in (min + 1)..=max {
        result = sequence_pair(&result, v);
        if result.is_empty() {
            break;
        }
        lengths.push(Rc::clone(&result));
    }
    or(&lengths)
}

/// Containment join: keep each entry of `v` once if some entry of
/// `contained` starts inside it and ends at or before its end.
pub fn with(v: &Rc<SpanVector>, contained: &Rc<SpanVector>) -> Rc<SpanVector> {
    let mut builder = ResultBuilder::for_inputs(&[v, contained]);
    let inner = contained.spans();
    let mut lower = 0;
    for (i, &span) in v.spans().iter().enumerate() {
        while lower < inner.len() && inner[lower].start < span.start {
            lower += 1;
        }
        for (j, &candidate) in inner.iter().enumerate().skip(lower) {
            if candidate.start >= span.end {
                break;
            }
            if candidate.end <= span.end {
                builder.push(span, &[(v, i), (contained, j)]);
                break;
            }
        }
    }
    builder.finish()
}

/// Bind every entry of `v` to a named capture group.
pub fn capture(v: &Rc<SpanVector>, label: impl Into<String>) -> Rc<SpanVector> {
    Rc::new(SpanVector::Labeled {
        label: label.into(),
        inner: Rc::clone(v),
    })
}

// Selective operators take their output entries verbatim from the inputs, so
// capture groups can be recovered later by span lookup in the capturing
// inputs.
fn selective_result(entries: Vec<Span>, inputs: &[Rc<SpanVector>]) -> Rc<SpanVector> {
    let sources: Vec<Rc<SpanVector>> = inputs
        .iter()
        .filter(|v| v.is_capturing())
        .map(Rc::clone)
        .collect();
    if sources.is_empty() {
        Rc::new(SpanVector::Plain(entries))
    } else {
        Rc::new(SpanVector::SourceBased { entries, sources })
    }
}

// Accumulates the output of a constructive operator, tracking origins only
// when an input actually captures.
enum ResultBuilder {
    Plain(Vec<Span>),
    Capturing(Vec<(Span, Vec<Origin>)>),
}

impl ResultBuilder {
    fn for_inputs(inputs: &[&Rc<SpanVector>]) -> Self {
        if inputs.iter().any(|v| v.is_capturing()) {
            ResultBuilder::Capturing(Vec::new())
        } else {
            ResultBuilder::Plain(Vec::new())
        }
    }

    fn push(&mut self, span: Span, contributors: &[(&Rc<SpanVector>, usize)]) {
        match self {
            ResultBuilder::Plain(spans) => spans.push(span),
            ResultBuilder::Capturing(items) => {
                let origins = contributors
                    .iter()
                    .filter(|(v, _)| v.is_capturing())
                    .map(|(v, pos)| Origin::new(Rc::clone(v), *pos))
                    .collect();
                items.push((span, origins));
            }
        }
    }

    fn finish(self) -> Rc<SpanVector> {
        match self {
            ResultBuilder::Plain(mut spans) => {
                spans.sort_unstable();
                spans.dedup();
                Rc::new(SpanVector::Plain(spans))
            }
            ResultBuilder::Capturing(mut items) => {
                items.sort_by_key(|(span, _)| *span);
                let mut entries: Vec<Span> = Vec::with_capacity(items.len());
                let mut origins: Vec<Vec<Origin>> = Vec::with_capacity(items.len());
                // Duplicate spans collapse into one entry owning the union of
                // their origins.
                for (span, item_origins) in items {
                    if entries.last() == Some(&span) {
                        if let Some(merged) = origins.last_mut() {
                            merged.extend(item_origins);
                        }
                    } else {
                        entries.push(span);
                        origins.push(item_origins);
                    }
                }
                Rc::new(SpanVector::Constructive { entries, origins })
            }
        }
    }
}
