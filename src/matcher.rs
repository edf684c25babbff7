//! The sentence matcher.
//!
//! A [`SentenceMatcher`] is built once from one or more accepting expressions
//! and reused across sentences. Construction validates the trees, compiles
//! regex leaves, and records which `(kind, id)` annotation targets the
//! expressions actually reference. Each `match_sentence` call then indexes
//! only those targets — annotation layers no expression mentions are never
//! read — and evaluates the trees bottom-up through the vector algebra. The
//! approach is the same as a span-query evaluator in a search engine, except
//! the queries are known up front, so the index is built per sentence and
//! restricted to what the queries need.
//!
//! The matcher holds no per-call state: the index and all intermediate
//! vectors are local to one call, so one matcher may serve concurrent calls
//! on different sentences.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use regex::Regex;

use crate::algebra;
use crate::annotation::{AnnotationKind, Sentence};
use crate::errors::{MatchError, MatchResult};
use crate::expr::{AnnotationPattern, CompoundOp, Expression};
use crate::matches::Matches;
use crate::span::Span;
use crate::vector::SpanVector;

/// An annotation lookup target recorded at construction. `None` is the
/// wildcard over the kind.
type Target = (AnnotationKind, Option<String>);

/// Matches pattern expressions against individual sentences.
pub struct SentenceMatcher {
    expressions: Vec<Expression>,
    targets: HashSet<Target>,
    regexes: HashMap<String, Regex>,
}

impl SentenceMatcher {
    /// Build a matcher for one or more accepting expressions.
    ///
    /// Structural violations (empty compounds, `ISNT` without exactly two
    /// children, inverted repeat bounds) and unparsable regex patterns are
    /// rejected here, before any sentence is touched.
    pub fn new(expressions: Vec<Expression>) -> MatchResult<Self> {
        let mut targets = HashSet::new();
        let mut regex_patterns = HashSet::new();

        for expression in &expressions {
            expression.validate()?;
            expression.walk(&mut |node| match node {
                Expression::Annotation(pattern) => {
                    targets.insert((pattern.kind.clone(), pattern.id.clone()));
                }
                Expression::With { annotation, .. } => {
                    targets.insert((annotation.kind.clone(), annotation.id.clone()));
                }
                Expression::Regex { pattern } => {
                    regex_patterns.insert(pattern.clone());
                }
                _ => {}
            });
        }

        let mut regexes = HashMap::new();
        for pattern in regex_patterns {
            // Anchored: the pattern must describe the whole token text.
            let compiled = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                MatchError::MalformedExpression(format!("invalid regex /{pattern}/: {e}"))
            })?;
            regexes.insert(pattern, compiled);
        }

        Ok(Self {
            expressions,
            targets,
            regexes,
        })
    }

    /// Convenience constructor for a single accepting expression.
    pub fn for_expression(expression: Expression) -> MatchResult<Self> {
        Self::new(vec![expression])
    }

    /// The accepting expressions, in the order supplied.
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    /// Match all accepting expressions against a sentence, OR-ing their
    /// results into one collection.
    pub fn match_sentence<S: Sentence + ?Sized>(&self, sentence: &S) -> MatchResult<Matches> {
        let index = self.index(sentence)?;
        let token_count = sentence.token_count();
        let vectors: Vec<Rc<SpanVector>> = self
            .expressions
            .iter()
            .map(|expression| self.evaluate(expression, &index, token_count))
            .collect();
        Ok(Matches::from_vector(&algebra::or(&vectors)))
    }

    /// Match the accepting expressions one at a time, reusing one sentence
    /// index, and return each expression's matches separately in input order.
    pub fn match_individually<S: Sentence + ?Sized>(
        &self,
        sentence: &S,
    ) -> MatchResult<Vec<Matches>> {
        let index = self.index(sentence)?;
        let token_count = sentence.token_count();
        Ok(self
            .expressions
            .iter()
            .map(|expression| {
                Matches::from_vector(&self.evaluate(expression, &index, token_count))
            })
            .collect())
    }

    // Build the per-call index: one vector per referenced (kind, id) target,
    // plus one per distinct regex pattern over the token layer.
    fn index<S: Sentence + ?Sized>(&self, sentence: &S) -> MatchResult<SentenceIndex> {
        let mut buckets: HashMap<Target, Vec<Span>> = HashMap::new();
        let kinds: HashSet<&AnnotationKind> = self.targets.iter().map(|(kind, _)| kind).collect();

        for kind in kinds {
            let annotations = sentence.annotations(kind)?;
            let wildcard = self.targets.contains(&(kind.clone(), None));
            for annotation in annotations {
                let keyed = (kind.clone(), Some(annotation.id.clone()));
                if self.targets.contains(&keyed) {
                    buckets.entry(keyed).or_default().push(annotation.span);
                }
                if wildcard {
                    buckets
                        .entry((kind.clone(), None))
                        .or_default()
                        .push(annotation.span);
                }
            }
        }

        let mut regex_vectors = HashMap::new();
        if !self.regexes.is_empty() {
            let tokens = sentence.annotations(&AnnotationKind::Token)?;
            for (pattern, regex) in &self.regexes {
                let spans = tokens
                    .iter()
                    .filter(|token| regex.is_match(&token.value))
                    .map(|token| token.span)
                    .collect();
                regex_vectors.insert(pattern.clone(), Rc::new(SpanVector::from_spans(spans)));
            }
        }

        Ok(SentenceIndex {
            vectors: buckets
                .into_iter()
                .map(|(target, spans)| (target, Rc::new(SpanVector::from_spans(spans))))
                .collect(),
            regex_vectors,
            empty: Rc::new(SpanVector::empty()),
        })
    }

    // Bottom-up evaluation: children are resolved first, then the node's
    // operator is applied through the algebra. Infallible once the index is
    // built.
    fn evaluate(
        &self,
        expression: &Expression,
        index: &SentenceIndex,
        token_count: usize,
    ) -> Rc<SpanVector> {
        match expression {
            Expression::Annotation(pattern) => index.lookup(pattern),
            Expression::Regex { pattern } => index.lookup_regex(pattern),
            Expression::Compound { op, children } => {
                let vectors: Vec<Rc<SpanVector>> = children
                    .iter()
                    .map(|child| self.evaluate(child, index, token_count))
                    .collect();
                match op {
                    CompoundOp::Or => algebra::or(&vectors),
                    CompoundOp::Is => algebra::is(&vectors),
                    // arity checked at construction
                    CompoundOp::Isnt => algebra::isnt(&vectors[0], &vectors[1]),
                    CompoundOp::Sequence => algebra::sequence(&vectors),
                }
            }
            Expression::Repeat { expr, min, max } => {
                let inner = self.evaluate(expr, index, token_count);
                algebra::repeat(&inner, *min, *max, token_count)
            }
            Expression::With {
                annotation,
                contained,
            } => {
                let outer = index.lookup(annotation);
                let inner = self.evaluate(contained, index, token_count);
                algebra::with(&outer, &inner)
            }
            Expression::Capture { label, expr } => {
                let inner = self.evaluate(expr, index, token_count);
                algebra::capture(&inner, label.clone())
            }
        }
    }
}

// The per-call annotation index. Lookups for targets that produced no
// annotations resolve to the shared empty vector.
struct SentenceIndex {
    vectors: HashMap<Target, Rc<SpanVector>>,
    regex_vectors: HashMap<String, Rc<SpanVector>>,
    empty: Rc<SpanVector>,
}

impl SentenceIndex {
    fn lookup(&self, pattern: &AnnotationPattern) -> Rc<SpanVector> {
        self.vectors
            .get(&(pattern.kind.clone(), pattern.id.clone()))
            .map_or_else(|| Rc::clone(&self.empty), Rc::clone)
    }

    fn lookup_regex(&self, pattern: &str) -> Rc<SpanVector> {
        self.regex_vectors
            .get(pattern)
            .map_or_else(|| Rc::clone(&self.empty), Rc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotatedSentence;

    fn matcher(expression: Expression) -> SentenceMatcher {
        SentenceMatcher::for_expression(expression).unwrap()
    }

    fn check(matcher: &SentenceMatcher, sentence: &AnnotatedSentence, expected: &[(usize, usize)]) {
        let matches = matcher.match_sentence(sentence).unwrap();
        let spans: Vec<(usize, usize)> = matches.iter().map(|m| (m.start(), m.end())).collect();
        assert_eq!(spans, expected);
    }

    #[test]
    fn or_matches_either_token() {
        let m = matcher(Expression::any_of(vec![
            Expression::token("a"),
            Expression::token("b"),
        ]));
        check(&m, &AnnotatedSentence::from_tokens(&["a"]), &[(0, 1)]);
        check(&m, &AnnotatedSentence::from_tokens(&["b"]), &[(0, 1)]);
        check(&m, &AnnotatedSentence::from_tokens(&["a", "b"]), &[(0, 1), (1, 2)]);
        check(&m, &AnnotatedSentence::from_tokens(&["b", "a"]), &[(0, 1), (1, 2)]);
        check(&m, &AnnotatedSentence::from_tokens(&["a", "x", "b"]), &[(0, 1), (2, 3)]);
    }

    #[test]
    fn isnt_excludes_exact_spans() {
        let m = matcher(Expression::but_not(
            Expression::pos("DT"),
            Expression::token("a"),
        ));
        let the = AnnotatedSentence::from_tokens(&["the"]).annotate(AnnotationKind::Pos, "DT", 0, 1);
        check(&m, &the, &[(0, 1)]);
        let a = AnnotatedSentence::from_tokens(&["a"]).annotate(AnnotationKind::Pos, "DT", 0, 1);
        check(&m, &a, &[]);
    }

    #[test]
    fn is_requires_all_layers_to_agree() {
        let m = matcher(Expression::all_of(vec![
            Expression::stem("rat"),
            Expression::pos("VB"),
        ]));
        // "A rat likes to rat people out": only the verb use matches both.
        let sentence =
            AnnotatedSentence::from_tokens(&["A", "rat", "likes", "to", "rat", "people", "out"])
                .annotate(AnnotationKind::Stem, "rat", 1, 2)
                .annotate(AnnotationKind::Stem, "rat", 4, 5)
                .annotate(AnnotationKind::Pos, "VB", 4, 5);
        check(&m, &sentence, &[(4, 5)]);
    }

    #[test]
    fn sequence_matches_adjacent_tokens() {
        let m = matcher(Expression::sequence(vec![
            Expression::token("a"),
            Expression::token("b"),
        ]));
        check(&m, &AnnotatedSentence::from_tokens(&["x", "a", "b", "y"]), &[(1, 3)]);
        check(&m, &AnnotatedSentence::from_tokens(&["a", "b", "a", "b"]), &[(0, 2), (2, 4)]);
    }

    #[test]
    fn repeat_exact_count() {
        let m = matcher(Expression::repeat(Expression::token("a"), 2, 2));
        check(&m, &AnnotatedSentence::from_tokens(&["a"]), &[]);
        check(&m, &AnnotatedSentence::from_tokens(&["a", "b", "a"]), &[]);
        check(&m, &AnnotatedSentence::from_tokens(&["a", "a"]), &[(0, 2)]);
        check(&m, &AnnotatedSentence::from_tokens(&["x", "a", "a"]), &[(1, 3)]);
    }

    #[test]
    fn repeat_range_reports_every_length() {
        let m = matcher(Expression::repeat(Expression::token("a"), 2, 3));
        check(&m, &AnnotatedSentence::from_tokens(&["a"]), &[]);
        check(&m, &AnnotatedSentence::from_tokens(&["a", "a"]), &[(0, 2)]);
        check(
            &m,
            &AnnotatedSentence::from_tokens(&["a", "a", "a"]),
            &[(0, 2), (0, 3), (1, 3)],
        );
        check(
            &m,
            &AnnotatedSentence::from_tokens(&["a", "a", "a", "a"]),
            &[(0, 2), (0, 3), (1, 3), (1, 4), (2, 4)],
        );
    }

    #[test]
    fn zero_minimum_repeat_makes_prefix_optional() {
        let m = matcher(Expression::sequence(vec![
            Expression::repeat(Expression::token("a"), 0, 2),
            Expression::token("b"),
        ]));
        check(&m, &AnnotatedSentence::from_tokens(&["b"]), &[(0, 1)]);
        check(&m, &AnnotatedSentence::from_tokens(&["a", "b"]), &[(0, 2), (1, 2)]);
        check(
            &m,
            &AnnotatedSentence::from_tokens(&["a", "a", "b"]),
            &[(0, 3), (1, 3), (2, 3)],
        );
        check(
            &m,
            &AnnotatedSentence::from_tokens(&["a", "a", "a", "b"]),
            &[(1, 4), (2, 4), (3, 4)],
        );
    }

    #[test]
    fn optional_element_inside_sequence() {
        let m = matcher(Expression::sequence(vec![
            Expression::token("x"),
            Expression::optional(Expression::token("a")),
            Expression::token("y"),
        ]));
        check(&m, &AnnotatedSentence::from_tokens(&["x", "y"]), &[(0, 2)]);
        check(&m, &AnnotatedSentence::from_tokens(&["x", "a", "y"]), &[(0, 3)]);
        check(&m, &AnnotatedSentence::from_tokens(&["x", "a", "a", "y"]), &[]);
    }

    fn really_big_dog() -> AnnotatedSentence {
        AnnotatedSentence::from_tokens(&["I", "really", "love", "my", "really", "big", "dog"])
            .annotate(AnnotationKind::Chunk, "NP", 0, 1)
            .annotate(AnnotationKind::Chunk, "ADVP", 1, 2)
            .annotate(AnnotationKind::Chunk, "VP", 2, 3)
            .annotate(AnnotationKind::Chunk, "NP", 3, 7)
    }

    #[test]
    fn with_selects_containers_of_the_contained_match() {
        let any_chunk = AnnotationPattern::any(AnnotationKind::Chunk);
        let m = matcher(Expression::with(
            any_chunk.clone(),
            Expression::token("really"),
        ));
        check(&m, &really_big_dog(), &[(1, 2), (3, 7)]);

        let np = AnnotationPattern::with_id(AnnotationKind::Chunk, "NP");
        let m = matcher(Expression::with(np.clone(), Expression::token("really")));
        check(&m, &really_big_dog(), &[(3, 7)]);

        let m = matcher(Expression::with(
            np,
            Expression::sequence(vec![Expression::token("really"), Expression::token("big")]),
        ));
        check(&m, &really_big_dog(), &[(3, 7)]);
    }

    #[test]
    fn boundary_markers_anchor_matches() {
        let sentence = AnnotatedSentence::from_tokens(&["a", "a", "b", "b"]);
        let start_then = |token: &str| {
            matcher(Expression::sequence(vec![
                Expression::sentence_start(),
                Expression::token(token),
            ]))
        };
        check(&start_then("b"), &sentence, &[]);
        check(&start_then("a"), &sentence, &[(0, 1)]);

        let then_end = |token: &str| {
            matcher(Expression::sequence(vec![
                Expression::token(token),
                Expression::sentence_end(),
            ]))
        };
        check(&then_end("b"), &sentence, &[(3, 4)]);
        check(&then_end("a"), &sentence, &[]);
    }

    #[test]
    fn capture_binds_each_match_to_its_own_span() {
        let m = matcher(Expression::capture("capture", Expression::token("a")));
        let matches = m
            .match_sentence(&AnnotatedSentence::from_tokens(&["a", "b", "a"]))
            .unwrap();
        assert_eq!(matches.len(), 2);
        let first = matches[0].captures().unwrap();
        assert_eq!(first.get("capture"), Some(Span::new(0, 1)));
        let second = matches[1].captures().unwrap();
        assert_eq!(second.get("capture"), Some(Span::new(2, 3)));
    }

    #[test]
    fn capture_survives_isnt_and_skips_uncaptured_branches() {
        // (capture=a OR b) ISNT c
        let expr = Expression::but_not(
            Expression::any_of(vec![
                Expression::capture("capture", Expression::token("a")),
                Expression::token("b"),
            ]),
            Expression::token("c"),
        );
        let m = matcher(expr);

        let matches = m
            .match_sentence(&AnnotatedSentence::from_tokens(&["x", "a", "y"]))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].captures().unwrap().get("capture"),
            Some(Span::new(1, 2))
        );

        let matches = m
            .match_sentence(&AnnotatedSentence::from_tokens(&["x", "a", "y", "b"]))
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(
            matches[0].captures().unwrap().get("capture"),
            Some(Span::new(1, 2))
        );
        assert!(matches[1].captures().is_none());
    }

    #[test]
    fn capture_outside_isnt_labels_every_survivor() {
        // capture=(a OR b) ISNT c
        let expr = Expression::but_not(
            Expression::capture(
                "capture",
                Expression::any_of(vec![Expression::token("a"), Expression::token("b")]),
            ),
            Expression::token("c"),
        );
        let m = matcher(expr);
        let matches = m
            .match_sentence(&AnnotatedSentence::from_tokens(&["x", "a", "y", "b"]))
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(
            matches[0].captures().unwrap().get("capture"),
            Some(Span::new(1, 2))
        );
        assert_eq!(
            matches[1].captures().unwrap().get("capture"),
            Some(Span::new(3, 4))
        );
    }

    #[test]
    fn capture_in_sequence_marks_only_contributing_matches() {
        // (capture=a OR b) c
        let expr = Expression::sequence(vec![
            Expression::any_of(vec![
                Expression::capture("capture", Expression::token("a")),
                Expression::token("b"),
            ]),
            Expression::token("c"),
        ]);
        let m = matcher(expr);
        let matches = m
            .match_sentence(&AnnotatedSentence::from_tokens(&["x", "a", "c", "b", "c", "y"]))
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(
            matches[0].captures().unwrap().get("capture"),
            Some(Span::new(1, 2))
        );
        assert!(matches[1].captures().is_none());
    }

    #[test]
    fn nested_captures_inside_with_are_all_reported() {
        // a=CHUNK WITH (b="really", c="my")
        let expr = Expression::capture(
            "a",
            Expression::with(
                AnnotationPattern::any(AnnotationKind::Chunk),
                Expression::sequence(vec![
                    Expression::capture("c", Expression::token("my")),
                    Expression::capture("b", Expression::token("really")),
                ]),
            ),
        );
        let m = matcher(expr);
        let matches = m.match_sentence(&really_big_dog()).unwrap();
        assert_eq!(matches.len(), 1);
        let groups = matches[0].captures().unwrap();
        assert_eq!(groups.get("a"), Some(Span::new(3, 7)));
        assert_eq!(groups.get("c"), Some(Span::new(3, 4)));
        assert_eq!(groups.get("b"), Some(Span::new(4, 5)));
    }

    #[test]
    fn regex_matches_whole_token_text() {
        let m = matcher(Expression::regex("do+g"));
        check(
            &m,
            &AnnotatedSentence::from_tokens(&["dog", "doooog", "dogs", "cat"]),
            &[(0, 1), (1, 2)],
        );
    }

    #[test]
    fn regex_in_sequence_composes_with_other_leaves() {
        let m = matcher(Expression::sequence(vec![
            Expression::token("my"),
            Expression::regex("[a-z]+og"),
        ]));
        check(&m, &AnnotatedSentence::from_tokens(&["my", "dog"]), &[(0, 2)]);
        check(&m, &AnnotatedSentence::from_tokens(&["my", "cat"]), &[]);
    }

    #[test]
    fn invalid_regex_fails_at_construction() {
        let result = SentenceMatcher::for_expression(Expression::regex("[unclosed"));
        assert!(matches!(result, Err(MatchError::MalformedExpression(_))));
    }

    #[test]
    fn malformed_tree_fails_at_construction() {
        let result = SentenceMatcher::for_expression(Expression::repeat(
            Expression::token("a"),
            3,
            1,
        ));
        assert!(matches!(result, Err(MatchError::MalformedExpression(_))));
    }

    #[test]
    fn referencing_a_missing_layer_is_an_error_not_zero_matches() {
        let m = matcher(Expression::pos("NN"));
        let bare = AnnotatedSentence::from_tokens(&["dog"]);
        assert!(matches!(
            m.match_sentence(&bare),
            Err(MatchError::UnsupportedAnnotation(AnnotationKind::Pos))
        ));
    }

    #[test]
    fn unreferenced_layers_are_never_read() {
        // The sentence lacks a POS layer, but the expression never asks for
        // one, so matching succeeds.
        let m = matcher(Expression::token("dog"));
        check(&m, &AnnotatedSentence::from_tokens(&["dog"]), &[(0, 1)]);
    }

    #[test]
    fn multiple_expressions_or_together() {
        let m = SentenceMatcher::new(vec![Expression::token("a"), Expression::token("b")]).unwrap();
        check(&m, &AnnotatedSentence::from_tokens(&["a", "x", "b"]), &[(0, 1), (2, 3)]);
    }

    #[test]
    fn match_individually_keeps_expression_order() {
        let m = SentenceMatcher::new(vec![Expression::token("b"), Expression::token("a")]).unwrap();
        let results = m
            .match_individually(&AnnotatedSentence::from_tokens(&["a", "b"]))
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].iter().map(|m| (m.start(), m.end())).collect::<Vec<_>>(),
            vec![(1, 2)]
        );
        assert_eq!(
            results[1].iter().map(|m| (m.start(), m.end())).collect::<Vec<_>>(),
            vec![(0, 1)]
        );
    }

    #[test]
    fn wildcard_annotation_matches_any_id_of_the_kind() {
        let m = matcher(Expression::any_annotation(AnnotationKind::Chunk));
        check(&m, &really_big_dog(), &[(0, 1), (1, 2), (2, 3), (3, 7)]);
    }

    #[test]
    fn concept_annotations_match_like_any_other_layer() {
        let m = matcher(Expression::concept("dog"));
        let sentence = AnnotatedSentence::from_tokens(&["my", "poodle", "is", "great"])
            .annotate(AnnotationKind::Concept, "dog", 1, 2)
            .annotate(AnnotationKind::Concept, "animal", 1, 2);
        check(&m, &sentence, &[(1, 2)]);
    }
}
