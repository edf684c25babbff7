//! Annotation layers and the sentence contract.
//!
//! The engine never performs linguistic analysis itself. It consumes the
//! output of external analyzers as typed annotation layers: per kind, a list
//! of `(id, value, span)` facts sorted by `(start, end)`. The [`Sentence`]
//! trait is that read-only contract; [`AnnotatedSentence`] is a concrete
//! implementation for callers (and tests) that assemble layers by hand.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{MatchError, MatchResult};
use crate::span::Span;

/// Boundary annotation id marking the start of a sentence, at span `(0,0)`.
pub const SENTENCE_START: &str = "START";
/// Boundary annotation id marking the end of a sentence, at span `(n,n)`.
pub const SENTENCE_END: &str = "END";

/// The kind of information an annotation layer carries.
///
/// The common layers are first-class variants; analyzers that produce their
/// own layers use [`AnnotationKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Token surface text
    Token,
    /// Stemmed token text
    Stem,
    /// Part-of-speech tag
    Pos,
    /// Chunk (shallow phrase) label
    Chunk,
    /// Ontology concept membership
    Concept,
    /// Ancestor concepts of a matched concept
    AncestorConcept,
    /// Sentence boundary pseudo-annotations (`START` / `END`)
    Boundary,
    /// A caller-defined annotation layer
    Custom(String),
}

impl AnnotationKind {
    /// The display name of this kind.
    pub fn name(&self) -> &str {
        match self {
            AnnotationKind::Token => "TOKEN",
            AnnotationKind::Stem => "STEM",
            AnnotationKind::Pos => "POS",
            AnnotationKind::Chunk => "CHUNK",
            AnnotationKind::Concept => "CONCEPT",
            AnnotationKind::AncestorConcept => "ANCESTOR",
            AnnotationKind::Boundary => "BOUNDARY",
            AnnotationKind::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single pre-computed fact about a sentence.
///
/// `id` is the key expressions match against; `value` is the display payload
/// (for `Token` annotations it is the surface text, which is what regex
/// expressions test).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Match key
    pub id: String,
    /// Display payload
    pub value: String,
    /// Token span the fact covers
    pub span: Span,
}

impl Annotation {
    /// Create an annotation with distinct id and value.
    pub fn new(id: impl Into<String>, value: impl Into<String>, span: Span) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            span,
        }
    }

    /// Create an annotation whose value is its id.
    pub fn keyed(id: impl Into<String>, span: Span) -> Self {
        let id = id.into();
        Self {
            value: id.clone(),
            id,
            span,
        }
    }
}

/// The read-only sentence contract consumed by the matcher.
///
/// Implementations must return each layer sorted by `(start, end)`. A kind
/// the sentence has no analyzer for is an error
/// ([`MatchError::UnsupportedAnnotation`]); a supported layer that happens to
/// be empty is `Ok(&[])`.
pub trait Sentence {
    /// The number of tokens in the sentence.
    fn token_count(&self) -> usize;

    /// The annotations of the requested kind, sorted by `(start, end)`.
    fn annotations(&self, kind: &AnnotationKind) -> MatchResult<&[Annotation]>;
}

/// A sentence assembled from explicit annotation layers.
///
/// `from_tokens` seeds the `Token` layer and the boundary pseudo-annotations;
/// further layers are attached with [`AnnotatedSentence::annotate`] or
/// [`AnnotatedSentence::with_layer`]. Layers are kept sorted so the matcher's
/// two-pointer scans stay sound.
///
/// # Example
///
/// ```
/// use sentence_patterns::{AnnotatedSentence, AnnotationKind, Sentence};
///
/// let sentence = AnnotatedSentence::from_tokens(&["the", "dog"])
///     .annotate(AnnotationKind::Pos, "DT", 0, 1)
///     .annotate(AnnotationKind::Pos, "NN", 1, 2);
/// assert_eq!(sentence.token_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct AnnotatedSentence {
    token_count: usize,
    layers: HashMap<AnnotationKind, Vec<Annotation>>,
}

impl AnnotatedSentence {
    /// Create a sentence from its token texts.
    ///
    /// Each token becomes a one-token `Token` annotation, and boundary
    /// annotations are placed at `(0,0)` and `(n,n)`.
    pub fn from_tokens(tokens: &[&str]) -> Self {
        let token_layer = tokens
            .iter()
            .enumerate()
            .map(|(i, text)| Annotation::keyed(*text, Span::new(i, i + 1)))
            .collect();
        let boundary_layer = vec![
            Annotation::keyed(SENTENCE_START, Span::new(0, 0)),
            Annotation::keyed(SENTENCE_END, Span::new(tokens.len(), tokens.len())),
        ];

        let mut layers = HashMap::new();
        layers.insert(AnnotationKind::Token, token_layer);
        layers.insert(AnnotationKind::Boundary, boundary_layer);
        Self {
            token_count: tokens.len(),
            layers,
        }
    }

    /// Attach a whole annotation layer, replacing any previous layer of the
    /// same kind. The layer is sorted into canonical `(start, end)` order.
    pub fn with_layer(mut self, kind: AnnotationKind, mut annotations: Vec<Annotation>) -> Self {
        annotations.sort_by_key(|a| a.span);
        self.layers.insert(kind, annotations);
        self
    }

    /// Add a single annotation to a layer, creating the layer if needed.
    pub fn annotate(
        mut self,
        kind: AnnotationKind,
        id: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        let layer = self.layers.entry(kind).or_default();
        layer.push(Annotation::keyed(id, Span::new(start, end)));
        layer.sort_by_key(|a| a.span);
        self
    }

    /// Mark a kind as supported even though no annotations of it exist.
    pub fn with_empty_layer(mut self, kind: AnnotationKind) -> Self {
        self.layers.entry(kind).or_default();
        self
    }
}

impl Sentence for AnnotatedSentence {
    fn token_count(&self) -> usize {
        self.token_count
    }

    fn annotations(&self, kind: &AnnotationKind) -> MatchResult<&[Annotation]> {
        self.layers
            .get(kind)
            .map(Vec::as_slice)
            .ok_or_else(|| MatchError::UnsupportedAnnotation(kind.clone()))
    }
}
