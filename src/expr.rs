//! The pattern expression tree.
//!
//! Expressions are produced by an external pattern parser and consumed here
//! as an immutable AST. The node set is closed, so the tree is a plain enum
//! and the evaluator matches on it exhaustively; there is no open visitor
//! hierarchy.
//!
//! `Display` renders the grammar's surface sugar: `"token"`, `''stem''`,
//! `{POS}`, `[CHUNK]`, `<CONCEPT>`, `label=expr`, `expr[min:max]`, `expr?`,
//! `/regex/`, and `A WITH B`.

use crate::annotation::AnnotationKind;
use crate::errors::{MatchError, MatchResult};

/// A single annotation lookup: every annotation of `kind` when `id` is
/// absent, otherwise only annotations with that exact id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPattern {
    /// The annotation layer to look in
    pub kind: AnnotationKind,
    /// Exact id to match, or `None` for any annotation of the kind
    pub id: Option<String>,
}

impl AnnotationPattern {
    /// Match every annotation of the given kind.
    pub fn any(kind: AnnotationKind) -> Self {
        Self { kind, id: None }
    }

    /// Match annotations of the given kind with the given id.
    pub fn with_id(kind: AnnotationKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }
}

/// Operator of a compound expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    /// Exact-span set union
    Or,
    /// Exact-span set intersection
    Is,
    /// Exact-span set difference (exactly two children)
    Isnt,
    /// Adjacency concatenation
    Sequence,
}

impl CompoundOp {
    fn name(self) -> &'static str {
        match self {
            CompoundOp::Or => "OR",
            CompoundOp::Is => "IS",
            CompoundOp::Isnt => "ISNT",
            CompoundOp::Sequence => "SEQUENCE",
        }
    }
}

/// A pattern expression.
///
/// The tree is acyclic and never mutated by the engine; one tree can be
/// shared across many sentences via a matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Leaf annotation lookup
    Annotation(AnnotationPattern),
    /// OR / IS / ISNT / SEQUENCE over ordered children
    Compound {
        op: CompoundOp,
        children: Vec<Expression>,
    },
    /// Bounded repetition of the child, `min ≤ max`
    Repeat {
        expr: Box<Expression>,
        min: usize,
        max: usize,
    },
    /// Containment: annotations of `annotation` that contain a match of
    /// `contained`
    With {
        annotation: AnnotationPattern,
        contained: Box<Expression>,
    },
    /// Named capture of the child's matches
    Capture {
        label: String,
        expr: Box<Expression>,
    },
    /// Whole-token text regex, a leaf in spirit
    Regex { pattern: String },
}

impl Expression {
    /// Match a token by surface text.
    pub fn token(text: impl Into<String>) -> Self {
        Expression::Annotation(AnnotationPattern::with_id(AnnotationKind::Token, text))
    }

    /// Match a token by stem.
    pub fn stem(stem: impl Into<String>) -> Self {
        Expression::Annotation(AnnotationPattern::with_id(AnnotationKind::Stem, stem))
    }

    /// Match a part-of-speech tag.
    pub fn pos(tag: impl Into<String>) -> Self {
        Expression::Annotation(AnnotationPattern::with_id(AnnotationKind::Pos, tag))
    }

    /// Match a chunk label.
    pub fn chunk(label: impl Into<String>) -> Self {
        Expression::Annotation(AnnotationPattern::with_id(AnnotationKind::Chunk, label))
    }

    /// Match a concept id.
    pub fn concept(id: impl Into<String>) -> Self {
        Expression::Annotation(AnnotationPattern::with_id(AnnotationKind::Concept, id))
    }

    /// Match any annotation of the given kind.
    pub fn any_annotation(kind: AnnotationKind) -> Self {
        Expression::Annotation(AnnotationPattern::any(kind))
    }

    /// Match the zero-width start-of-sentence boundary.
    pub fn sentence_start() -> Self {
        Expression::Annotation(AnnotationPattern::with_id(
            AnnotationKind::Boundary,
            crate::annotation::SENTENCE_START,
        ))
    }

    /// Match the zero-width end-of-sentence boundary.
    pub fn sentence_end() -> Self {
        Expression::Annotation(AnnotationPattern::with_id(
            AnnotationKind::Boundary,
            crate::annotation::SENTENCE_END,
        ))
    }

    /// Concatenation of adjacent matches.
    pub fn sequence(children: Vec<Expression>) -> Self {
        Expression::Compound {
            op: CompoundOp::Sequence,
            children,
        }
    }

    /// Union of the children's matches.
    pub fn any_of(children: Vec<Expression>) -> Self {
        Expression::Compound {
            op: CompoundOp::Or,
            children,
        }
    }

    /// Intersection of the children's matches.
    pub fn all_of(children: Vec<Expression>) -> Self {
        Expression::Compound {
            op: CompoundOp::Is,
            children,
        }
    }

    /// Matches of `base` that are not matches of `excluded`.
    pub fn but_not(base: Expression, excluded: Expression) -> Self {
        Expression::Compound {
            op: CompoundOp::Isnt,
            children: vec![base, excluded],
        }
    }

    /// Between `min` and `max` adjacent repetitions of the child.
    pub fn repeat(expr: Expression, min: usize, max: usize) -> Self {
        Expression::Repeat {
            expr: Box::new(expr),
            min,
            max,
        }
    }

    /// Zero or one occurrence of the child.
    pub fn optional(expr: Expression) -> Self {
        Self::repeat(expr, 0, 1)
    }

    /// Annotations matching `annotation` that contain a match of `contained`.
    pub fn with(annotation: AnnotationPattern, contained: Expression) -> Self {
        Expression::With {
            annotation,
            contained: Box::new(contained),
        }
    }

    /// Capture the child's matches under a label.
    pub fn capture(label: impl Into<String>, expr: Expression) -> Self {
        Expression::Capture {
            label: label.into(),
            expr: Box::new(expr),
        }
    }

    /// Match tokens whose text satisfies a regex (whole-token match).
    pub fn regex(pattern: impl Into<String>) -> Self {
        Expression::Regex {
            pattern: pattern.into(),
        }
    }

    /// Check the structural invariants of this tree.
    ///
    /// Violations are reported as [`MatchError::MalformedExpression`] so a
    /// bad pattern fails when the matcher is built, not mid-evaluation.
    /// Regex syntax is checked separately, when the matcher compiles patterns.
    pub fn validate(&self) -> MatchResult<()> {
        match self {
            Expression::Annotation(_) | Expression::Regex { .. } => Ok(()),
            Expression::Compound { op, children } => {
                if *op == CompoundOp::Isnt && children.len() != 2 {
                    return Err(MatchError::MalformedExpression(format!(
                        "ISNT takes exactly 2 children, got {}",
                        children.len()
                    )));
                }
                if children.is_empty() {
                    return Err(MatchError::MalformedExpression(format!(
                        "{} requires at least one child",
                        op.name()
                    )));
                }
                children.iter().try_for_each(Expression::validate)
            }
            Expression::Repeat { expr, min, max } => {
                if min > max {
                    return Err(MatchError::MalformedExpression(format!(
                        "repeat bounds out of order: {min} > {max}"
                    )));
                }
                expr.validate()
            }
            Expression::With { contained, .. } => contained.validate(),
            Expression::Capture { expr, .. } => expr.validate(),
        }
    }

    /// Visit every node of the tree, children before parents.
    pub fn walk(&self, f: &mut impl FnMut(&Expression)) {
        match self {
            Expression::Annotation(_) | Expression::Regex { .. } => {}
            Expression::Compound { children, .. } => {
                for child in children {
                    child.walk(f);
                }
            }
            Expression::Repeat { expr, .. } | Expression::Capture { expr, .. } => expr.walk(f),
            Expression::With { contained, .. } => contained.walk(f),
        }
        f(self);
    }
}

impl std::fmt::Display for AnnotationPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            None => write!(f, "{}", self.kind),
            Some(id) => match self.kind {
                AnnotationKind::Token => write!(f, "\"{id}\""),
                AnnotationKind::Stem => write!(f, "''{id}''"),
                AnnotationKind::Pos => write!(f, "{{{id}}}"),
                AnnotationKind::Chunk => write!(f, "[{id}]"),
                AnnotationKind::Concept => write!(f, "<{id}>"),
                _ => write!(f, "{}:{id}", self.kind),
            },
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Annotation(pattern) => write!(f, "{pattern}"),
            Expression::Compound { op, children } => {
                let separator = match op {
                    CompoundOp::Sequence => " ".to_string(),
                    other => format!(" {} ", other.name()),
                };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(&separator)?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            Expression::Repeat { expr, min, max } => {
                if *min == 0 && *max == 1 {
                    write!(f, "{expr}?")
                } else if min == max {
                    write!(f, "{expr}[{min}]")
                } else {
                    write!(f, "{expr}[{min}:{max}]")
                }
            }
            Expression::With {
                annotation,
                contained,
            } => write!(f, "{annotation} WITH {contained}"),
            Expression::Capture { label, expr } => write!(f, "{label}={expr}"),
            Expression::Regex { pattern } => write!(f, "/{pattern}/"),
        }
    }
}
