//! Values exchanged with an analysis engine.
//!
//! Everything here is a read-only projection of engine state. The language
//! server never mutates these values in place; it asks the engine again after
//! every lifecycle notification.

use std::path::{Path, PathBuf};

/// A point in a source file, expressed both as an absolute character offset
/// and as a 0-based line/column pair. Columns count UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeLocation {
    pub file: PathBuf,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl CodeLocation {
    pub fn new(file: impl Into<PathBuf>, offset: usize, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            offset,
            line,
            column,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Half-open source range between two locations of the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeSpan {
    pub start: CodeLocation,
    pub end: CodeLocation,
}

impl CodeSpan {
    pub fn new(start: CodeLocation, end: CodeLocation) -> Self {
        Self { start, end }
    }

    /// Whether `offset` falls inside the span (end inclusive, so a cursor
    /// placed right after the last character still counts).
    pub fn contains(&self, offset: usize) -> bool {
        self.start.offset <= offset && offset <= self.end.offset
    }
}

/// An error found while lexing, parsing or linting a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisError {
    pub location: CodeLocation,
    pub message: String,
}

/// Snapshot of the engine's per-file analysis state.
///
/// `has_ast` is false when lexing failed outright; in that case `errors`
/// holds the lex failure and every query degrades to "no results".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisHandle {
    pub file: PathBuf,
    pub has_ast: bool,
    pub errors: Vec<AnalysisError>,
}

impl AnalysisHandle {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Function,
    Module,
    Variable,
}

impl DeclarationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclarationKind::Function => "function",
            DeclarationKind::Module => "module",
            DeclarationKind::Variable => "variable",
        }
    }
}

/// A named declaration with its full span, its identifier span and the
/// declarations nested inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub span: CodeSpan,
    pub name_span: CodeSpan,
    pub doc: Option<DocComment>,
    pub children: Vec<Declaration>,
}

impl Declaration {
    pub fn file(&self) -> &Path {
        self.name_span.start.file()
    }
}

/// Documentation comment attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    /// Free text preceding or between the annotations.
    pub body: String,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPassing {
    Positional,
    Named,
}

impl ParamPassing {
    pub fn label(self) -> &'static str {
        match self {
            ParamPassing::Positional => "positional",
            ParamPassing::Named => "named",
        }
    }
}

/// `@param` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamAnnotation {
    /// Name of the documented parameter.
    pub link: String,
    pub passing: Option<ParamPassing>,
    pub type_tags: Vec<String>,
    pub description: String,
}

/// `@see` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeeAlsoAnnotation {
    pub link: String,
}

/// Structured fragment of a doc comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Param(ParamAnnotation),
    SeeAlso(SeeAlsoAnnotation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Function,
    Module,
    Variable,
    Keyword,
    Directory,
    File,
}

impl From<DeclarationKind> for CandidateKind {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Function => CandidateKind::Function,
            DeclarationKind::Module => CandidateKind::Module,
            DeclarationKind::Variable => CandidateKind::Variable,
        }
    }
}

/// One completion suggestion as produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    pub kind: CandidateKind,
    /// Present for candidates backed by a declaration.
    pub declaration: Option<Declaration>,
}

impl CompletionCandidate {
    pub fn keyword(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: CandidateKind::Keyword,
            declaration: None,
        }
    }

    pub fn declaration(declaration: Declaration) -> Self {
        Self {
            label: declaration.name.clone(),
            kind: declaration.kind.into(),
            declaration: Some(declaration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_contains_is_end_inclusive() {
        let span = CodeSpan::new(
            CodeLocation::new("/a.scad", 4, 0, 4),
            CodeLocation::new("/a.scad", 8, 0, 8),
        );
        assert!(!span.contains(3));
        assert!(span.contains(4));
        assert!(span.contains(8));
        assert!(!span.contains(9));
    }

    #[test]
    fn declaration_candidate_takes_name_and_kind() {
        let location = CodeLocation::new("/a.scad", 0, 0, 0);
        let span = CodeSpan::new(location.clone(), location);
        let declaration = Declaration {
            name: "hull_plate".to_string(),
            kind: DeclarationKind::Module,
            span: span.clone(),
            name_span: span,
            doc: None,
            children: Vec::new(),
        };
        let candidate = CompletionCandidate::declaration(declaration);
        assert_eq!(candidate.label, "hull_plate");
        assert_eq!(candidate.kind, CandidateKind::Module);
        assert!(candidate.declaration.is_some());
    }
}
