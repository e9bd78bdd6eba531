//! Analysis engine abstraction.
//!
//! The language server never lexes, parses or resolves scopes itself. It
//! replays editor lifecycle events into an [`AnalysisEngine`] and asks it
//! questions keyed by file path and absolute offset. Any backend that
//! implements the trait can be plugged into the server:
//! - [`outline::OutlineEngine`], the built-in declaration indexer
//! - scripted engines in tests

pub mod outline;
pub mod types;

use std::path::Path;

pub use types::{
    AnalysisError, AnalysisHandle, Annotation, CandidateKind, CodeLocation, CodeSpan,
    CompletionCandidate, Declaration, DeclarationKind, DocComment, ParamAnnotation, ParamPassing,
    SeeAlsoAnnotation,
};

/// Common interface for all analysis backends.
///
/// Lifecycle methods always receive the complete file text; engines are free
/// to diff internally but the server never sends incremental edits.
#[async_trait::async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Registers `file` and analyses `text`. Replaces any previous state.
    async fn register(&self, file: &Path, text: &str);

    /// Re-analyses a registered file after an edit.
    async fn update(&self, file: &Path, text: &str);

    /// Drops all state kept for `file`. Unknown files are ignored.
    async fn deregister(&self, file: &Path);

    /// Snapshot of the analysis state, or `None` when `file` is not registered.
    async fn handle(&self, file: &Path) -> Option<AnalysisHandle>;

    /// Candidates in scope at `location`, in the engine's preferred order.
    async fn completions(&self, location: &CodeLocation) -> Vec<CompletionCandidate>;

    /// Top-level declarations of `file`, children nested.
    async fn declarations(&self, file: &Path) -> Vec<Declaration>;

    /// Declaration bound to the identifier at `location`, if any.
    async fn definition(&self, location: &CodeLocation) -> Option<Declaration>;

    /// Re-prints a declaration in "definitions only" mode: its signature
    /// without the body.
    async fn print_definition(&self, declaration: &Declaration) -> String;

    /// Canonical re-print of the whole file, `None` when there is no AST.
    async fn reprint(&self, file: &Path) -> Option<String>;

    /// Human-readable name for logging.
    fn engine_name(&self) -> &'static str;
}
