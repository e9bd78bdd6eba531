//! Renderers from engine answers to protocol objects.
//!
//! Each module is a set of pure functions over engine values and an
//! [`OpenDocument`](crate::lsp::document::OpenDocument); the backend does the
//! engine calls and hands the results in.

pub mod completion;
pub mod diagnostics;
pub mod documentation;
pub mod formatting;
pub mod goto_definition;
pub mod hover;
pub mod symbols;

use tower_lsp::lsp_types::{Position, Range};

use crate::engine::{CodeLocation, CodeSpan};

pub(crate) fn to_position(location: &CodeLocation) -> Position {
    Position::new(location.line, location.column)
}

pub(crate) fn to_range(span: &CodeSpan) -> Range {
    Range::new(to_position(&span.start), to_position(&span.end))
}
