use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Range};

use super::documentation;
use crate::engine::Declaration;

/// Hover for `declaration`, anchored at the cursor.
pub fn hover(declaration: &Declaration, signature: &str, cursor: Position) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: documentation::render(signature, declaration.doc.as_ref()),
        }),
        range: Some(Range::new(cursor, cursor)),
    }
}
