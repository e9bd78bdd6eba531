use tower_lsp::lsp_types::{Position, Range, TextEdit};

use crate::lsp::document::OpenDocument;

/// Single edit replacing the whole buffer with `formatted`.
pub fn whole_document_edit(document: &OpenDocument, formatted: String) -> TextEdit {
    TextEdit {
        range: Range::new(Position::new(0, 0), document.end_position()),
        new_text: formatted,
    }
}
