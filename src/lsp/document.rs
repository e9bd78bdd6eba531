use std::path::Path;

use ropey::Rope;
use tower_lsp::lsp_types::{Position, Url};

use crate::engine::CodeLocation;
use crate::lsp::position;

/// An open editor buffer.
///
/// The rope is built with LF-only line breaks, matching the terminators
/// counted by [`position::offset_at`].
#[derive(Debug, Clone)]
pub struct OpenDocument {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
}

impl OpenDocument {
    pub fn new(uri: Url, text: &str, version: i32) -> Self {
        Self {
            uri,
            text: Rope::from_str(text),
            version,
        }
    }

    /// Replaces the whole text.
    pub fn replace(&mut self, text: &str, version: i32) {
        self.text = Rope::from_str(text);
        self.version = version;
    }

    pub fn offset_at(&self, position: Position) -> usize {
        position::offset_at(&self.text, position)
    }

    /// Line and UTF-16 column of an absolute offset, clamped to the end of
    /// the text.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len_chars());
        let line = self.text.char_to_line(offset);
        let character = position::utf16_column(&self.text, offset);
        Position::new(line as u32, character as u32)
    }

    /// Position just past the last character.
    pub fn end_position(&self) -> Position {
        self.position_at(self.text.len_chars())
    }

    /// Engine location of the editor position `position` in `file`.
    pub fn location_at(&self, file: &Path, position: Position) -> CodeLocation {
        let offset = self.offset_at(position);
        let resolved = self.position_at(offset);
        CodeLocation::new(file, offset, resolved.line, resolved.character)
    }
}
