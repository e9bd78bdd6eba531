//! Editor coordinates to engine offsets.

use ropey::Rope;
use tower_lsp::lsp_types::Position;

/// Converts a 0-based line/column pair into an absolute character offset.
///
/// Lines are delimited by `\n` only and every terminator counts as one
/// character. The column counts UTF-16 code units, the protocol's default
/// encoding. A position at or past the end of the text clamps to the last
/// character, or to 0 for an empty text.
pub fn offset_at(text: &Rope, position: Position) -> usize {
    let len = text.len_chars();
    let mut remaining = position.line;
    let mut line_start = 0usize;

    if remaining > 0 {
        for c in text.chars() {
            line_start += 1;
            if c == '\n' {
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }
        }
    }

    let target = text.char_to_utf16_cu(line_start) + position.character as usize;
    if target >= text.len_utf16_cu() {
        return len.saturating_sub(1);
    }
    // A column inside a surrogate pair lands on the character it splits.
    text.utf16_cu_to_char(target)
}

/// UTF-16 column of the absolute character offset `offset` within its line.
pub(crate) fn utf16_column(text: &Rope, offset: usize) -> usize {
    let line_start = text.line_to_char(text.char_to_line(offset));
    text.char_to_utf16_cu(offset) - text.char_to_utf16_cu(line_start)
}
