//! Source printers: signature rendering and whole-file re-indentation.

use crate::engine::types::DeclarationKind;

use super::lexer::{Token, TokenKind};

const INDENT: &str = "    ";

/// Renders the "definitions only" form of a declaration from the tokens of
/// its span: the header of a module, the whole of a function or variable.
pub fn definition(source: &[char], tokens: &[Token], kind: DeclarationKind) -> String {
    let significant: Vec<&Token> = tokens.iter().filter(|t| !t.is_comment()).collect();

    let count = match kind {
        DeclarationKind::Module => header_len(source, &significant),
        DeclarationKind::Function | DeclarationKind::Variable => significant.len(),
    };

    join(source, &significant[..count])
}

/// Number of tokens up to and including the parameter list's closing `)`.
fn header_len(source: &[char], tokens: &[&Token]) -> usize {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        if token.is(source, "(") {
            depth += 1;
        } else if token.is(source, ")") {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return index + 1;
            }
        } else if depth == 0 && token.is(source, "{") {
            return index;
        }
    }
    tokens.len()
}

fn join(source: &[char], tokens: &[&Token]) -> String {
    let mut out = String::new();
    let mut previous: Option<String> = None;
    let mut before_previous: Option<String> = None;

    for token in tokens {
        let text = token.text(source);
        if let Some(prev) = previous.as_deref() {
            if needs_space(prev, &text, before_previous.as_deref(), token.kind) {
                out.push(' ');
            }
        }
        out.push_str(&text);
        before_previous = previous.replace(text);
    }

    out
}

fn needs_space(prev: &str, current: &str, before_prev: Option<&str>, kind: TokenKind) -> bool {
    if matches!(prev, "(" | "[" | "!" | "#") {
        return false;
    }
    if matches!(current, ")" | "]" | "," | ";" | ":") {
        return false;
    }
    if matches!(current, "(" | "[") && kind == TokenKind::Punct && is_operand_end(prev) {
        return false;
    }
    // Unary minus binds to its operand.
    if prev == "-" && before_prev.is_none_or(|b| !is_operand_end(b)) {
        return false;
    }
    !(prev == ":" && before_prev.is_some())
}

fn is_operand_end(text: &str) -> bool {
    matches!(text, ")" | "]")
        || text
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '"' || c == '.')
}

/// Re-indents a file by bracket depth.
///
/// Lines are trimmed and indented with four spaces per open bracket, runs of
/// blank lines collapse to one, lines that continue a block comment or a
/// string are left untouched, and the result ends with a single newline.
pub fn reindent(source: &[char], tokens: &[Token]) -> String {
    let line_starts = line_starts(source);
    let line_of = |offset: usize| line_starts.partition_point(|&start| start <= offset) - 1;

    let mut verbatim = vec![false; line_starts.len()];
    let mut opens = vec![0usize; line_starts.len()];
    let mut closes = vec![0usize; line_starts.len()];
    let mut leading_closers = vec![0usize; line_starts.len()];
    let mut seen_on_line = vec![false; line_starts.len()];

    for token in tokens {
        let line = line_of(token.start);
        if matches!(token.kind, TokenKind::BlockComment | TokenKind::Str) {
            let last = line_of(token.end.saturating_sub(1).max(token.start));
            for flag in &mut verbatim[line + 1..=last] {
                *flag = true;
            }
        }

        let bracket = (token.kind == TokenKind::Punct && token.end - token.start == 1)
            .then(|| source[token.start]);
        match bracket {
            Some('(' | '[' | '{') => opens[line] += 1,
            Some(')' | ']' | '}') => {
                closes[line] += 1;
                if !seen_on_line[line] {
                    leading_closers[line] += 1;
                    continue;
                }
            }
            _ => {}
        }
        seen_on_line[line] = true;
    }

    let mut out = String::new();
    let mut depth = 0usize;
    let mut pending_blank = false;

    for (line, &start) in line_starts.iter().enumerate() {
        let end = line_starts
            .get(line + 1)
            .map_or(source.len(), |&next| next - 1);
        let text: String = source[start..end].iter().collect();

        if verbatim[line] {
            out.push_str(&text);
            out.push('\n');
        } else {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                pending_blank = !out.is_empty();
            } else {
                if pending_blank {
                    out.push('\n');
                    pending_blank = false;
                }
                let indent = depth.saturating_sub(leading_closers[line]);
                out.push_str(&INDENT.repeat(indent));
                out.push_str(trimmed);
                out.push('\n');
            }
        }

        depth = (depth + opens[line]).saturating_sub(closes[line]);
    }

    out
}

fn line_starts(source: &[char]) -> Vec<usize> {
    std::iter::once(0)
        .chain(
            source
                .iter()
                .enumerate()
                .filter(|(_, c)| **c == '\n')
                .map(|(i, _)| i + 1),
        )
        .collect()
}
