//! Declaration scanner.
//!
//! Walks the token stream and records `module`, `function` and variable
//! declarations with their spans. Statements that declare nothing are
//! skipped, but the blocks they open are scanned so that nested declarations
//! are still found. Structural problems are collected as errors without
//! giving up on the rest of the file.

use crate::engine::types::{DeclarationKind, DocComment};

use super::doc_comment;
use super::lexer::{Token, TokenKind};

/// Declaration found by the scanner, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeclaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub start: usize,
    pub end: usize,
    pub name_start: usize,
    pub name_end: usize,
    pub doc: Option<DocComment>,
    pub children: Vec<RawDeclaration>,
}

/// `include <...>` or `use <...>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRef {
    /// Path between the angle brackets.
    pub path: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub declarations: Vec<RawDeclaration>,
    pub includes: Vec<IncludeRef>,
    /// `(offset, message)` pairs in source order.
    pub errors: Vec<(usize, String)>,
}

pub fn scan(source: &[char], tokens: &[Token]) -> Outline {
    let mut errors = check_brackets(source, tokens);

    let mut scanner = Scanner {
        source,
        tokens,
        significant: (0..tokens.len()).filter(|&i| !tokens[i].is_comment()).collect(),
        pos: 0,
        prev_end: 0,
        includes: Vec::new(),
        errors: Vec::new(),
    };
    let declarations = scanner.block(false);

    errors.append(&mut scanner.errors);
    errors.sort_by_key(|(offset, _)| *offset);

    Outline {
        declarations,
        includes: scanner.includes,
        errors,
    }
}

fn check_brackets(source: &[char], tokens: &[Token]) -> Vec<(usize, String)> {
    let mut errors = Vec::new();
    let mut open: Vec<(char, usize)> = Vec::new();

    for token in tokens.iter().filter(|t| t.kind == TokenKind::Punct) {
        let c = source[token.start];
        if token.end - token.start != 1 {
            continue;
        }
        match c {
            '(' | '[' | '{' => open.push((c, token.start)),
            ')' | ']' | '}' => match open.pop() {
                Some((opener, _)) if closer_of(opener) == c => {}
                Some((opener, _)) => errors.push((
                    token.start,
                    format!("Expected '{}' but found '{}'", closer_of(opener), c),
                )),
                None => errors.push((token.start, format!("Unexpected '{}'", c))),
            },
            _ => {}
        }
    }

    errors.extend(
        open.into_iter()
            .map(|(opener, offset)| (offset, format!("Unclosed '{}'", opener))),
    );
    errors
}

fn closer_of(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

struct Scanner<'a> {
    source: &'a [char],
    tokens: &'a [Token],
    /// Indices of non-comment tokens.
    significant: Vec<usize>,
    pos: usize,
    /// End offset of the last consumed token.
    prev_end: usize,
    includes: Vec<IncludeRef>,
    errors: Vec<(usize, String)>,
}

impl Scanner<'_> {
    fn peek_at(&self, ahead: usize) -> Option<Token> {
        self.significant
            .get(self.pos + ahead)
            .map(|&index| self.tokens[index])
    }

    fn peek(&self) -> Option<Token> {
        self.peek_at(0)
    }

    fn peek_is(&self, ahead: usize, text: &str) -> bool {
        self.peek_at(ahead).is_some_and(|t| t.is(self.source, text))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        self.prev_end = token.end;
        Some(token)
    }

    fn error(&mut self, offset: usize, message: impl Into<String>) {
        self.errors.push((offset, message.into()));
    }

    /// Offset where the next token starts, or the end of the source.
    fn here(&self) -> usize {
        self.peek().map_or(self.source.len(), |t| t.start)
    }

    /// Scans declarations until end of input, or until the closing brace of
    /// the current block when `nested` is set.
    fn block(&mut self, nested: bool) -> Vec<RawDeclaration> {
        let mut declarations = Vec::new();

        while let Some(token) = self.peek() {
            if token.is(self.source, "}") {
                self.advance();
                if nested {
                    break;
                }
                continue;
            }

            if token.kind == TokenKind::Ident {
                if token.is(self.source, "module") {
                    declarations.extend(self.module());
                    continue;
                }
                if token.is(self.source, "function") {
                    declarations.extend(self.function());
                    continue;
                }
                if (token.is(self.source, "include") || token.is(self.source, "use"))
                    && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Path)
                {
                    self.include();
                    continue;
                }
                if self.peek_is(1, "=") {
                    declarations.extend(self.variable());
                    continue;
                }
            }

            if token.is(self.source, ";") {
                self.advance();
                continue;
            }

            self.statement(&mut declarations);
        }

        declarations
    }

    fn include(&mut self) {
        self.advance();
        if let Some(path) = self.advance() {
            self.includes.push(IncludeRef {
                path: self.source[path.start + 1..path.end - 1].iter().collect(),
                start: path.start,
                end: path.end,
            });
        }
        if self.peek_is(0, ";") {
            self.advance();
        }
    }

    /// Skips a statement that declares nothing. Blocks opened by the
    /// statement are scanned and their declarations join `declarations`.
    fn statement(&mut self, declarations: &mut Vec<RawDeclaration>) {
        let mut depth = 0usize;
        let mut first = true;

        while let Some(token) = self.peek() {
            if token.is(self.source, "{") {
                self.advance();
                declarations.extend(self.block(true));
                return;
            }
            if !first && depth == 0 && token.is(self.source, "}") {
                return;
            }
            self.advance();
            first = false;

            if token.is(self.source, "(") || token.is(self.source, "[") {
                depth += 1;
            } else if token.is(self.source, ")") || token.is(self.source, "]") {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && token.is(self.source, ";") {
                return;
            }
        }
    }

    /// Consumes an expression up to and including its `;`.
    fn expression(&mut self) {
        let mut depth = 0usize;

        while let Some(token) = self.peek() {
            if depth == 0 {
                if token.is(self.source, ";") {
                    self.advance();
                    return;
                }
                if token.is(self.source, "}")
                    || token.is(self.source, "module")
                    || token.is(self.source, "function")
                {
                    break;
                }
            }
            if token.is(self.source, "(") || token.is(self.source, "[") || token.is(self.source, "{") {
                depth += 1;
            } else if token.is(self.source, ")") || token.is(self.source, "]") || token.is(self.source, "}") {
                depth = depth.saturating_sub(1);
            }
            self.advance();
        }

        let offset = self.prev_end;
        self.error(offset, "Expected ';'");
    }

    /// Consumes a parenthesised parameter list, the opening `(` included.
    fn parameters(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            if token.is(self.source, "(") {
                depth += 1;
            } else if token.is(self.source, ")") {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Consumes the declared name after `module` or `function`.
    fn declared_name(&mut self, keyword: &str) -> Option<Token> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.advance();
                Some(token)
            }
            _ => {
                let offset = self.here();
                self.error(offset, format!("Expected name after '{}'", keyword));
                None
            }
        }
    }

    fn module(&mut self) -> Option<RawDeclaration> {
        let doc = self.doc_before();
        let keyword = self.advance()?;
        let name = self.declared_name("module")?;

        if self.peek_is(0, "(") {
            self.parameters();
        } else {
            let offset = self.here();
            self.error(offset, "Expected '(' after module name");
        }

        let mut children = Vec::new();
        if self.peek_is(0, "{") {
            self.advance();
            children = self.block(true);
        } else if self.peek_is(0, ";") {
            self.advance();
        } else if self.peek().is_some() {
            self.statement(&mut children);
        }

        Some(self.declaration(DeclarationKind::Module, keyword, name, doc, children))
    }

    fn function(&mut self) -> Option<RawDeclaration> {
        let doc = self.doc_before();
        let keyword = self.advance()?;
        let name = self.declared_name("function")?;

        if self.peek_is(0, "(") {
            self.parameters();
        } else {
            let offset = self.here();
            self.error(offset, "Expected '(' after function name");
        }

        if self.peek_is(0, "=") {
            self.advance();
            self.expression();
        } else {
            let offset = self.here();
            self.error(offset, "Expected '=' in function definition");
        }

        Some(self.declaration(DeclarationKind::Function, keyword, name, doc, Vec::new()))
    }

    fn variable(&mut self) -> Option<RawDeclaration> {
        let doc = self.doc_before();
        let name = self.advance()?;
        self.advance();
        self.expression();
        Some(self.declaration(DeclarationKind::Variable, name, name, doc, Vec::new()))
    }

    fn declaration(
        &self,
        kind: DeclarationKind,
        first: Token,
        name: Token,
        doc: Option<DocComment>,
        children: Vec<RawDeclaration>,
    ) -> RawDeclaration {
        RawDeclaration {
            name: name.text(self.source),
            kind,
            start: first.start,
            end: self.prev_end.max(name.end),
            name_start: name.start,
            name_end: name.end,
            doc,
            children,
        }
    }

    /// Doc comment attached to the declaration starting at the next token.
    ///
    /// Collects the comments immediately preceding it, stopping at a blank
    /// line, at code, or at a comment that trails code on its own line.
    fn doc_before(&self) -> Option<DocComment> {
        let &first = self.significant.get(self.pos)?;
        let mut boundary = self.tokens[first].start;
        let mut comments = Vec::new();

        for token in self.tokens[..first].iter().rev() {
            if !token.is_comment() || self.newlines_between(token.end, boundary) > 1 {
                break;
            }
            if !self.starts_line(token.start) {
                break;
            }
            comments.push(*token);
            boundary = token.start;
            if token.kind == TokenKind::BlockComment {
                break;
            }
        }

        let lines: Vec<String> = comments
            .iter()
            .rev()
            .flat_map(|c| doc_comment::comment_lines(&c.text(self.source)))
            .collect();
        doc_comment::parse(lines.iter().map(String::as_str))
    }

    fn newlines_between(&self, from: usize, to: usize) -> usize {
        self.source[from..to].iter().filter(|&&c| c == '\n').count()
    }

    fn starts_line(&self, offset: usize) -> bool {
        self.source[..offset]
            .iter()
            .rev()
            .take_while(|&&c| c != '\n')
            .all(|c| c.is_whitespace())
    }
}
