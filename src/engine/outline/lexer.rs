//! Tokenizer for the outline engine.
//!
//! Offsets are character indices into the source, never byte indices, so they
//! line up with the absolute offsets used everywhere else in the server.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    /// `<path>` literal following `include` or `use`, brackets included.
    Path,
    Punct,
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text(&self, source: &[char]) -> String {
        source[self.start..self.end].iter().collect()
    }

    pub fn is(&self, source: &[char], text: &str) -> bool {
        self.end - self.start == text.chars().count()
            && source[self.start..self.end].iter().copied().eq(text.chars())
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: usize,
    pub message: String,
}

impl LexError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

const OPERATORS: [&str; 6] = ["==", "!=", "<=", ">=", "&&", "||"];
const PUNCTUATION: &str = "(){}[];,=<>!+-*/%^?:.#&|~";

pub fn tokenize(source: &[char]) -> Result<Vec<Token>, LexError> {
    let mut tokens: Vec<Token> = Vec::new();
    // Index of the last non-comment token, used to recognise include paths.
    let mut last_significant: Option<usize> = None;
    let mut i = 0;

    while i < source.len() {
        let c = source[i];
        let next = source.get(i + 1).copied();
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let kind = if c == '/' && next == Some('/') {
            while i < source.len() && source[i] != '\n' {
                i += 1;
            }
            TokenKind::LineComment
        } else if c == '/' && next == Some('*') {
            i += 2;
            loop {
                if i + 1 >= source.len() {
                    return Err(LexError::new(start, "Unterminated block comment"));
                }
                if source[i] == '*' && source[i + 1] == '/' {
                    i += 2;
                    break;
                }
                i += 1;
            }
            TokenKind::BlockComment
        } else if c == '"' {
            i += 1;
            loop {
                match source.get(i) {
                    None => return Err(LexError::new(start, "Unterminated string literal")),
                    Some('\\') => i += 2,
                    Some('"') => {
                        i += 1;
                        break;
                    }
                    Some(_) => i += 1,
                }
            }
            TokenKind::Str
        } else if c == '<' && follows_include(source, &tokens, last_significant) {
            i += 1;
            loop {
                match source.get(i) {
                    None | Some('\n') => {
                        return Err(LexError::new(start, "Unterminated include path"));
                    }
                    Some('>') => {
                        i += 1;
                        break;
                    }
                    Some(_) => i += 1,
                }
            }
            TokenKind::Path
        } else if is_ident_start(c) {
            while i < source.len() && is_ident_continue(source[i]) {
                i += 1;
            }
            TokenKind::Ident
        } else if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            i = scan_number(source, i);
            TokenKind::Number
        } else if let Some(op) = OPERATORS
            .iter()
            .find(|op| op.chars().eq(source[i..].iter().copied().take(2)))
        {
            i += op.len();
            TokenKind::Punct
        } else if PUNCTUATION.contains(c) {
            i += 1;
            TokenKind::Punct
        } else {
            return Err(LexError::new(start, format!("Unexpected character '{}'", c)));
        };

        let token = Token { kind, start, end: i };
        if !token.is_comment() {
            last_significant = Some(tokens.len());
        }
        tokens.push(token);
    }

    Ok(tokens)
}

fn follows_include(source: &[char], tokens: &[Token], last_significant: Option<usize>) -> bool {
    last_significant
        .map(|index| tokens[index])
        .is_some_and(|t| t.kind == TokenKind::Ident && (t.is(source, "include") || t.is(source, "use")))
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn scan_number(source: &[char], mut i: usize) -> usize {
    while i < source.len() && (source[i].is_ascii_digit() || source[i] == '.') {
        i += 1;
    }
    if i < source.len() && (source[i] == 'e' || source[i] == 'E') {
        let mut j = i + 1;
        if j < source.len() && (source[j] == '+' || source[j] == '-') {
            j += 1;
        }
        if j < source.len() && source[j].is_ascii_digit() {
            i = j;
            while i < source.len() && source[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}
