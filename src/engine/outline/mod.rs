//! Built-in analysis backend.
//!
//! The outline engine indexes declarations rather than building a full
//! syntax tree: it lexes each file, scans `module`/`function`/variable
//! declarations with their doc comments, and answers completion, definition
//! and formatting queries from that outline. Files pulled in with `include`
//! or `use` contribute their top-level declarations, one level deep.

pub mod doc_comment;
pub mod lexer;
pub mod printer;
pub mod scanner;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use ropey::Rope;
use tracing::{debug, trace, warn};

use super::AnalysisEngine;
use super::types::{
    AnalysisError, AnalysisHandle, CandidateKind, CodeLocation, CodeSpan, CompletionCandidate,
    Declaration, DeclarationKind,
};
use lexer::{Token, TokenKind};
use scanner::{IncludeRef, RawDeclaration};

const KEYWORDS: [&str; 16] = [
    "module", "function", "include", "use", "if", "else", "for", "let", "each", "assert",
    "echo", "intersection_for", "true", "false", "undef", "PI",
];

const SOURCE_EXTENSION: &str = "scad";

/// Analysis of one file.
#[derive(Debug)]
struct FileAnalysis {
    file: PathBuf,
    source: Vec<char>,
    /// `None` when lexing failed.
    tokens: Option<Vec<Token>>,
    declarations: Vec<Declaration>,
    includes: Vec<IncludeRef>,
    errors: Vec<AnalysisError>,
}

impl FileAnalysis {
    fn analyze(file: &Path, text: &str) -> Self {
        let source: Vec<char> = text.chars().collect();
        let rope = Rope::from_str(text);
        let locate = |offset: usize| location(file, &rope, offset);

        match lexer::tokenize(&source) {
            Ok(tokens) => {
                let outline = scanner::scan(&source, &tokens);
                let declarations = outline
                    .declarations
                    .into_iter()
                    .map(|raw| declaration(raw, &locate))
                    .collect();
                let errors = outline
                    .errors
                    .into_iter()
                    .map(|(offset, message)| AnalysisError {
                        location: locate(offset),
                        message,
                    })
                    .collect();
                Self {
                    file: file.to_path_buf(),
                    source,
                    tokens: Some(tokens),
                    declarations,
                    includes: outline.includes,
                    errors,
                }
            }
            Err(err) => {
                debug!("Lexing failed for {}: {}", file.display(), err.message);
                Self {
                    file: file.to_path_buf(),
                    source,
                    tokens: None,
                    declarations: Vec::new(),
                    includes: Vec::new(),
                    errors: vec![AnalysisError {
                        location: locate(err.offset),
                        message: err.message,
                    }],
                }
            }
        }
    }

    fn handle(&self) -> AnalysisHandle {
        AnalysisHandle {
            file: self.file.clone(),
            has_ast: self.tokens.is_some(),
            errors: self.errors.clone(),
        }
    }

    /// Significant token under, or ending right at, `offset`.
    fn token_at(&self, offset: usize) -> Option<(usize, Token)> {
        let tokens = self.tokens.as_ref()?;
        let significant = || tokens.iter().enumerate().filter(|(_, t)| !t.is_comment());
        significant()
            .find(|(_, t)| t.start <= offset && offset < t.end)
            .or_else(|| significant().find(|(_, t)| t.end == offset))
            .map(|(index, token)| (index, *token))
    }

    /// Whether the significant token after `index` opens a call.
    fn is_call(&self, index: usize) -> bool {
        self.tokens.as_ref().is_some_and(|tokens| {
            tokens[index + 1..]
                .iter()
                .find(|t| !t.is_comment())
                .is_some_and(|t| t.is(&self.source, "("))
        })
    }

    fn tokens_in(&self, span: &CodeSpan) -> Vec<Token> {
        self.tokens
            .iter()
            .flatten()
            .filter(|t| t.start >= span.start.offset && t.end <= span.end.offset)
            .copied()
            .collect()
    }
}

fn location(file: &Path, rope: &Rope, offset: usize) -> CodeLocation {
    let offset = offset.min(rope.len_chars());
    let line = rope.char_to_line(offset);
    let column = rope.char_to_utf16_cu(offset) - rope.char_to_utf16_cu(rope.line_to_char(line));
    CodeLocation::new(file, offset, line as u32, column as u32)
}

fn declaration(raw: RawDeclaration, locate: &impl Fn(usize) -> CodeLocation) -> Declaration {
    Declaration {
        name: raw.name,
        kind: raw.kind,
        span: CodeSpan::new(locate(raw.start), locate(raw.end)),
        name_span: CodeSpan::new(locate(raw.name_start), locate(raw.name_end)),
        doc: raw.doc,
        children: raw
            .children
            .into_iter()
            .map(|child| declaration(child, locate))
            .collect(),
    }
}

/// Declarations visible at `offset`, innermost scope first.
fn visible<'a>(declarations: &'a [Declaration], offset: usize) -> Vec<&'a Declaration> {
    let mut scopes = vec![declarations];
    let mut current = declarations;
    while let Some(enclosing) = current
        .iter()
        .find(|d| d.kind == DeclarationKind::Module && d.span.contains(offset))
    {
        scopes.push(&enclosing.children);
        current = &enclosing.children;
    }
    scopes.into_iter().rev().flatten().collect()
}

/// Built-in [`AnalysisEngine`] backed by the declaration scanner.
#[derive(Debug, Default)]
pub struct OutlineEngine {
    /// Files registered by the server.
    files: DashMap<PathBuf, Arc<FileAnalysis>>,
    /// Files read from disk to satisfy `include`/`use`.
    library: DashMap<PathBuf, Arc<FileAnalysis>>,
}

impl OutlineEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn analysis(&self, file: &Path) -> Option<Arc<FileAnalysis>> {
        self.files.get(file).map(|entry| entry.value().clone())
    }

    fn store(&self, file: &Path, text: &str) {
        self.library.remove(file);
        let analysis = FileAnalysis::analyze(file, text);
        trace!(
            "Analysed {}: {} declarations, {} errors",
            file.display(),
            analysis.declarations.len(),
            analysis.errors.len()
        );
        self.files.insert(file.to_path_buf(), Arc::new(analysis));
    }

    /// Resolves an include reference relative to the including file, preferring
    /// the registered (possibly unsaved) version over the file on disk. Disk
    /// reads are kept in `library` until the path is registered.
    async fn included(&self, from: &Path, include: &IncludeRef) -> Option<Arc<FileAnalysis>> {
        let path = from.parent()?.join(&include.path);
        if let Some(analysis) = self.analysis(&path) {
            return Some(analysis);
        }
        if let Some(cached) = self.library.get(&path).map(|entry| entry.value().clone()) {
            return Some(cached);
        }
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                trace!("Loaded included file {}", path.display());
                let analysis = Arc::new(FileAnalysis::analyze(&path, &text));
                self.library.insert(path, analysis.clone());
                Some(analysis)
            }
            Err(err) => {
                debug!("Cannot read included file {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Declarations in scope at `offset`: enclosing scopes, then included files.
    async fn scope(&self, analysis: &FileAnalysis, offset: usize) -> Vec<Declaration> {
        let mut declarations: Vec<Declaration> = visible(&analysis.declarations, offset)
            .into_iter()
            .cloned()
            .collect();
        for include in &analysis.includes {
            if let Some(included) = self.included(&analysis.file, include).await {
                declarations.extend(included.declarations.iter().cloned());
            }
        }
        declarations
    }

    async fn path_candidates(&self, analysis: &FileAnalysis, path: Token, offset: usize) -> Vec<CompletionCandidate> {
        let typed: String = analysis.source[path.start + 1..offset].iter().collect();
        let prefix = typed.rfind('/').map_or("", |slash| &typed[..=slash]);
        let Some(directory) = analysis.file.parent().map(|parent| parent.join(prefix)) else {
            return Vec::new();
        };

        let mut entries = match tokio::fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(err) => {
                debug!("Cannot list {}: {}", directory.display(), err);
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    debug!("Stopped listing {}: {}", directory.display(), err);
                    break;
                }
            };
            let entry_path = entry.path();
            let is_dir = match entry.file_type().await {
                Ok(file_type) => file_type.is_dir(),
                Err(_) => continue,
            };
            let kind = if is_dir {
                CandidateKind::Directory
            } else if entry_path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
                CandidateKind::File
            } else {
                continue;
            };
            candidates.push(CompletionCandidate {
                label: entry.file_name().to_string_lossy().into_owned(),
                kind,
                declaration: None,
            });
        }
        candidates.sort_by(|a, b| a.label.cmp(&b.label));
        candidates
    }
}

#[async_trait::async_trait]
impl AnalysisEngine for OutlineEngine {
    async fn register(&self, file: &Path, text: &str) {
        debug!("Registering {}", file.display());
        self.store(file, text);
    }

    async fn update(&self, file: &Path, text: &str) {
        if !self.files.contains_key(file) {
            warn!("Update for unregistered file {}; registering it", file.display());
        }
        self.store(file, text);
    }

    async fn deregister(&self, file: &Path) {
        debug!("Deregistering {}", file.display());
        self.files.remove(file);
        self.library.remove(file);
    }

    async fn handle(&self, file: &Path) -> Option<AnalysisHandle> {
        self.analysis(file).map(|analysis| analysis.handle())
    }

    async fn completions(&self, location: &CodeLocation) -> Vec<CompletionCandidate> {
        let Some(analysis) = self.analysis(location.file()) else {
            return Vec::new();
        };
        let Some(tokens) = analysis.tokens.as_ref() else {
            return Vec::new();
        };

        let offset = location.offset;
        if let Some(path) = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Path && t.start < offset && offset < t.end)
        {
            return self.path_candidates(&analysis, *path, offset).await;
        }

        let mut seen = HashSet::new();
        let mut candidates: Vec<CompletionCandidate> = self
            .scope(&analysis, offset)
            .await
            .into_iter()
            .filter(|d| seen.insert((d.name.clone(), d.kind)))
            .map(CompletionCandidate::declaration)
            .collect();
        candidates.extend(KEYWORDS.iter().map(|k| CompletionCandidate::keyword(*k)));
        candidates
    }

    async fn declarations(&self, file: &Path) -> Vec<Declaration> {
        self.analysis(file)
            .map(|analysis| analysis.declarations.clone())
            .unwrap_or_default()
    }

    async fn definition(&self, location: &CodeLocation) -> Option<Declaration> {
        let analysis = self.analysis(location.file())?;
        let (index, token) = analysis.token_at(location.offset)?;
        if token.kind != TokenKind::Ident {
            return None;
        }
        let name = token.text(&analysis.source);
        if KEYWORDS.contains(&name.as_str()) {
            return None;
        }

        let preferred: &[DeclarationKind] = if analysis.is_call(index) {
            &[DeclarationKind::Module, DeclarationKind::Function]
        } else {
            &[DeclarationKind::Variable]
        };
        let scope = self.scope(&analysis, location.offset).await;
        let matching: Vec<&Declaration> = scope.iter().filter(|d| d.name == name).collect();

        matching
            .iter()
            .find(|d| preferred.contains(&d.kind))
            .or_else(|| matching.first())
            .map(|d| (*d).clone())
    }

    async fn print_definition(&self, declaration: &Declaration) -> String {
        let file = declaration.file();
        let analysis = self
            .analysis(file)
            .or_else(|| self.library.get(file).map(|entry| entry.value().clone()));

        match analysis {
            Some(analysis) => {
                let tokens = analysis.tokens_in(&declaration.span);
                printer::definition(&analysis.source, &tokens, declaration.kind)
            }
            None => format!("{} {}", declaration.kind.keyword(), declaration.name),
        }
    }

    async fn reprint(&self, file: &Path) -> Option<String> {
        let analysis = self.analysis(file)?;
        let tokens = analysis.tokens.as_ref()?;
        Some(printer::reindent(&analysis.source, tokens))
    }

    fn engine_name(&self) -> &'static str {
        "outline"
    }
}
