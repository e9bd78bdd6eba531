use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{CompletionItem, DocumentSymbol, Hover, Location, Position, TextEdit, Url};
use tracing::debug;

use crate::engine::{AnalysisEngine, AnalysisHandle};
use crate::lsp::client::LspClient;
use crate::lsp::error::{ServerError, ServerResult};
use crate::lsp::features::{completion, documentation, formatting, goto_definition, hover, symbols};

mod documents;
mod handlers;
mod settings;
mod state;

pub use settings::{SETTINGS_SECTION, Settings};
pub use state::{ClientFlags, ScadBackend};
use settings::SettingsCache;

impl<C: LspClient> ScadBackend<C> {
    /// Creates a backend that answers through `client` and delegates analysis
    /// to `engine`.
    pub fn new(client: C, engine: Arc<dyn AnalysisEngine>) -> Self {
        Self {
            client,
            engine,
            documents: Arc::new(RwLock::new(HashMap::new())),
            sequencers: DashMap::new(),
            settings: Arc::new(RwLock::new(SettingsCache::default())),
            client_flags: Arc::new(RwLock::new(ClientFlags::default())),
        }
    }

    /// Handle of `file` when the engine has a syntax tree for it.
    async fn analysis(&self, file: &Path) -> Option<AnalysisHandle> {
        self.engine.handle(file).await.filter(|handle| handle.has_ast)
    }

    /// Completion items at `position`; empty when the file has no syntax tree.
    pub async fn completions_at(&self, uri: &Url, position: Position) -> ServerResult<Vec<CompletionItem>> {
        let document = self.document(uri).await?;
        let path = Self::engine_path(uri)?;
        if self.analysis(&path).await.is_none() {
            debug!("No syntax tree for {}; no completions", path.display());
            return Ok(Vec::new());
        }

        let location = document.location_at(&path, position);
        let candidates = self.engine.completions(&location).await;

        let mut items = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.into_iter().enumerate() {
            let docs = match candidate.declaration.as_ref() {
                Some(declaration) => {
                    let signature = self.engine.print_definition(declaration).await;
                    Some(documentation::render(&signature, declaration.doc.as_ref()))
                }
                None => None,
            };
            items.push(completion::item(index, candidate, docs));
        }
        Ok(items)
    }

    /// Outline of `uri`; empty while the file has analysis errors.
    pub async fn symbols_for(&self, uri: &Url) -> ServerResult<Vec<DocumentSymbol>> {
        self.document(uri).await?;
        let path = Self::engine_path(uri)?;
        match self.analysis(&path).await {
            Some(handle) if !handle.has_errors() => {
                let declarations = self.engine.declarations(&path).await;
                Ok(symbols::document_symbols(&declarations))
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Declaration location of the symbol at `position`, if any.
    pub async fn definition_at(&self, uri: &Url, position: Position) -> ServerResult<Option<Location>> {
        let document = self.document(uri).await?;
        let path = Self::engine_path(uri)?;
        if self.analysis(&path).await.is_none() {
            return Err(ServerError::MissingAnalysis(path));
        }

        let location = document.location_at(&path, position);
        match self.engine.definition(&location).await {
            Some(declaration) => goto_definition::location(&declaration).map(Some),
            None => Ok(None),
        }
    }

    /// Documentation of the symbol at `position`, if any.
    pub async fn hover_at(&self, uri: &Url, position: Position) -> ServerResult<Option<Hover>> {
        let document = self.document(uri).await?;
        let path = Self::engine_path(uri)?;
        if self.analysis(&path).await.is_none() {
            return Err(ServerError::MissingAnalysis(path));
        }

        let location = document.location_at(&path, position);
        let Some(declaration) = self.engine.definition(&location).await else {
            return Ok(None);
        };
        let signature = self.engine.print_definition(&declaration).await;
        Ok(Some(hover::hover(&declaration, &signature, position)))
    }

    /// Whole-document edit to the engine's canonical text; no edits while the
    /// file has analysis errors.
    pub async fn format_document(&self, uri: &Url) -> ServerResult<Vec<TextEdit>> {
        let document = self.document(uri).await?;
        let path = Self::engine_path(uri)?;
        match self.analysis(&path).await {
            Some(handle) if !handle.has_errors() => {}
            _ => {
                debug!("Refusing to format {}", path.display());
                return Ok(Vec::new());
            }
        }

        Ok(self
            .engine
            .reprint(&path)
            .await
            .map(|formatted| vec![formatting::whole_document_edit(&document, formatted)])
            .unwrap_or_default())
    }
}
