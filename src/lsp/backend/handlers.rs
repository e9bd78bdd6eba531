//! LSP protocol handler implementations
//!
//! The `tower_lsp::LanguageServer` impl is the dispatch table: each method
//! logs the request, delegates to a backend operation and converts failures
//! into JSON-RPC errors.

use tower_lsp::lsp_types::{
    CompletionItem, CompletionOptions, CompletionParams, CompletionResponse,
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidChangeWorkspaceFoldersParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DocumentFormattingParams,
    DocumentSymbolParams, DocumentSymbolResponse, GotoDefinitionParams, GotoDefinitionResponse,
    Hover, HoverParams, HoverProviderCapability, InitializeParams, InitializeResult,
    InitializedParams, OneOf, Registration, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, TextEdit, WorkspaceFoldersServerCapabilities,
    WorkspaceServerCapabilities,
};
use tower_lsp::{LanguageServer, jsonrpc};
use tracing::{debug, error, info, warn};

use super::state::{ClientFlags, ScadBackend};
use crate::lsp::client::LspClient;
use crate::lsp::features::completion;

const CONFIGURATION_REGISTRATION_ID: &str = "scad-did-change-configuration";

#[tower_lsp::async_trait]
impl<C: LspClient> LanguageServer for ScadBackend<C> {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!(
            "Received initialize from {}",
            params
                .client_info
                .as_ref()
                .map_or("unknown client", |info| info.name.as_str())
        );

        let flags = ClientFlags::from_capabilities(&params.capabilities);
        debug!("Client flags: {:?}", flags);
        *self.client_flags.write().await = flags;

        let workspace = flags.workspace_folders.then(|| WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: Some(OneOf::Left(true)),
            }),
            file_operations: None,
        });

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                document_formatting_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(true),
                    trigger_characters: Some(vec!["<".to_string(), "/".to_string()]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                workspace,
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let flags = *self.client_flags.read().await;

        if flags.configuration {
            let registration = Registration {
                id: CONFIGURATION_REGISTRATION_ID.to_string(),
                method: "workspace/didChangeConfiguration".to_string(),
                register_options: None,
            };
            if let Err(err) = self.client.register_capability(vec![registration]).await {
                warn!("Failed to register for configuration changes: {:?}", err);
            }
        }
        if flags.workspace_folders {
            info!("Client supports workspace folders");
        }
        info!("Server initialized using the {} engine", self.engine.engine_name());
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!("textDocument/didOpen: {}", params.text_document.uri);
        self.open_document(params.text_document.uri, params.text_document.text)
            .await;
    }

    async fn did_change(&self, mut params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!("textDocument/didChange: {} (version {})", uri, version);

        // Full sync: the last change carries the whole text.
        let Some(change) = params.content_changes.pop() else {
            warn!("didChange without content for {}", uri);
            return;
        };
        self.change_document(uri, change.text, version).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        info!("textDocument/didClose: {}", params.text_document.uri);
        self.close_document(params.text_document.uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        info!("workspace/didChangeConfiguration");
        self.reset_settings(&params.settings).await;
        self.republish_all().await;
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        info!(
            "workspace/didChangeWorkspaceFolders: {} added, {} removed",
            params.event.added.len(),
            params.event.removed.len()
        );
    }

    async fn completion(&self, params: CompletionParams) -> jsonrpc::Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        debug!("textDocument/completion: {} at {:?}", uri, position);

        match self.completions_at(&uri, position).await {
            Ok(items) => Ok(Some(CompletionResponse::Array(items))),
            Err(err) => {
                error!("Completion failed for {}: {:?}", uri, err);
                Err(err.into())
            }
        }
    }

    async fn completion_resolve(&self, item: CompletionItem) -> jsonrpc::Result<CompletionItem> {
        debug!("completionItem/resolve: {}", item.label);
        Ok(completion::resolve(item))
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> jsonrpc::Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        debug!("textDocument/documentSymbol: {}", uri);

        match self.symbols_for(&uri).await {
            Ok(symbols) => Ok(Some(DocumentSymbolResponse::Nested(symbols))),
            Err(err) => {
                error!("Document symbols failed for {}: {:?}", uri, err);
                Err(err.into())
            }
        }
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> jsonrpc::Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("textDocument/definition: {} at {:?}", uri, position);

        match self.definition_at(&uri, position).await {
            Ok(location) => Ok(location.map(GotoDefinitionResponse::Scalar)),
            Err(err) => {
                error!("Definition failed for {}: {:?}", uri, err);
                Err(err.into())
            }
        }
    }

    async fn hover(&self, params: HoverParams) -> jsonrpc::Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("textDocument/hover: {} at {:?}", uri, position);

        self.hover_at(&uri, position).await.map_err(|err| {
            error!("Hover failed for {}: {:?}", uri, err);
            err.into()
        })
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> jsonrpc::Result<Option<Vec<TextEdit>>> {
        let uri = params.text_document.uri;
        debug!("textDocument/formatting: {}", uri);

        match self.format_document(&uri).await {
            Ok(edits) => Ok(Some(edits)),
            Err(err) => {
                error!("Formatting failed for {}: {:?}", uri, err);
                Err(err.into())
            }
        }
    }
}
