//! Shared harness for the integration tests: a scripted analysis engine and
//! a client that records everything the server sends.
#![allow(dead_code)]

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::{
    ConfigurationItem, Diagnostic, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, InitializeParams, InitializedParams, Registration,
    TextDocumentContentChangeEvent, TextDocumentIdentifier, TextDocumentItem, Url,
    VersionedTextDocumentIdentifier,
};

use scad_language_server::engine::{
    AnalysisEngine, AnalysisError, AnalysisHandle, CodeLocation, CodeSpan, CompletionCandidate,
    Declaration, DeclarationKind, DocComment,
};
use scad_language_server::lsp::{LspClient, ScadBackend};

/// Character the mock engine reports as an analysis error.
pub const ERROR_MARKER: char = '?';
/// Character that makes the mock engine fail lexing.
pub const LEX_FAILURE_MARKER: char = '`';

/// Engine double. Errors are derived from the registered text: every
/// [`ERROR_MARKER`] is one analysis error, and a [`LEX_FAILURE_MARKER`]
/// drops the syntax tree. Everything else is scripted by the test.
#[derive(Default)]
pub struct MockEngine {
    texts: Mutex<HashMap<PathBuf, String>>,
    declarations: Mutex<HashMap<PathBuf, Vec<Declaration>>>,
    candidates: Mutex<Vec<CompletionCandidate>>,
    definitions: Mutex<Vec<(Range<usize>, Declaration)>>,
    update_delay: Mutex<Option<Duration>>,
    last_location: Mutex<Option<CodeLocation>>,
    pub register_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub deregister_calls: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn registered_text(&self, file: &Path) -> Option<String> {
        self.texts.lock().unwrap().get(file).cloned()
    }

    pub fn set_declarations(&self, file: &Path, declarations: Vec<Declaration>) {
        self.declarations
            .lock()
            .unwrap()
            .insert(file.to_path_buf(), declarations);
    }

    pub fn set_candidates(&self, candidates: Vec<CompletionCandidate>) {
        *self.candidates.lock().unwrap() = candidates;
    }

    /// Resolves cursors inside `offsets` to `declaration`.
    pub fn add_definition(&self, offsets: Range<usize>, declaration: Declaration) {
        self.definitions.lock().unwrap().push((offsets, declaration));
    }

    /// Delays the next `update` call.
    pub fn delay_next_update(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    pub fn last_location(&self) -> Option<CodeLocation> {
        self.last_location.lock().unwrap().clone()
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.register_calls.load(Ordering::SeqCst),
            self.update_calls.load(Ordering::SeqCst),
            self.deregister_calls.load(Ordering::SeqCst),
        )
    }

    fn store(&self, file: &Path, text: &str) {
        self.texts
            .lock()
            .unwrap()
            .insert(file.to_path_buf(), text.to_string());
    }
}

fn location_in(file: &Path, text: &str, offset: usize) -> CodeLocation {
    let before: Vec<char> = text.chars().take(offset).collect();
    let line = before.iter().filter(|&&c| c == '\n').count();
    let column: usize = before
        .iter()
        .rev()
        .take_while(|&&c| c != '\n')
        .map(|c| c.len_utf16())
        .sum();
    CodeLocation::new(file, offset, line as u32, column as u32)
}

#[async_trait::async_trait]
impl AnalysisEngine for MockEngine {
    async fn register(&self, file: &Path, text: &str) {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.store(file, text);
    }

    async fn update(&self, file: &Path, text: &str) {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.update_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.store(file, text);
    }

    async fn deregister(&self, file: &Path) {
        self.deregister_calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().remove(file);
    }

    async fn handle(&self, file: &Path) -> Option<AnalysisHandle> {
        let text = self.registered_text(file)?;
        let marker_errors = |marker: char, message: &str| -> Vec<AnalysisError> {
            text.chars()
                .enumerate()
                .filter(|(_, c)| *c == marker)
                .map(|(offset, _)| AnalysisError {
                    location: location_in(file, &text, offset),
                    message: message.to_string(),
                })
                .collect()
        };

        let lex_errors = marker_errors(LEX_FAILURE_MARKER, "Unexpected character '`'");
        if !lex_errors.is_empty() {
            return Some(AnalysisHandle {
                file: file.to_path_buf(),
                has_ast: false,
                errors: lex_errors.into_iter().take(1).collect(),
            });
        }
        Some(AnalysisHandle {
            file: file.to_path_buf(),
            has_ast: true,
            errors: marker_errors(ERROR_MARKER, "Unexpected '?'"),
        })
    }

    async fn completions(&self, location: &CodeLocation) -> Vec<CompletionCandidate> {
        *self.last_location.lock().unwrap() = Some(location.clone());
        self.candidates.lock().unwrap().clone()
    }

    async fn declarations(&self, file: &Path) -> Vec<Declaration> {
        self.declarations
            .lock()
            .unwrap()
            .get(file)
            .cloned()
            .unwrap_or_default()
    }

    async fn definition(&self, location: &CodeLocation) -> Option<Declaration> {
        *self.last_location.lock().unwrap() = Some(location.clone());
        self.definitions
            .lock()
            .unwrap()
            .iter()
            .find(|(offsets, _)| offsets.contains(&location.offset))
            .map(|(_, declaration)| declaration.clone())
    }

    async fn print_definition(&self, declaration: &Declaration) -> String {
        format!("{} {}", declaration.kind.keyword(), declaration.name)
    }

    async fn reprint(&self, file: &Path) -> Option<String> {
        self.registered_text(file)
            .map(|text| format!("{}\n", text.trim_end()))
    }

    fn engine_name(&self) -> &'static str {
        "mock"
    }
}

/// One `textDocument/publishDiagnostics` notification.
#[derive(Debug, Clone)]
pub struct Published {
    pub uri: Url,
    pub diagnostics: Vec<Diagnostic>,
    pub version: Option<i32>,
}

#[derive(Clone)]
pub struct RecordingClient {
    published: Arc<Mutex<Vec<Published>>>,
    registrations: Arc<Mutex<Vec<Registration>>>,
    configuration_requests: Arc<Mutex<Vec<ConfigurationItem>>>,
    /// Returned for every requested configuration item.
    configuration_value: Arc<Mutex<Value>>,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self {
            published: Arc::default(),
            registrations: Arc::default(),
            configuration_requests: Arc::default(),
            configuration_value: Arc::new(Mutex::new(Value::Null)),
        }
    }
}

impl RecordingClient {
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_for(&self, uri: &Url) -> Vec<Published> {
        self.published()
            .into_iter()
            .filter(|p| &p.uri == uri)
            .collect()
    }

    pub fn last_published(&self, uri: &Url) -> Option<Published> {
        self.published_for(uri).pop()
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn configuration_requests(&self) -> Vec<ConfigurationItem> {
        self.configuration_requests.lock().unwrap().clone()
    }

    pub fn set_configuration(&self, value: Value) {
        *self.configuration_value.lock().unwrap() = value;
    }
}

#[async_trait::async_trait]
impl LspClient for RecordingClient {
    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.published.lock().unwrap().push(Published {
            uri,
            diagnostics,
            version,
        });
    }

    async fn register_capability(&self, registrations: Vec<Registration>) -> jsonrpc::Result<()> {
        self.registrations.lock().unwrap().extend(registrations);
        Ok(())
    }

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> jsonrpc::Result<Vec<Value>> {
        let value = self.configuration_value.lock().unwrap().clone();
        let count = items.len();
        self.configuration_requests.lock().unwrap().extend(items);
        Ok(vec![value; count])
    }
}

pub type TestServer = ScadBackend<RecordingClient>;

/// Initialized server over `engine` with default client capabilities.
pub async fn server_with(engine: Arc<dyn AnalysisEngine>) -> (TestServer, RecordingClient) {
    server_with_params(engine, InitializeParams::default()).await
}

pub async fn server_with_params(
    engine: Arc<dyn AnalysisEngine>,
    params: InitializeParams,
) -> (TestServer, RecordingClient) {
    let client = RecordingClient::default();
    let server = ScadBackend::new(client.clone(), engine);
    server
        .initialize(params)
        .await
        .expect("initialize failed");
    server.initialized(InitializedParams {}).await;
    (server, client)
}

pub async fn mock_server() -> (TestServer, RecordingClient, Arc<MockEngine>) {
    let engine = MockEngine::new();
    let (server, client) = server_with(engine.clone()).await;
    (server, client, engine)
}

pub fn path(name: &str) -> PathBuf {
    PathBuf::from("/work").join(name)
}

pub fn uri(name: &str) -> Url {
    Url::from_file_path(path(name)).expect("absolute path")
}

pub async fn open(server: &TestServer, uri: &Url, text: &str) {
    server
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "scad".to_string(),
                version: 1,
                text: text.to_string(),
            },
        })
        .await;
}

pub fn change_params(uri: &Url, text: &str, version: i32) -> DidChangeTextDocumentParams {
    DidChangeTextDocumentParams {
        text_document: VersionedTextDocumentIdentifier {
            uri: uri.clone(),
            version,
        },
        content_changes: vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: text.to_string(),
        }],
    }
}

pub async fn change(server: &TestServer, uri: &Url, text: &str, version: i32) {
    server.did_change(change_params(uri, text, version)).await;
}

pub async fn close(server: &TestServer, uri: &Url) {
    server
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        })
        .await;
}

/// Declaration in `file` whose name starts at `(line, column)` / `offset`.
pub fn declaration(
    file: &Path,
    name: &str,
    kind: DeclarationKind,
    name_start: (usize, u32, u32),
    doc: Option<DocComment>,
) -> Declaration {
    let (offset, line, column) = name_start;
    let name_len = name.chars().count();
    let start = CodeLocation::new(file, offset, line, column);
    let name_end = CodeLocation::new(file, offset + name_len, line, column + name_len as u32);
    Declaration {
        name: name.to_string(),
        kind,
        span: CodeSpan::new(start.clone(), name_end.clone()),
        name_span: CodeSpan::new(start, name_end),
        doc,
        children: Vec::new(),
    }
}
