//! The part of the editor connection the server talks back to.

use serde_json::Value;
use tower_lsp::Client;
use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::{ConfigurationItem, Diagnostic, Registration, Url};

/// Client-bound messages sent by the backend.
///
/// Implemented for [`tower_lsp::Client`]; tests substitute a recorder.
#[async_trait::async_trait]
pub trait LspClient: Send + Sync + 'static {
    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>);

    async fn register_capability(&self, registrations: Vec<Registration>) -> jsonrpc::Result<()>;

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> jsonrpc::Result<Vec<Value>>;
}

#[async_trait::async_trait]
impl LspClient for Client {
    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        Client::publish_diagnostics(self, uri, diagnostics, version).await
    }

    async fn register_capability(&self, registrations: Vec<Registration>) -> jsonrpc::Result<()> {
        Client::register_capability(self, registrations).await
    }

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> jsonrpc::Result<Vec<Value>> {
        Client::configuration(self, items).await
    }
}
