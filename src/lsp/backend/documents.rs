//! Document store and analysis registry bridge.
//!
//! Every lifecycle event for a uri runs under that uri's sequencing mutex:
//! the store is updated, the engine is told, and diagnostics for the new
//! text are published before the next event for the same uri starts.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info, trace, warn};

use super::state::ScadBackend;
use crate::lsp::client::LspClient;
use crate::lsp::document::OpenDocument;
use crate::lsp::error::{ServerError, ServerResult};
use crate::lsp::features::diagnostics;

/// Version recorded for a freshly opened document.
const OPEN_VERSION: i32 = 0;

impl<C: LspClient> ScadBackend<C> {
    pub(super) fn engine_path(uri: &Url) -> ServerResult<PathBuf> {
        uri.to_file_path()
            .map_err(|()| ServerError::InvalidUri(uri.clone()))
    }

    fn sequencer(&self, uri: &Url) -> Arc<Mutex<()>> {
        self.sequencers.entry(uri.clone()).or_default().clone()
    }

    /// Copy of the open document, cheap thanks to the rope.
    pub(super) async fn document(&self, uri: &Url) -> ServerResult<OpenDocument> {
        self.documents
            .read()
            .await
            .get(uri)
            .cloned()
            .ok_or_else(|| ServerError::MissingDocument(uri.clone()))
    }

    pub async fn is_open(&self, uri: &Url) -> bool {
        self.documents.read().await.contains_key(uri)
    }

    /// Opens `uri`. A uri that is already open is left untouched.
    pub async fn open_document(&self, uri: Url, text: String) {
        let path = match Self::engine_path(&uri) {
            Ok(path) => path,
            Err(err) => {
                warn!("Ignoring open: {}", err);
                return;
            }
        };

        let sequencer = self.sequencer(&uri);
        let _guard = sequencer.lock().await;

        if self.is_open(&uri).await {
            debug!("Document already open: {}", uri);
            return;
        }
        self.register(uri, path, &text, OPEN_VERSION).await;
    }

    /// Replaces the text of `uri`. When the open was missed the document is
    /// opened at the editor's `version` rather than [`OPEN_VERSION`].
    pub async fn change_document(&self, uri: Url, text: String, version: i32) {
        let path = match Self::engine_path(&uri) {
            Ok(path) => path,
            Err(err) => {
                warn!("Ignoring change: {}", err);
                return;
            }
        };

        let sequencer = self.sequencer(&uri);
        let _guard = sequencer.lock().await;

        let replaced = match self.documents.write().await.get_mut(&uri) {
            Some(document) => {
                document.replace(&text, version);
                true
            }
            None => false,
        };

        if !replaced {
            info!("Change for unopened document {}; treating it as an open", uri);
            self.register(uri, path, &text, version).await;
            return;
        }

        trace!("Updating engine for {} at version {}", uri, version);
        self.engine.update(&path, &text).await;
        self.publish_diagnostics(&uri).await;
    }

    /// Closes `uri` and clears its diagnostics. Unknown uris are ignored.
    pub async fn close_document(&self, uri: Url) {
        let path = match Self::engine_path(&uri) {
            Ok(path) => path,
            Err(err) => {
                warn!("Ignoring close: {}", err);
                return;
            }
        };

        let sequencer = self.sequencer(&uri);
        let guard = sequencer.lock().await;

        if self.documents.write().await.remove(&uri).is_none() {
            warn!("Close for unopened document {}", uri);
        } else {
            self.engine.deregister(&path).await;
            self.forget_settings(&uri).await;
            self.client.publish_diagnostics(uri.clone(), Vec::new(), None).await;
            info!("Closed document {}", uri);
        }

        // The map and this task hold the only references when nobody waits.
        self.sequencers
            .remove_if(&uri, |_, mutex| Arc::strong_count(mutex) == 2);
        drop(guard);
    }

    /// Publishes diagnostics for every open document.
    pub async fn republish_all(&self) {
        let uris: Vec<Url> = self.documents.read().await.keys().cloned().collect();
        for uri in uris {
            let sequencer = self.sequencer(&uri);
            let _guard = sequencer.lock().await;
            if self.is_open(&uri).await {
                self.publish_diagnostics(&uri).await;
            }
        }
    }

    async fn register(&self, uri: Url, path: PathBuf, text: &str, version: i32) {
        self.documents
            .write()
            .await
            .insert(uri.clone(), OpenDocument::new(uri.clone(), text, version));
        self.engine.register(&path, text).await;
        info!("Opened document {} (version {})", uri, version);
        self.publish_diagnostics(&uri).await;
    }

    /// Publishes the engine's current errors for `uri`.
    async fn publish_diagnostics(&self, uri: &Url) {
        let Ok(path) = Self::engine_path(uri) else {
            return;
        };
        let errors = match self.engine.handle(&path).await {
            Some(handle) => handle.errors,
            None => {
                debug!("No analysis handle for {}", path.display());
                Vec::new()
            }
        };
        // Resolved and cached per uri; no setting filters the published list.
        let settings = self.settings_for(uri).await;
        trace!("Settings for {}: {:?}", uri, settings);

        let (diagnostics, version) = {
            let documents = self.documents.read().await;
            let Some(document) = documents.get(uri) else {
                return;
            };
            (
                diagnostics::render(document, &errors),
                document.version,
            )
        };

        debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, Some(version))
            .await;
    }
}
