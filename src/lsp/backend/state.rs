//! Backend state.
//!
//! `ScadBackend` owns everything the server keeps between messages: the open
//! documents, one sequencing mutex per uri, the settings cache and what the
//! client said it supports during `initialize`.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::Client;
use tower_lsp::lsp_types::{ClientCapabilities, Url};

use super::settings::SettingsCache;
use crate::engine::AnalysisEngine;
use crate::lsp::client::LspClient;
use crate::lsp::document::OpenDocument;

/// Client capabilities the backend acts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientFlags {
    /// `workspace/configuration` is available, so settings are scoped per uri.
    pub configuration: bool,
    pub workspace_folders: bool,
    pub related_information: bool,
}

impl ClientFlags {
    pub fn from_capabilities(capabilities: &ClientCapabilities) -> Self {
        let workspace = capabilities.workspace.as_ref();
        Self {
            configuration: workspace.and_then(|w| w.configuration).unwrap_or(false),
            workspace_folders: workspace.and_then(|w| w.workspace_folders).unwrap_or(false),
            related_information: capabilities
                .text_document
                .as_ref()
                .and_then(|t| t.publish_diagnostics.as_ref())
                .and_then(|p| p.related_information)
                .unwrap_or(false),
        }
    }
}

/// The SCAD language server backend.
pub struct ScadBackend<C: LspClient = Client> {
    pub(super) client: C,
    pub(super) engine: Arc<dyn AnalysisEngine>,
    pub(super) documents: Arc<RwLock<HashMap<Url, OpenDocument>>>,
    /// Held across store update, engine notification and diagnostics publishing.
    pub(super) sequencers: DashMap<Url, Arc<Mutex<()>>>,
    pub(super) settings: Arc<RwLock<SettingsCache>>,
    pub(super) client_flags: Arc<RwLock<ClientFlags>>,
}

impl<C: LspClient> std::fmt::Debug for ScadBackend<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScadBackend")
            .field("engine", &self.engine.engine_name())
            .field("documents", &"<HashMap>")
            .finish()
    }
}
