//! Client-side settings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_lsp::lsp_types::{ConfigurationItem, Url};
use tracing::{debug, warn};

use super::state::ScadBackend;
use crate::lsp::client::LspClient;

/// Configuration section requested from the client.
pub const SETTINGS_SECTION: &str = "scadLanguageServer";

const DEFAULT_MAX_NUMBER_OF_PROBLEMS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Carried for clients that send it; every analysis error is still
    /// published.
    pub max_number_of_problems: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_number_of_problems: DEFAULT_MAX_NUMBER_OF_PROBLEMS,
        }
    }
}

impl Settings {
    /// Reads settings from the value of the configuration section.
    /// Missing or invalid values fall back to the defaults.
    pub fn from_value(value: Value) -> Self {
        if value.is_null() {
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|err| {
            warn!("Invalid {} settings: {}", SETTINGS_SECTION, err);
            Self::default()
        })
    }
}

/// Per-uri settings when the client scopes configuration, otherwise one
/// global value.
#[derive(Debug, Default)]
pub(super) struct SettingsCache {
    pub(super) per_document: HashMap<Url, Settings>,
    pub(super) global: Settings,
}

impl<C: LspClient> ScadBackend<C> {
    /// Settings that apply to `uri`, fetched from the client on first use.
    pub(super) async fn settings_for(&self, uri: &Url) -> Settings {
        if !self.client_flags.read().await.configuration {
            return self.settings.read().await.global.clone();
        }
        if let Some(settings) = self.settings.read().await.per_document.get(uri) {
            return settings.clone();
        }

        let item = ConfigurationItem {
            scope_uri: Some(uri.clone()),
            section: Some(SETTINGS_SECTION.to_string()),
        };
        let settings = match self.client.configuration(vec![item]).await {
            Ok(mut values) if !values.is_empty() => Settings::from_value(values.swap_remove(0)),
            Ok(_) => Settings::default(),
            Err(err) => {
                warn!("workspace/configuration failed for {}: {:?}", uri, err);
                Settings::default()
            }
        };
        debug!("Settings for {}: {:?}", uri, settings);

        // A close may have raced the request.
        if self.documents.read().await.contains_key(uri) {
            self.settings
                .write()
                .await
                .per_document
                .insert(uri.clone(), settings.clone());
        }
        settings
    }

    /// Applies a `workspace/didChangeConfiguration` payload.
    pub(super) async fn reset_settings(&self, payload: &Value) {
        let scoped = self.client_flags.read().await.configuration;
        let mut cache = self.settings.write().await;
        if scoped {
            cache.per_document.clear();
        } else {
            let section = payload.get(SETTINGS_SECTION).cloned().unwrap_or(Value::Null);
            cache.global = Settings::from_value(section);
            debug!("Global settings: {:?}", cache.global);
        }
    }

    pub(super) async fn forget_settings(&self, uri: &Url) {
        self.settings.write().await.per_document.remove(uri);
    }
}
