pub mod backend;
pub mod client;
pub mod document;
pub mod error;
pub mod features;
pub mod position;

pub use backend::{ClientFlags, SETTINGS_SECTION, ScadBackend, Settings};
pub use client::LspClient;
pub use error::{ServerError, ServerResult};
