pub mod engine;
pub mod logging;
pub mod lsp;
