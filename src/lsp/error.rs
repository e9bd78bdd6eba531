//! Request failures and their JSON-RPC mapping.

use std::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;
use tower_lsp::jsonrpc::{self, ErrorCode};
use tower_lsp::lsp_types::Url;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The uri was never opened, or has been closed.
    #[error("Document is not open: {0}")]
    MissingDocument(Url),

    /// The document is open but the engine has no syntax tree for it.
    #[error("No analysis available for {}", .0.display())]
    MissingAnalysis(PathBuf),

    #[error("Not a file URI: {0}")]
    InvalidUri(Url),

    /// An engine reported a file path that has no `file://` form.
    #[error("Cannot express {} as a file URI", .0.display())]
    InvalidPath(PathBuf),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl From<ServerError> for jsonrpc::Error {
    fn from(err: ServerError) -> Self {
        let code = match err {
            ServerError::MissingDocument(_) | ServerError::InvalidUri(_) => ErrorCode::InvalidParams,
            ServerError::MissingAnalysis(_) | ServerError::InvalidPath(_) => ErrorCode::InternalError,
        };
        jsonrpc::Error {
            code,
            message: Cow::Owned(err.to_string()),
            data: None,
        }
    }
}
