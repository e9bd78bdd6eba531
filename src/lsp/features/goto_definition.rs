use tower_lsp::lsp_types::{Location, Range, Url};

use super::to_position;
use crate::engine::Declaration;
use crate::lsp::error::{ServerError, ServerResult};

/// Zero-width location at the start of the declaration's name.
pub fn location(declaration: &Declaration) -> ServerResult<Location> {
    let uri = Url::from_file_path(declaration.file())
        .map_err(|()| ServerError::InvalidPath(declaration.file().to_path_buf()))?;
    let start = to_position(&declaration.name_span.start);
    Ok(Location::new(uri, Range::new(start, start)))
}
