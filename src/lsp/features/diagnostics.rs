use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Range};

use crate::engine::AnalysisError;
use crate::lsp::document::OpenDocument;

pub const DIAGNOSTIC_SOURCE: &str = "scad";

/// One error-severity diagnostic per analysis error, anchored at the error's
/// offset.
pub fn render(document: &OpenDocument, errors: &[AnalysisError]) -> Vec<Diagnostic> {
    errors
        .iter()
        .map(|error| {
            let position = document.position_at(error.location.offset);
            Diagnostic {
                range: Range::new(position, position),
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                message: error.message.clone(),
                ..Default::default()
            }
        })
        .collect()
}
