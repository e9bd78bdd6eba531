//! Completion items and the legacy resolve switch.

use serde_json::Value;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Documentation, MarkupContent, MarkupKind};

use crate::engine::{CandidateKind, CompletionCandidate};

pub fn item_kind(kind: CandidateKind) -> CompletionItemKind {
    match kind {
        CandidateKind::Function => CompletionItemKind::FUNCTION,
        CandidateKind::Module => CompletionItemKind::MODULE,
        CandidateKind::Variable => CompletionItemKind::VARIABLE,
        CandidateKind::Keyword => CompletionItemKind::KEYWORD,
        CandidateKind::Directory => CompletionItemKind::FOLDER,
        CandidateKind::File => CompletionItemKind::FILE,
    }
}

/// Builds the item for the candidate at 0-based position `index`.
///
/// `documentation` is the rendered markdown for declaration-backed
/// candidates. The item's `data` is the 1-based index.
pub fn item(index: usize, candidate: CompletionCandidate, documentation: Option<String>) -> CompletionItem {
    CompletionItem {
        label: candidate.label,
        kind: Some(item_kind(candidate.kind)),
        data: Some(Value::from(index + 1)),
        documentation: documentation.map(|value| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            })
        }),
        ..Default::default()
    }
}

/// Attaches the static detail for the first two items.
///
/// Items that already carry documentation keep it.
pub fn resolve(mut item: CompletionItem) -> CompletionItem {
    let (detail, documentation) = match item.data.as_ref().and_then(Value::as_u64) {
        Some(1) => ("SCAD details", "Declarations visible in the current scope."),
        Some(2) => ("SCAD keywords", "Language keywords and built-in constants."),
        _ => return item,
    };

    item.detail = Some(detail.to_string());
    if item.documentation.is_none() {
        item.documentation = Some(Documentation::String(documentation.to_string()));
    }
    item
}
