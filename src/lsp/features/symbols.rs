use tower_lsp::lsp_types::{DocumentSymbol, SymbolKind};

use super::to_range;
use crate::engine::{Declaration, DeclarationKind};

pub fn symbol_kind(kind: DeclarationKind) -> SymbolKind {
    match kind {
        DeclarationKind::Function => SymbolKind::FUNCTION,
        DeclarationKind::Module => SymbolKind::MODULE,
        DeclarationKind::Variable => SymbolKind::VARIABLE,
    }
}

/// Outline tree for a file's declarations.
pub fn document_symbols(declarations: &[Declaration]) -> Vec<DocumentSymbol> {
    declarations.iter().map(document_symbol).collect()
}

#[allow(deprecated)]
fn document_symbol(declaration: &Declaration) -> DocumentSymbol {
    let children = document_symbols(&declaration.children);
    DocumentSymbol {
        name: declaration.name.clone(),
        detail: None,
        kind: symbol_kind(declaration.kind),
        tags: None,
        deprecated: None,
        range: to_range(&declaration.span),
        selection_range: to_range(&declaration.name_span),
        children: (!children.is_empty()).then_some(children),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CodeLocation, CodeSpan};
    use tower_lsp::lsp_types::{Position, Range};

    fn span(start: (u32, u32), end: (u32, u32)) -> CodeSpan {
        CodeSpan::new(
            CodeLocation::new("/work/s.scad", 0, start.0, start.1),
            CodeLocation::new("/work/s.scad", 0, end.0, end.1),
        )
    }

    fn declaration(name: &str, kind: DeclarationKind, children: Vec<Declaration>) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind,
            span: span((1, 0), (4, 1)),
            name_span: span((1, 7), (1, 12)),
            doc: None,
            children,
        }
    }

    #[test]
    fn test_nested_symbols() {
        let tree = document_symbols(&[declaration(
            "frame",
            DeclarationKind::Module,
            vec![declaration("inset", DeclarationKind::Variable, Vec::new())],
        )]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].kind, SymbolKind::MODULE);
        assert_eq!(tree[0].range, Range::new(Position::new(1, 0), Position::new(4, 1)));
        assert_eq!(tree[0].selection_range, Range::new(Position::new(1, 7), Position::new(1, 12)));

        let children = tree[0].children.as_ref().unwrap();
        assert_eq!(children[0].name, "inset");
        assert_eq!(children[0].kind, SymbolKind::VARIABLE);
        assert!(children[0].children.is_none());
    }
}
