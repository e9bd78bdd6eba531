mod common;

use std::fs;
use std::sync::Arc;

use indoc::indoc;
use tower_lsp::LanguageServer;
use tower_lsp::lsp_types::{
    CompletionItemKind, Documentation, GotoDefinitionResponse, Position, Range, SymbolKind, Url,
};

use common::{open, server_with, uri};
use scad_language_server::engine::outline::OutlineEngine;

async fn outline_server() -> (common::TestServer, common::RecordingClient) {
    server_with(Arc::new(OutlineEngine::new())).await
}

#[tokio::test]
async fn test_unclosed_brace_is_reported_with_ast_kept() {
    let (server, client) = outline_server().await;
    let uri = uri("unclosed.scad");
    open(&server, &uri, "module a() {\n  cube(1);\n").await;

    let published = client.last_published(&uri).unwrap();
    assert_eq!(published.diagnostics.len(), 1);
    assert_eq!(published.diagnostics[0].message, "Unclosed '{'");
    assert_eq!(published.diagnostics[0].range.start, Position::new(0, 11));

    let symbols = server.symbols_for(&uri).await.unwrap();
    assert!(symbols.is_empty());
    let completions = server.completions_at(&uri, Position::new(1, 2)).await.unwrap();
    assert!(completions.iter().any(|item| item.label == "a"));
}

#[tokio::test]
async fn test_lex_failure_drops_everything_but_the_error() {
    let (server, client) = outline_server().await;
    let uri = uri("lexfail.scad");
    open(&server, &uri, "a = 1;\nb = \"open").await;

    let published = client.last_published(&uri).unwrap();
    assert_eq!(published.diagnostics.len(), 1);
    assert_eq!(published.diagnostics[0].range.start, Position::new(1, 4));
    assert_eq!(published.diagnostics[0].message, "Unterminated string literal");

    assert!(server.completions_at(&uri, Position::new(0, 1)).await.unwrap().is_empty());
    assert!(server.format_document(&uri).await.unwrap().is_empty());
    assert!(server.definition_at(&uri, Position::new(0, 0)).await.is_err());
}

#[tokio::test]
async fn test_fixing_an_error_clears_diagnostics() {
    let (server, client) = outline_server().await;
    let uri = uri("fix.scad");
    open(&server, &uri, "a = 1\n").await;
    assert_eq!(client.last_published(&uri).unwrap().diagnostics.len(), 1);

    common::change(&server, &uri, "a = 1;\n", 2).await;
    assert!(client.last_published(&uri).unwrap().diagnostics.is_empty());
}

#[tokio::test]
async fn test_symbols_and_scope_completion() {
    let (server, _client) = outline_server().await;
    let uri = uri("box.scad");
    let text = indoc! {"
        width = 10;
        module box(s) {
          inner = 1;
          cube(s);
        }
    "};
    open(&server, &uri, text).await;

    let symbols = server.symbols_for(&uri).await.unwrap();
    let names: Vec<(&str, SymbolKind)> = symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
    assert_eq!(names, vec![("width", SymbolKind::VARIABLE), ("box", SymbolKind::MODULE)]);
    assert_eq!(symbols[1].selection_range, Range::new(Position::new(1, 7), Position::new(1, 10)));
    assert_eq!(symbols[1].children.as_ref().unwrap()[0].name, "inner");

    let items = server.completions_at(&uri, Position::new(3, 2)).await.unwrap();
    let labels: Vec<&str> = items.iter().take(3).map(|i| i.label.as_str()).collect();
    assert_eq!(labels, vec!["inner", "width", "box"]);
    assert_eq!(items[2].kind, Some(CompletionItemKind::MODULE));
    match &items[2].documentation {
        Some(Documentation::MarkupContent(markup)) => assert_eq!(markup.value, "```scad\nmodule box(s)\n```"),
        other => panic!("expected markdown documentation, got {:?}", other),
    }
    assert!(
        items
            .iter()
            .any(|i| i.label == "module" && i.kind == Some(CompletionItemKind::KEYWORD))
    );
}

#[tokio::test]
async fn test_hover_on_documented_module_call() {
    let (server, _client) = outline_server().await;
    let uri = uri("plate.scad");
    let text = indoc! {"
        // Rounded plate.
        // @param size (positional) {number} Outer size
        // @param r (named) Corner radius
        // @see https://en.wikipedia.org/wiki/Plate
        module plate(size, r = 2) {
            cube(size);
        }

        plate(10);
    "};
    open(&server, &uri, text).await;

    let hover = server.hover_at(&uri, Position::new(8, 1)).await.unwrap().unwrap();
    let markdown = match hover.contents {
        tower_lsp::lsp_types::HoverContents::Markup(markup) => markup.value,
        other => panic!("unexpected hover contents {:?}", other),
    };
    let expected = indoc! {"
        ```scad
        module plate(size, r = 2)
        ```

        Rounded plate.

        **Parameters:**

        - `size` *(positional)* `number`: Outer size
        - `r` *(named)*: Corner radius

        [See more on Wikipedia](https://en.wikipedia.org/wiki/Plate)"};
    assert_eq!(markdown, expected);
}

#[tokio::test]
async fn test_definition_follows_include() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("lib/gears.scad"), "module gear(teeth) {}\n").unwrap();

    let (server, _client) = outline_server().await;
    let uri = Url::from_file_path(dir.path().join("main.scad")).unwrap();
    open(&server, &uri, "include <lib/gears.scad>\ngear(12);\n").await;

    let response = server
        .definition_at(&uri, Position::new(1, 1))
        .await
        .unwrap()
        .map(GotoDefinitionResponse::Scalar);
    match response {
        Some(GotoDefinitionResponse::Scalar(location)) => {
            assert_eq!(location.uri, Url::from_file_path(dir.path().join("lib/gears.scad")).unwrap());
            assert_eq!(location.range, Range::new(Position::new(0, 7), Position::new(0, 7)));
        }
        other => panic!("unexpected definition {:?}", other),
    }

    assert!(server.definition_at(&uri, Position::new(1, 6)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_include_path_completion_lists_directories_and_sources() {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join("lib");
    fs::create_dir_all(lib.join("sub")).unwrap();
    fs::write(lib.join("gears.scad"), "").unwrap();
    fs::write(lib.join("notes.txt"), "").unwrap();

    let (server, _client) = outline_server().await;
    let uri = Url::from_file_path(dir.path().join("main.scad")).unwrap();
    open(&server, &uri, "include <lib/>\n").await;

    let items = server.completions_at(&uri, Position::new(0, 13)).await.unwrap();
    let entries: Vec<(&str, Option<CompletionItemKind>)> =
        items.iter().map(|i| (i.label.as_str(), i.kind)).collect();
    assert_eq!(
        entries,
        vec![
            ("gears.scad", Some(CompletionItemKind::FILE)),
            ("sub", Some(CompletionItemKind::FOLDER)),
        ]
    );
}

#[tokio::test]
async fn test_formatting_reindents() {
    let (server, _client) = outline_server().await;
    let uri = uri("indent.scad");
    open(&server, &uri, "module a() {\ncube(1);\n}\n\n\n").await;

    let edits = server.format_document(&uri).await.unwrap();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].range, Range::new(Position::new(0, 0), Position::new(5, 0)));
    assert_eq!(edits[0].new_text, "module a() {\n    cube(1);\n}\n");

    common::change(&server, &uri, &edits[0].new_text, 2).await;
    let again = server.format_document(&uri).await.unwrap();
    assert_eq!(again[0].new_text, edits[0].new_text);
}

#[tokio::test]
async fn test_formatting_refused_while_braces_unbalanced() {
    let (server, _client) = outline_server().await;
    let uri = uri("unbalanced.scad");
    open(&server, &uri, "module a() {\ncube(1);\n").await;

    assert!(server.format_document(&uri).await.unwrap().is_empty());
    server.shutdown().await.unwrap();
}
