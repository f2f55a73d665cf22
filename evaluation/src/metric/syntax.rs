//! Kotlin syntax validation with tree-sitter

use tree_sitter::Parser;

/// Whether `code` parses as Kotlin without ERROR or MISSING nodes.
///
/// Empty or whitespace-only input is never valid.
pub fn is_valid_kotlin(code: &str) -> bool {
    if code.trim().is_empty() {
        return false;
    }

    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_kotlin_ng::LANGUAGE.into()) {
        tracing::error!(error = %e, "tree-sitter-kotlin grammar is incompatible with tree-sitter");
        return false;
    }

    match parser.parse(code, None) {
        Some(tree) => !tree.root_node().has_error(),
        None => false,
    }
}
