//! Metadata extractor (C4): per-chunk imports, calls, signature, complexity,
//! docstring and related semantic fields.
//!
//! Extraction is best-effort per language and never propagates an error past
//! this module — any node shape the table below doesn't recognize is
//! silently skipped, degrading to the zero-value default for that field.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::model::{CallContext, ChunkMetadata, Complexity, LspType, Parameter, Signature};
use crate::parser::SupportedLanguage;

struct LanguageSyntax {
    call_kinds: &'static [&'static str],
    decision_kinds: &'static [&'static str],
    import_kinds: &'static [&'static str],
    conditional_kinds: &'static [&'static str],
    loop_kinds: &'static [&'static str],
    scope_kinds: &'static [&'static str],
    async_marker: Option<&'static str>,
    decorator_kind: Option<&'static str>,
    string_kinds: &'static [&'static str],
}

fn syntax(language: SupportedLanguage) -> LanguageSyntax {
    use SupportedLanguage::*;
    match language {
        Python => LanguageSyntax {
            call_kinds: &["call"],
            decision_kinds: &[
                "if_statement", "elif_clause", "for_statement", "while_statement",
                "boolean_operator", "conditional_expression", "except_clause",
            ],
            import_kinds: &["import_statement", "import_from_statement"],
            conditional_kinds: &["if_statement", "elif_clause", "conditional_expression"],
            loop_kinds: &["for_statement", "while_statement"],
            scope_kinds: &["function_definition", "class_definition"],
            async_marker: Some("async"),
            decorator_kind: Some("decorator"),
            string_kinds: &["string"],
        },
        JavaScript | TypeScript | Tsx => LanguageSyntax {
            call_kinds: &["call_expression"],
            decision_kinds: &[
                "if_statement", "for_statement", "for_in_statement", "while_statement",
                "switch_case", "binary_expression", "ternary_expression", "catch_clause",
            ],
            import_kinds: &["import_statement"],
            conditional_kinds: &["if_statement", "ternary_expression"],
            loop_kinds: &["for_statement", "for_in_statement", "while_statement"],
            scope_kinds: &["function_declaration", "method_definition", "class_declaration"],
            async_marker: Some("async"),
            decorator_kind: Some("decorator"),
            string_kinds: &["string", "template_string"],
        },
        Rust => LanguageSyntax {
            call_kinds: &["call_expression"],
            decision_kinds: &["if_expression", "for_expression", "while_expression", "match_arm"],
            import_kinds: &["use_declaration"],
            conditional_kinds: &["if_expression"],
            loop_kinds: &["for_expression", "while_expression", "loop_expression"],
            scope_kinds: &["function_item", "impl_item", "trait_item"],
            async_marker: Some("async"),
            decorator_kind: None,
            string_kinds: &["string_literal"],
        },
        Go => LanguageSyntax {
            call_kinds: &["call_expression"],
            decision_kinds: &["if_statement", "for_statement", "expression_case", "binary_expression"],
            import_kinds: &["import_spec"],
            conditional_kinds: &["if_statement"],
            loop_kinds: &["for_statement"],
            scope_kinds: &["function_declaration", "method_declaration"],
            async_marker: None,
            decorator_kind: None,
            string_kinds: &["interpreted_string_literal", "raw_string_literal"],
        },
        C | Cpp => LanguageSyntax {
            call_kinds: &["call_expression"],
            decision_kinds: &["if_statement", "for_statement", "while_statement", "case_statement"],
            import_kinds: &["preproc_include"],
            conditional_kinds: &["if_statement"],
            loop_kinds: &["for_statement", "while_statement"],
            scope_kinds: &["function_definition", "class_specifier"],
            async_marker: None,
            decorator_kind: None,
            string_kinds: &["string_literal"],
        },
        CSharp => LanguageSyntax {
            call_kinds: &["invocation_expression"],
            decision_kinds: &["if_statement", "for_statement", "while_statement", "switch_section"],
            import_kinds: &["using_directive"],
            conditional_kinds: &["if_statement"],
            loop_kinds: &["for_statement", "while_statement"],
            scope_kinds: &["method_declaration", "class_declaration"],
            async_marker: Some("async"),
            decorator_kind: Some("attribute_list"),
            string_kinds: &["string_literal"],
        },
    }
}

fn walk<'a>(node: Node<'a>, f: &mut impl FnMut(Node<'a>)) {
    f(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, f);
    }
}

fn text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn compute_complexity(node: Node<'_>, source: &str, syn: &LanguageSyntax) -> Complexity {
    let mut decisions = 0u32;
    walk(node, &mut |n| {
        if syn.decision_kinds.contains(&n.kind()) {
            decisions += 1;
        }
    });
    let loc = text(node, source).lines().count() as u32;
    Complexity {
        cyclomatic: 1 + decisions,
        cognitive: 1 + decisions,
        lines_of_code: loc,
    }
}

/// Joins a member-access chain (`a.b.c`) into a dotted string, e.g. for
/// `obj.method(...)` call targets.
fn callee_name(call_node: Node<'_>, source: &str, language: SupportedLanguage) -> Option<String> {
    let target = match language {
        SupportedLanguage::Python | SupportedLanguage::Rust => call_node.child_by_field_name("function"),
        SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => {
            call_node.child_by_field_name("function")
        }
        SupportedLanguage::Go => call_node.child_by_field_name("function"),
        SupportedLanguage::C | SupportedLanguage::Cpp => call_node.child_by_field_name("function"),
        SupportedLanguage::CSharp => call_node.child_by_field_name("function"),
    }?;
    let t = text(target, source).trim();
    if t.is_empty() {
        None
    } else {
        Some(t.replace("::", "."))
    }
}

fn nearest_ancestor_scope<'a>(mut node: Node<'a>, source: &'a str, syn: &LanguageSyntax) -> (String, String) {
    loop {
        match node.parent() {
            Some(p) => {
                if syn.scope_kinds.contains(&p.kind()) {
                    let name = p
                        .child_by_field_name("name")
                        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
                        .unwrap_or("")
                        .to_string();
                    return (p.kind().to_string(), name);
                }
                node = p;
            }
            None => return ("module".to_string(), String::new()),
        }
    }
}

fn has_ancestor_kind(mut node: Node<'_>, boundary: Node<'_>, kinds: &[&str]) -> bool {
    while let Some(p) = node.parent() {
        if p.id() == boundary.id() {
            return false;
        }
        if kinds.contains(&p.kind()) {
            return true;
        }
        node = p;
    }
    false
}

fn extract_calls(node: Node<'_>, source: &str, language: SupportedLanguage, syn: &LanguageSyntax) -> (Vec<String>, Vec<CallContext>) {
    let mut calls = Vec::new();
    let mut contexts = Vec::new();
    walk(node, &mut |n| {
        if syn.call_kinds.contains(&n.kind()) {
            if let Some(name) = callee_name(n, source, language) {
                let is_conditional = has_ancestor_kind(n, node, syn.conditional_kinds);
                let is_loop = has_ancestor_kind(n, node, syn.loop_kinds);
                let (scope_type, scope_name) = nearest_ancestor_scope(n, source, syn);
                calls.push(name.clone());
                contexts.push(CallContext {
                    call_name: name,
                    is_conditional,
                    is_loop,
                    scope_type,
                    scope_name,
                });
            }
        }
    });
    (calls, contexts)
}

fn extract_imports(root: Node<'_>, source: &str, language: SupportedLanguage, syn: &LanguageSyntax) -> Vec<String> {
    let mut imports = Vec::new();
    walk(root, &mut |n| {
        if syn.import_kinds.contains(&n.kind()) {
            let raw = text(n, source).trim();
            if !raw.is_empty() {
                imports.push(normalize_import(raw, language));
            }
        }
    });
    imports
}

fn normalize_import(raw: &str, language: SupportedLanguage) -> String {
    match language {
        SupportedLanguage::TypeScript | SupportedLanguage::Tsx | SupportedLanguage::JavaScript => {
            raw.replace("import ", "").replace(['{', '}', ';'], "").trim().to_string()
        }
        SupportedLanguage::Python => raw
            .trim_start_matches("from ")
            .trim_start_matches("import ")
            .replace(" import ", ".")
            .trim()
            .to_string(),
        _ => raw.to_string(),
    }
}

fn extract_parameters(node: Node<'_>, source: &str) -> Vec<Parameter> {
    let Some(params_node) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut params = Vec::new();
    let mut cursor = params_node.walk();
    for child in params_node.children(&mut cursor) {
        if !child.is_named() {
            continue;
        }
        let name = child
            .child_by_field_name("name")
            .or_else(|| child.child_by_field_name("pattern"))
            .map(|n| text(n, source).to_string())
            .unwrap_or_else(|| text(child, source).to_string());
        if name.is_empty() {
            continue;
        }
        let type_hint = child
            .child_by_field_name("type")
            .map(|n| text(n, source).to_string());
        let default_value = child
            .child_by_field_name("value")
            .or_else(|| child.child_by_field_name("default_value"))
            .map(|n| text(n, source).to_string());
        params.push(Parameter {
            is_optional: default_value.is_some(),
            name,
            type_hint,
            default_value,
        });
    }
    params
}

fn extract_docstring(node: Node<'_>, source: &str, syn: &LanguageSyntax) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first_statement = body.children(&mut cursor).find(|c| c.is_named())?;
    let candidate = if first_statement.kind() == "expression_statement" {
        first_statement.named_child(0)?
    } else {
        first_statement
    };
    if syn.string_kinds.contains(&candidate.kind()) {
        Some(text(candidate, source).trim_matches(['"', '\'']).to_string())
    } else {
        None
    }
}

fn extract_decorators(node: Node<'_>, source: &str, syn: &LanguageSyntax) -> Vec<String> {
    let Some(kind) = syn.decorator_kind else { return Vec::new() };
    let mut decorators = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == kind {
            decorators.push(text(s, source).trim().to_string());
            sibling = s.prev_sibling();
        } else {
            break;
        }
    }
    decorators.reverse();
    decorators
}

fn is_async(node: Node<'_>, source: &str, syn: &LanguageSyntax) -> bool {
    match syn.async_marker {
        Some(marker) => {
            let mut cursor = node.walk();
            node.children(&mut cursor).any(|c| text(c, source) == marker)
        }
        None => false,
    }
}

/// Extracts everything `ChunkMetadata` can carry from a single chunk's AST
/// node. `lsp_type` is populated by the caller (the chunker already knows
/// the structural kind); this function leaves it untouched.
pub fn extract_metadata(node: Node<'_>, source: &str, language: SupportedLanguage) -> ChunkMetadata {
    let syn = syntax(language);
    let (calls, call_contexts) = extract_calls(node, source, language, &syn);
    let imports = extract_imports(node, source, language, &syn);
    let complexity = compute_complexity(node, source, &syn);
    let parameters = extract_parameters(node, source);
    let function_name = node
        .child_by_field_name("name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();
    let return_type = node
        .child_by_field_name("return_type")
        .or_else(|| node.child_by_field_name("type"))
        .map(|n| text(n, source).to_string());
    let is_async_fn = is_async(node, source, &syn);

    let signature = if !function_name.is_empty() || !parameters.is_empty() {
        Some(Signature {
            function_name,
            parameters,
            return_type,
            is_async: is_async_fn,
        })
    } else {
        None
    };

    ChunkMetadata {
        imports,
        calls,
        call_contexts,
        signature,
        complexity: Some(complexity),
        decorators: extract_decorators(node, source, &syn),
        docstring: extract_docstring(node, source, &syn),
        type_hints: HashMap::new(),
        is_async: is_async_fn,
        lsp_type: None,
        content_hash: None,
    }
}

pub fn lsp_type_for_chunk_type(chunk_type: crate::model::ChunkType) -> LspType {
    use crate::model::ChunkType::*;
    match chunk_type {
        Function => LspType::Function,
        Method => LspType::Method,
        Class => LspType::Class,
        Interface => LspType::Interface,
        Module | FallbackFixed => LspType::Module,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CodeParser;

    #[test]
    fn extracts_calls_and_complexity_from_python_function() {
        let source = "def f(x):\n    if x:\n        g(x)\n    return h()\n";
        let mut parser = CodeParser::new(SupportedLanguage::Python).unwrap();
        let tree = parser.parse(source).unwrap();
        let func = tree.root_node().named_child(0).unwrap();
        let meta = extract_metadata(func, source, SupportedLanguage::Python);
        assert!(meta.calls.contains(&"g".to_string()));
        assert!(meta.calls.contains(&"h".to_string()));
        assert_eq!(meta.complexity.unwrap().cyclomatic, 2);
    }

    #[test]
    fn conditional_call_context_is_flagged() {
        let source = "def f(x):\n    if x:\n        g(x)\n";
        let mut parser = CodeParser::new(SupportedLanguage::Python).unwrap();
        let tree = parser.parse(source).unwrap();
        let func = tree.root_node().named_child(0).unwrap();
        let meta = extract_metadata(func, source, SupportedLanguage::Python);
        let ctx = meta.call_contexts.iter().find(|c| c.call_name == "g").unwrap();
        assert!(ctx.is_conditional);
    }

    #[test]
    fn extracts_parameters_with_defaults() {
        let source = "def f(a, b=2):\n    pass\n";
        let mut parser = CodeParser::new(SupportedLanguage::Python).unwrap();
        let tree = parser.parse(source).unwrap();
        let func = tree.root_node().named_child(0).unwrap();
        let meta = extract_metadata(func, source, SupportedLanguage::Python);
        let sig = meta.signature.unwrap();
        assert_eq!(sig.parameters.len(), 2);
        assert!(sig.parameters[1].is_optional);
    }
}
