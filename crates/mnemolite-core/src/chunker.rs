//! Chunker (C3): splits a source file into semantic units.
//!
//! Contract: `chunk(source, language, path) -> [CodeChunk without embeddings]`.
//! Fails soft — parse errors and unsupported languages fall back to
//! fixed-size windows tagged `FALLBACK_FIXED`. Empty input is a hard
//! validation error.

use chrono::Utc;
use thiserror::Error;
use tree_sitter::Node;
use uuid::Uuid;

use crate::model::{ChunkMetadata, ChunkType, CodeChunk};
use crate::parser::{CodeParser, ParserError, SupportedLanguage};

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;

#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("source must be non-empty")]
    EmptySource,
}

/// One AST node kind this language treats as a chunk boundary, and the
/// `ChunkType` it produces when encountered outside a class/impl body.
struct ContainerKind {
    kind: &'static str,
    chunk_type: ChunkType,
    /// If true, a node of this kind nested inside another container becomes
    /// `Method` instead of its default `chunk_type`.
    demotable_to_method: bool,
}

fn container_kinds(language: SupportedLanguage) -> &'static [ContainerKind] {
    use SupportedLanguage::*;
    match language {
        Python => &[
            ContainerKind { kind: "function_definition", chunk_type: ChunkType::Function, demotable_to_method: true },
            ContainerKind { kind: "class_definition", chunk_type: ChunkType::Class, demotable_to_method: false },
        ],
        JavaScript => &[
            ContainerKind { kind: "function_declaration", chunk_type: ChunkType::Function, demotable_to_method: true },
            ContainerKind { kind: "method_definition", chunk_type: ChunkType::Method, demotable_to_method: false },
            ContainerKind { kind: "class_declaration", chunk_type: ChunkType::Class, demotable_to_method: false },
        ],
        TypeScript | Tsx => &[
            ContainerKind { kind: "function_declaration", chunk_type: ChunkType::Function, demotable_to_method: true },
            ContainerKind { kind: "method_definition", chunk_type: ChunkType::Method, demotable_to_method: false },
            ContainerKind { kind: "class_declaration", chunk_type: ChunkType::Class, demotable_to_method: false },
            ContainerKind { kind: "interface_declaration", chunk_type: ChunkType::Interface, demotable_to_method: false },
        ],
        Rust => &[
            ContainerKind { kind: "function_item", chunk_type: ChunkType::Function, demotable_to_method: true },
            ContainerKind { kind: "struct_item", chunk_type: ChunkType::Class, demotable_to_method: false },
            ContainerKind { kind: "enum_item", chunk_type: ChunkType::Class, demotable_to_method: false },
            ContainerKind { kind: "trait_item", chunk_type: ChunkType::Interface, demotable_to_method: false },
        ],
        Go => &[
            ContainerKind { kind: "function_declaration", chunk_type: ChunkType::Function, demotable_to_method: false },
            ContainerKind { kind: "method_declaration", chunk_type: ChunkType::Method, demotable_to_method: false },
            ContainerKind { kind: "type_declaration", chunk_type: ChunkType::Class, demotable_to_method: false },
        ],
        C => &[
            ContainerKind { kind: "function_definition", chunk_type: ChunkType::Function, demotable_to_method: false },
            ContainerKind { kind: "struct_specifier", chunk_type: ChunkType::Class, demotable_to_method: false },
        ],
        Cpp => &[
            ContainerKind { kind: "function_definition", chunk_type: ChunkType::Function, demotable_to_method: true },
            ContainerKind { kind: "class_specifier", chunk_type: ChunkType::Class, demotable_to_method: false },
            ContainerKind { kind: "struct_specifier", chunk_type: ChunkType::Class, demotable_to_method: false },
        ],
        CSharp => &[
            ContainerKind { kind: "method_declaration", chunk_type: ChunkType::Method, demotable_to_method: false },
            ContainerKind { kind: "class_declaration", chunk_type: ChunkType::Class, demotable_to_method: false },
            ContainerKind { kind: "interface_declaration", chunk_type: ChunkType::Interface, demotable_to_method: false },
        ],
    }
}

fn class_like_kinds(language: SupportedLanguage) -> &'static [&'static str] {
    use SupportedLanguage::*;
    match language {
        Python => &["class_definition"],
        JavaScript | TypeScript | Tsx => &["class_declaration", "class_body"],
        Rust => &["impl_item", "trait_item"],
        Go => &["type_declaration"],
        C | Cpp => &["class_specifier", "struct_specifier"],
        CSharp => &["class_declaration", "interface_declaration"],
    }
}

struct RawUnit<'a> {
    node: Node<'a>,
    chunk_type: ChunkType,
    name: Option<String>,
}

/// Walks the AST collecting chunk-boundary nodes. Recursion continues inside
/// a matched node so nested methods/classes are still found.
fn collect_units<'a>(
    node: Node<'a>,
    language: SupportedLanguage,
    inside_container_depth: usize,
    out: &mut Vec<RawUnit<'a>>,
) {
    let kinds = container_kinds(language);
    let classy = class_like_kinds(language);
    let kind = node.kind();

    if let Some(spec) = kinds.iter().find(|k| k.kind == kind) {
        let chunk_type = if spec.demotable_to_method && inside_container_depth > 0 {
            ChunkType::Method
        } else {
            spec.chunk_type
        };
        // Name text extraction needs `source`, which isn't available during
        // this structural walk; resolved later by `node_name`.
        out.push(RawUnit { node, chunk_type, name: None });
    }

    let next_depth = if classy.contains(&kind) { inside_container_depth + 1 } else { inside_container_depth };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_units(child, language, next_depth, out);
    }
}

fn node_name(node: Node<'_>, source: &str, index: usize, chunk_type: ChunkType) -> String {
    node.child_by_field_name("name")
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("{}_{}", chunk_type.as_str().to_lowercase(), index))
}

fn is_anonymous(name: &str) -> bool {
    matches!(name, "<anonymous>" | "" | "lambda" | "<lambda>") || name.starts_with("anonymous_")
}

fn new_chunk(
    repository: &str,
    file_path: &str,
    language: SupportedLanguage,
    chunk_type: ChunkType,
    name: String,
    source_code: String,
    start_line: u32,
    end_line: u32,
) -> CodeChunk {
    let now = Utc::now();
    CodeChunk {
        id: Uuid::new_v4(),
        repository: repository.to_string(),
        file_path: file_path.to_string(),
        language: language.as_str().to_string(),
        chunk_type,
        name_path: name.clone(),
        name,
        source_code,
        start_line,
        end_line,
        embedding_text: None,
        embedding_code: None,
        metadata: ChunkMetadata::default(),
        commit_hash: None,
        indexed_at: now,
        last_modified: now,
    }
}

/// Splits source into semantic units. `name_path` is left equal to `name`
/// here; the symbol-path service overwrites it with the fully qualified
/// form once file-relative context is known.
pub fn chunk(
    source: &str,
    language: SupportedLanguage,
    repository: &str,
    file_path: &str,
    max_chunk_size: usize,
) -> Result<Vec<CodeChunk>, ChunkerError> {
    if source.is_empty() {
        return Err(ChunkerError::EmptySource);
    }

    let parsed = CodeParser::new(language).and_then(|mut p| p.parse(source));
    let tree = match parsed {
        Ok(t) => t,
        Err(_) => {
            return Ok(fixed_window_chunks(source, repository, file_path, "unknown", max_chunk_size));
        }
    };

    let mut raw = Vec::new();
    collect_units(tree.root_node(), language, 0, &mut raw);

    if raw.is_empty() {
        let chunk = split_if_needed(
            new_chunk(
                repository,
                file_path,
                language,
                ChunkType::Module,
                module_name(file_path),
                source.to_string(),
                1,
                source.lines().count() as u32,
            ),
            max_chunk_size,
        );
        return Ok(chunk);
    }

    let mut chunks = Vec::new();
    for (idx, unit) in raw.into_iter().enumerate() {
        let name = unit.name.unwrap_or_else(|| node_name(unit.node, source, idx, unit.chunk_type));
        if is_anonymous(&name) {
            continue;
        }
        let text = unit
            .node
            .utf8_text(source.as_bytes())
            .unwrap_or_default()
            .to_string();
        let start_line = unit.node.start_position().row as u32 + 1;
        let end_line = unit.node.end_position().row as u32 + 1;
        let base = new_chunk(repository, file_path, language, unit.chunk_type, name, text, start_line, end_line);
        chunks.extend(split_if_needed(base, max_chunk_size));
    }

    Ok(chunks)
}

fn module_name(file_path: &str) -> String {
    std::path::Path::new(file_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("module")
        .to_string()
}

/// Splits an oversized chunk at blank-line structural boundaries when
/// possible, otherwise at fixed-size windows. Keeps the original
/// `chunk_type`; appends `_partN` to the name for parts after the first.
fn split_if_needed(unit: CodeChunk, max_chunk_size: usize) -> Vec<CodeChunk> {
    if unit.source_code.len() <= max_chunk_size {
        return vec![unit];
    }

    let lines: Vec<&str> = unit.source_code.lines().collect();
    let mut parts: Vec<(usize, usize)> = Vec::new(); // (start_line_idx, end_line_idx) inclusive, 0-based
    let mut window_start = 0usize;
    let mut window_len = 0usize;
    let mut last_blank: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        window_len += line.len() + 1;
        if line.trim().is_empty() {
            last_blank = Some(i);
        }
        if window_len >= max_chunk_size {
            let split_at = last_blank.filter(|b| *b > window_start).unwrap_or(i);
            parts.push((window_start, split_at));
            window_start = split_at + 1;
            window_len = 0;
            last_blank = None;
        }
    }
    if window_start < lines.len() {
        parts.push((window_start, lines.len() - 1));
    }

    parts
        .into_iter()
        .enumerate()
        .map(|(i, (s, e))| {
            let text = lines[s..=e.min(lines.len().saturating_sub(1))].join("\n");
            let name = if i == 0 { unit.name.clone() } else { format!("{}_part{}", unit.name, i + 1) };
            CodeChunk {
                id: Uuid::new_v4(),
                name_path: name.clone(),
                name,
                source_code: text,
                start_line: unit.start_line + s as u32,
                end_line: unit.start_line + e as u32,
                ..unit.clone()
            }
        })
        .collect()
}

/// Fallback chunker used on parse failure or an unsupported language: fixed
/// windows of `max_chunk_size` characters, tagged `FALLBACK_FIXED`.
pub fn fixed_window_chunks(
    source: &str,
    repository: &str,
    file_path: &str,
    language: &str,
    max_chunk_size: usize,
) -> Vec<CodeChunk> {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut acc_len = 0usize;
    let mut idx = 0usize;

    for (i, line) in lines.iter().enumerate() {
        acc_len += line.len() + 1;
        if acc_len >= max_chunk_size || i == lines.len() - 1 {
            let text = lines[start..=i].join("\n");
            let now = Utc::now();
            chunks.push(CodeChunk {
                id: Uuid::new_v4(),
                repository: repository.to_string(),
                file_path: file_path.to_string(),
                language: language.to_string(),
                chunk_type: ChunkType::FallbackFixed,
                name: format!("fallback_{}", idx),
                name_path: format!("fallback_{}", idx),
                source_code: text,
                start_line: start as u32 + 1,
                end_line: i as u32 + 1,
                embedding_text: None,
                embedding_code: None,
                metadata: ChunkMetadata::default(),
                commit_hash: None,
                indexed_at: now,
                last_modified: now,
            });
            start = i + 1;
            acc_len = 0;
            idx += 1;
        }
    }
    chunks
}

impl From<ParserError> for ChunkerError {
    fn from(_: ParserError) -> Self {
        ChunkerError::EmptySource
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_validation_error() {
        assert!(matches!(
            chunk("", SupportedLanguage::Python, "r", "f.py", DEFAULT_MAX_CHUNK_SIZE),
            Err(ChunkerError::EmptySource)
        ));
    }

    #[test]
    fn single_python_function_produces_one_chunk() {
        let source = "def add(a, b):\n    return a + b\n";
        let chunks = chunk(source, SupportedLanguage::Python, "R1", "f.py", DEFAULT_MAX_CHUNK_SIZE).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::Function);
        assert_eq!(chunks[0].name, "add");
    }

    #[test]
    fn method_inside_class_is_demoted() {
        let source = "class Foo:\n    def bar(self):\n        return 1\n";
        let chunks = chunk(source, SupportedLanguage::Python, "R1", "f.py", DEFAULT_MAX_CHUNK_SIZE).unwrap();
        let method = chunks.iter().find(|c| c.name == "bar").unwrap();
        assert_eq!(method.chunk_type, ChunkType::Method);
        let class = chunks.iter().find(|c| c.name == "Foo").unwrap();
        assert_eq!(class.chunk_type, ChunkType::Class);
    }

    #[test]
    fn unparseable_unsupported_language_falls_back_to_fixed_windows() {
        let source = "x".repeat(50);
        let chunks = fixed_window_chunks(&source, "R1", "f.xyz", "unknown", 20);
        assert!(chunks.iter().all(|c| c.chunk_type == ChunkType::FallbackFixed));
        assert!(chunks.len() > 1);
    }

    #[test]
    fn oversized_chunk_is_split() {
        let body = "    pass\n".repeat(400);
        let source = format!("def big():\n{body}");
        let chunks = chunk(&source, SupportedLanguage::Python, "R1", "f.py", DEFAULT_MAX_CHUNK_SIZE).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chunk_type == ChunkType::Function));
    }
}
