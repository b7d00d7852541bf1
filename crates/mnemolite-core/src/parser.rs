//! Tree-sitter parsing: language detection and AST construction.
//!
//! ## Supported languages
//!
//! Python, JavaScript, TypeScript/TSX, Rust, Go, C, C++, C#.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use thiserror::Error;
use tree_sitter::{Language, Parser, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedLanguage {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    C,
    Cpp,
    CSharp,
}

impl SupportedLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedLanguage::Python => "python",
            SupportedLanguage::JavaScript => "javascript",
            SupportedLanguage::TypeScript => "typescript",
            SupportedLanguage::Tsx => "tsx",
            SupportedLanguage::Rust => "rust",
            SupportedLanguage::Go => "go",
            SupportedLanguage::C => "c",
            SupportedLanguage::Cpp => "cpp",
            SupportedLanguage::CSharp => "csharp",
        }
    }

    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SupportedLanguage::Python => tree_sitter_python::LANGUAGE.into(),
            SupportedLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SupportedLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SupportedLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SupportedLanguage::Rust => tree_sitter_rust::LANGUAGE.into(),
            SupportedLanguage::Go => tree_sitter_go::LANGUAGE.into(),
            SupportedLanguage::C => tree_sitter_c::LANGUAGE.into(),
            SupportedLanguage::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            SupportedLanguage::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        extension_map().get(ext.to_lowercase().as_str()).copied()
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
    }

    /// Language-specific path-prefix fragments stripped when computing
    /// `module_path` (see `symbol_path`).
    pub fn stripped_prefixes(&self) -> &'static [&'static str] {
        match self {
            SupportedLanguage::Python => &["api", "src"],
            SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => &["src"],
            SupportedLanguage::Go => &["pkg"],
            SupportedLanguage::CSharp => &["src"],
            SupportedLanguage::Rust => &["src"],
            SupportedLanguage::C | SupportedLanguage::Cpp => &["src"],
        }
    }

    pub fn package_markers(&self) -> &'static [&'static str] {
        match self {
            SupportedLanguage::Python => &["__init__"],
            SupportedLanguage::JavaScript | SupportedLanguage::TypeScript | SupportedLanguage::Tsx => &["index"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static EXTENSION_MAP: OnceLock<HashMap<&'static str, SupportedLanguage>> = OnceLock::new();

fn extension_map() -> &'static HashMap<&'static str, SupportedLanguage> {
    EXTENSION_MAP.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert("py", SupportedLanguage::Python);
        map.insert("js", SupportedLanguage::JavaScript);
        map.insert("mjs", SupportedLanguage::JavaScript);
        map.insert("cjs", SupportedLanguage::JavaScript);
        map.insert("jsx", SupportedLanguage::JavaScript);
        map.insert("ts", SupportedLanguage::TypeScript);
        map.insert("tsx", SupportedLanguage::Tsx);
        map.insert("rs", SupportedLanguage::Rust);
        map.insert("go", SupportedLanguage::Go);
        map.insert("c", SupportedLanguage::C);
        map.insert("h", SupportedLanguage::C);
        map.insert("cpp", SupportedLanguage::Cpp);
        map.insert("hpp", SupportedLanguage::Cpp);
        map.insert("cc", SupportedLanguage::Cpp);
        map.insert("cxx", SupportedLanguage::Cpp);
        map.insert("cs", SupportedLanguage::CSharp);
        map
    })
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("failed to set tree-sitter language: {0}")]
    LanguageSetup(String),
    #[error("source produced no parse tree")]
    EmptyTree,
    #[error("source must be non-empty")]
    EmptySource,
}

/// Thin wrapper over `tree_sitter::Parser` bound to one language.
pub struct CodeParser {
    parser: Parser,
    language: SupportedLanguage,
}

impl CodeParser {
    pub fn new(language: SupportedLanguage) -> Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.tree_sitter_language())
            .map_err(|e| ParserError::LanguageSetup(e.to_string()))?;
        Ok(Self { parser, language })
    }

    pub fn for_path(path: &Path) -> Result<Self, ParserError> {
        let language = SupportedLanguage::from_path(path)
            .ok_or_else(|| ParserError::UnsupportedLanguage(path.display().to_string()))?;
        Self::new(language)
    }

    pub fn language(&self) -> SupportedLanguage {
        self.language
    }

    pub fn parse(&mut self, source: &str) -> Result<Tree, ParserError> {
        if source.is_empty() {
            return Err(ParserError::EmptySource);
        }
        self.parser.parse(source, None).ok_or(ParserError::EmptyTree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_language_from_extension() {
        assert_eq!(SupportedLanguage::from_extension("py"), Some(SupportedLanguage::Python));
        assert_eq!(SupportedLanguage::from_extension("TSX"), Some(SupportedLanguage::Tsx));
        assert_eq!(SupportedLanguage::from_extension("xyz"), None);
    }

    #[test]
    fn parses_simple_python_source() {
        let mut parser = CodeParser::new(SupportedLanguage::Python).unwrap();
        let tree = parser.parse("def add(a, b):\n    return a + b\n").unwrap();
        assert_eq!(tree.root_node().kind(), "module");
    }

    #[test]
    fn rejects_empty_source() {
        let mut parser = CodeParser::new(SupportedLanguage::Python).unwrap();
        assert!(matches!(parser.parse(""), Err(ParserError::EmptySource)));
    }
}
