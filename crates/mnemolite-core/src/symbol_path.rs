//! Symbol-path service: computes `name_path` for a chunk
//! (`<module_path>.<parent_chain>.<name>`) and containment-based parent
//! chains.

use crate::parser::SupportedLanguage;

const KNOWN_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx", ".rs", ".go", ".c", ".h", ".cpp", ".hpp",
    ".cc", ".cxx", ".cs",
];

/// A containing class/struct/impl block, used to build `parent_chain`.
#[derive(Debug, Clone)]
pub struct ParentContext {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// `file_path` relative to the repository root, language prefix and
/// extension stripped, package-marker filenames dropped, separators
/// replaced by dots. Falls back to `"root"` when nothing remains.
pub fn file_to_module_path(file_path: &str, language: SupportedLanguage) -> String {
    let normalized = file_path.replace('\\', "/");
    let without_ext = strip_known_extension(&normalized);

    let mut parts: Vec<&str> = without_ext.split('/').filter(|p| !p.is_empty()).collect();

    for prefix in language.stripped_prefixes() {
        if parts.first() == Some(prefix) {
            parts.remove(0);
        }
    }

    if let Some(last) = parts.last() {
        if language.package_markers().contains(last) {
            parts.pop();
        }
    }

    if parts.is_empty() {
        "root".to_string()
    } else {
        parts.join(".")
    }
}

fn strip_known_extension(path: &str) -> &str {
    for ext in KNOWN_EXTENSIONS {
        if let Some(stripped) = path.strip_suffix(ext) {
            return stripped;
        }
    }
    path
}

/// Orders containing classes outermost -> innermost by line-range size
/// (the outermost container has the largest range). Overlapping
/// (non-nested) parents are tolerated and simply sorted by range size;
/// callers should log a warning if ranges overlap without nesting.
pub fn extract_parent_context(mut parents: Vec<ParentContext>) -> Vec<ParentContext> {
    parents.sort_by(|a, b| {
        let a_size = a.end_line.saturating_sub(a.start_line);
        let b_size = b.end_line.saturating_sub(b.start_line);
        b_size.cmp(&a_size)
    });
    parents
}

pub fn parents_overlap_without_nesting(parents: &[ParentContext]) -> bool {
    for i in 0..parents.len() {
        for j in (i + 1)..parents.len() {
            let (a, b) = (&parents[i], &parents[j]);
            let nested = (a.start_line <= b.start_line && a.end_line >= b.end_line)
                || (b.start_line <= a.start_line && b.end_line >= a.end_line);
            let disjoint = a.end_line < b.start_line || b.end_line < a.start_line;
            if !nested && !disjoint {
                return true;
            }
        }
    }
    false
}

/// `<module_path>.<parent1>.<parent2>....<name>`.
pub fn generate_name_path(
    name: &str,
    file_path: &str,
    language: SupportedLanguage,
    parent_context: &[ParentContext],
) -> String {
    let module_path = file_to_module_path(file_path, language);
    let ordered_parents = extract_parent_context(parent_context.to_vec());

    let mut segments = vec![module_path];
    segments.extend(ordered_parents.into_iter().map(|p| p.name));
    segments.push(name.to_string());
    segments.join(".")
}

/// A query containing `.` is treated as qualified and matched against
/// `name_path` as well as bare `name`.
pub fn is_qualified_query(query: &str) -> bool {
    query.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_python_api_prefix_and_extension() {
        let path = file_to_module_path("api/services/search.py", SupportedLanguage::Python);
        assert_eq!(path, "services.search");
    }

    #[test]
    fn drops_init_package_marker() {
        let path = file_to_module_path("api/services/__init__.py", SupportedLanguage::Python);
        assert_eq!(path, "services");
    }

    #[test]
    fn empty_path_falls_back_to_root() {
        let path = file_to_module_path("api/__init__.py", SupportedLanguage::Python);
        assert_eq!(path, "root");
    }

    #[test]
    fn parent_context_orders_outermost_first() {
        let parents = vec![
            ParentContext { name: "Inner".into(), start_line: 10, end_line: 20 },
            ParentContext { name: "Outer".into(), start_line: 1, end_line: 100 },
        ];
        let ordered = extract_parent_context(parents);
        assert_eq!(ordered[0].name, "Outer");
        assert_eq!(ordered[1].name, "Inner");
    }

    #[test]
    fn name_path_ends_with_dot_name() {
        let path = generate_name_path(
            "bar",
            "src/models/user.ts",
            SupportedLanguage::TypeScript,
            &[ParentContext { name: "User".into(), start_line: 1, end_line: 50 }],
        );
        assert_eq!(path, "models.user.User.bar");
    }

    #[test]
    fn qualified_query_detection() {
        assert!(is_qualified_query("models.user.User"));
        assert!(!is_qualified_query("User"));
    }

    #[test]
    fn detects_overlap_without_nesting() {
        let parents = vec![
            ParentContext { name: "A".into(), start_line: 1, end_line: 10 },
            ParentContext { name: "B".into(), start_line: 5, end_line: 15 },
        ];
        assert!(parents_overlap_without_nesting(&parents));
    }
}
