//! The compilation sandbox boundary: an explicit allow-list of importable
//! namespaces and referenced libraries.
//!
//! This table IS the sandbox. It is hand-maintained static data -- never
//! computed by scanning installed packages -- so the boundary stays
//! auditable in review. Import directives outside the list are rejected
//! before the compiler collaborator ever sees the source.

use skillforge_types::error::CompilationError;

/// Error id reported for a disallowed import directive.
const DISALLOWED_IMPORT: &str = "SF0401";

/// Namespaces skill code may import, exact match per directive.
///
/// Keep sorted. Adding an entry widens the sandbox for every organization;
/// treat changes like a security review.
pub const ALLOWED_NAMESPACES: &[&str] = &[
    "NodaTime",
    "System",
    "System.Collections",
    "System.Collections.Generic",
    "System.Dynamic",
    "System.Globalization",
    "System.Linq",
    "System.Net.Http",
    "System.Text",
    "System.Text.Json",
    "System.Text.RegularExpressions",
    "System.Threading.Tasks",
];

/// Libraries every compilation references, by package name.
pub const REFERENCED_LIBRARIES: &[&str] = &[
    "NodaTime",
    "System.Linq.Async",
    "System.Text.Json",
];

/// Whether a namespace may be imported by skill code.
pub fn is_namespace_allowed(namespace: &str) -> bool {
    ALLOWED_NAMESPACES.binary_search(&namespace).is_ok()
}

/// Screen the source's import directives against the allow-list.
///
/// Returns one [`CompilationError`] per offending directive, with the line
/// it appeared on. An empty result means the source may be handed to the
/// compiler.
pub fn validate_imports(source: &str) -> Vec<CompilationError> {
    let mut errors = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let Some(namespace) = import_directive(line) else {
            continue;
        };
        if is_namespace_allowed(namespace) {
            continue;
        }

        let line_number = (index + 1) as u32;
        errors.push(CompilationError {
            error_id: DISALLOWED_IMPORT.to_string(),
            description: format!("namespace '{namespace}' is not available to skills"),
            line_start: line_number,
            line_end: line_number,
            span_start: 0,
            span_end: line.len() as u32,
        });
    }

    errors
}

/// Extract the namespace from an import directive, if the line is one.
///
/// Recognizes `using Ns;`, `using static Ns.Type;`, and the alias form
/// `using X = Ns;` (the right-hand side is what gets screened). Returns
/// `None` for `using` *statements* (resource scopes) and ordinary code.
fn import_directive(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix("using ")?.strip_suffix(';')?.trim();

    let target = if let Some(stat) = rest.strip_prefix("static ") {
        // `using static Ns.Type;` imports the type's namespace.
        stat.trim().rsplit_once('.').map(|(ns, _)| ns)?
    } else if let Some((_, aliased)) = rest.split_once('=') {
        aliased.trim()
    } else {
        rest
    };

    // A resource-scope statement (`using var x = ...;`) or anything else
    // that is not a dotted identifier is not an import.
    let looks_like_namespace = !target.is_empty()
        && target
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
    looks_like_namespace.then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_namespaces_table_is_sorted() {
        let mut sorted = ALLOWED_NAMESPACES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, ALLOWED_NAMESPACES, "keep the table sorted for binary_search");
    }

    #[test]
    fn permitted_imports_pass() {
        let source = "using System;\nusing System.Linq;\n\nReply(\"hi\");";
        assert!(validate_imports(source).is_empty());
    }

    #[test]
    fn disallowed_import_reports_line() {
        let source = "using System;\nusing System.IO;\nReply(\"hi\");";
        let errors = validate_imports(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_id, "SF0401");
        assert_eq!(errors[0].line_start, 2);
        assert!(errors[0].description.contains("System.IO"));
    }

    #[test]
    fn reflection_is_not_importable() {
        let errors = validate_imports("using System.Reflection;");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn static_and_alias_forms_are_screened() {
        assert!(validate_imports("using static System.Linq.Enumerable;").is_empty());
        assert_eq!(validate_imports("using static System.IO.File;").len(), 1);
        assert!(validate_imports("using Json = System.Text.Json;").is_empty());
        assert_eq!(validate_imports("using IO = System.IO;").len(), 1);
    }

    #[test]
    fn using_statements_are_not_imports() {
        // Resource scope, not an import directive.
        assert!(validate_imports("using var client = MakeClient();").is_empty());
    }
}
