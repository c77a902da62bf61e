//! Line patterns and comment markers used by the heuristic scanner.

use crate::models::DeclarationKind;

/// Prefixes that mark a documentation comment.
pub const DOC_COMMENT_PREFIXES: &[&str] = &["///", "//!"];

/// Prefix of a plain single-line comment.
pub const LINE_COMMENT_PREFIX: &str = "//";

/// Marker that opens an example block.
pub const EXAMPLE_MARKER: &str = ">>>";

/// Marker that continues the code of an open example block.
pub const CONTINUATION_MARKER: &str = "...";

/// Ordered declaration patterns.
///
/// Each pattern is tried against a single line and the first match wins.
/// Containers and namespaces come before the callable patterns so that a
/// line such as `struct Point {` is never read as a call. Every pattern
/// captures the declared identifier as `name`; callable patterns also
/// capture the return type as `ret` so keyword-led statements can be
/// rejected.
pub const DECLARATION_PATTERNS: &[(&str, DeclarationKind)] = &[
    (
        r"^\s*template\s*<[^>]*>\s*(?:class|struct)\s+(?P<name>\w+)",
        DeclarationKind::ClassTemplate,
    ),
    (r"^\s*class\s+(?P<name>\w+)", DeclarationKind::Class),
    (r"^\s*struct\s+(?P<name>\w+)", DeclarationKind::Struct),
    (r"^\s*union\s+(?P<name>\w+)", DeclarationKind::Union),
    (r"^\s*namespace\s+(?P<name>\w+)", DeclarationKind::Namespace),
    (
        r"^\s*template\s*<[^>]*>\s*(?:(?:inline|static|constexpr|virtual|extern)\s+)*(?:const\s+)?(?:(?P<ret>[\w:<>]+)[\s*&]+)?(?P<name>\w+)\s*\([^)]*\)\s*(?:const)?\s*(?:override)?\s*(?:noexcept)?\s*[{;]",
        DeclarationKind::FunctionTemplate,
    ),
    (
        r"^\s*(?:(?:inline|static|constexpr|virtual|extern)\s+)*(?:const\s+)?(?:(?P<ret>[\w:<>]+)[\s*&]+)?(?P<name>\w+)\s*\([^)]*\)\s*(?:const)?\s*(?:override)?\s*(?:noexcept)?\s*[{;]",
        DeclarationKind::Function,
    ),
];

/// Words that look like a callable declaration but start a statement.
pub const NON_DECLARATION_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "return", "catch", "throw", "new",
    "delete", "sizeof", "alignof", "decltype", "typeid", "static_assert", "co_return",
];
