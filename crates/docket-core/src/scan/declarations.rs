//! Pattern-table scanner for structural declarations.

use regex::Regex;

use super::patterns::{
    DECLARATION_PATTERNS, DOC_COMMENT_PREFIXES, LINE_COMMENT_PREFIX, NON_DECLARATION_KEYWORDS,
};
use super::DeclarationProvider;
use crate::models::{Declaration, DeclarationKind, SourceLocation};

/// Line-based declaration scanner.
///
/// Tries [`DECLARATION_PATTERNS`] against every line and keeps the first
/// match. No syntax tree is built, so false positives (a call statement that
/// looks like a prototype) and misses (multi-line signatures) are expected.
pub struct HeuristicScanner {
    patterns: Vec<(Regex, DeclarationKind)>,
}

impl HeuristicScanner {
    /// Create a scanner with the built-in pattern table.
    pub fn new() -> Self {
        let patterns = DECLARATION_PATTERNS
            .iter()
            .filter_map(|(pattern, kind)| match Regex::new(pattern) {
                Ok(re) => Some((re, *kind)),
                Err(e) => {
                    tracing::warn!(
                        pattern = %pattern,
                        error = %e,
                        "skipping declaration pattern"
                    );
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    /// Match one line against the pattern table.
    fn match_line(&self, line: &str) -> Option<(String, DeclarationKind, u32)> {
        for (re, kind) in &self.patterns {
            let Some(cap) = re.captures(line) else {
                continue;
            };
            let Some(name) = cap.name("name") else {
                continue;
            };

            if kind.is_callable() {
                let ret = cap.name("ret").map(|m| m.as_str()).unwrap_or("");
                if NON_DECLARATION_KEYWORDS.contains(&name.as_str())
                    || NON_DECLARATION_KEYWORDS.contains(&ret)
                {
                    // A statement, not a declaration; nothing later in the
                    // table can match it either.
                    return None;
                }
            }

            let column = line[..name.start()].chars().count() as u32 + 1;
            return Some((name.as_str().to_string(), *kind, column));
        }
        None
    }
}

impl Default for HeuristicScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationProvider for HeuristicScanner {
    fn declarations(&self, path: &str, lines: &[&str]) -> Vec<Declaration> {
        let mut declarations = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let Some((name, kind, column)) = self.match_line(line) else {
                continue;
            };

            let location = SourceLocation::new(path, index as u32 + 1, column);
            let mut decl = Declaration::new(name, kind, location);
            decl.comment = extract_comment(lines, index);
            declarations.push(decl);
        }

        declarations
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Text of a single-line comment, without its marker.
///
/// Returns `None` when the line is not a comment.
pub(crate) fn comment_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    for prefix in DOC_COMMENT_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return Some(rest.trim());
        }
    }
    trimmed.strip_prefix(LINE_COMMENT_PREFIX).map(str::trim)
}

/// Collect the comment attached to the declaration on `decl_index`.
///
/// Walks upward over the run of comment lines above the declaration.
/// Blank lines are skipped until the first comment is found and end the run
/// after that; a code line always ends it. Without such a run, a comment on
/// the line right after the declaration is used instead.
fn extract_comment(lines: &[&str], decl_index: usize) -> Option<String> {
    let mut collected = Vec::new();

    for line in lines[..decl_index].iter().rev() {
        if line.trim().is_empty() {
            if collected.is_empty() {
                continue;
            }
            break;
        }
        match comment_text(line) {
            Some(text) => collected.push(text),
            None => break,
        }
    }

    if collected.is_empty() {
        return lines
            .get(decl_index + 1)
            .and_then(|next| comment_text(next))
            .map(str::to_string);
    }

    collected.reverse();
    Some(collected.join("\n"))
}
