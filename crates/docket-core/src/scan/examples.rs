//! Example block extraction.

use super::declarations::comment_text;
use super::patterns::{CONTINUATION_MARKER, EXAMPLE_MARKER};
use crate::models::{Example, SourceLocation};

/// An example block that has not been closed yet.
struct OpenBlock<'a> {
    code: Vec<&'a str>,
    output: Vec<&'a str>,
    line: u32,
    column: u32,
}

impl OpenBlock<'_> {
    fn close(mut self, path: &str) -> Example {
        while self.output.last().is_some_and(|line| line.is_empty()) {
            self.output.pop();
        }
        Example {
            code: self.code.join("\n"),
            expected_output: if self.output.is_empty() {
                None
            } else {
                Some(self.output.join("\n"))
            },
            location: SourceLocation::new(path, self.line, self.column),
            parent: None,
        }
    }
}

/// Extract example blocks from the lines of one source unit.
///
/// A comment whose text starts with `>>>` opens a block. While it is open,
/// comment lines starting with `...` add code and every other comment line
/// adds expected output. Empty comment lines inside the output are kept,
/// trailing ones are dropped. A blank line, a code line, or the next `>>>`
/// closes it. Returned examples have no parent yet.
pub fn extract_examples(path: &str, lines: &[&str]) -> Vec<Example> {
    let mut examples = Vec::new();
    let mut current: Option<OpenBlock> = None;

    for (index, line) in lines.iter().enumerate() {
        let Some(text) = comment_text(line) else {
            if let Some(block) = current.take() {
                examples.push(block.close(path));
            }
            continue;
        };

        if let Some(first) = text.strip_prefix(EXAMPLE_MARKER) {
            if let Some(block) = current.take() {
                examples.push(block.close(path));
            }
            let column = line.find(EXAMPLE_MARKER).unwrap_or(0) as u32 + 1;
            current = Some(OpenBlock {
                code: vec![first.trim()],
                output: Vec::new(),
                line: index as u32 + 1,
                column,
            });
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };

        if let Some(more) = text.strip_prefix(CONTINUATION_MARKER) {
            block.code.push(more.trim());
        } else {
            block.output.push(text);
        }
    }

    if let Some(block) = current.take() {
        examples.push(block.close(path));
    }

    examples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(code: &str) -> Vec<Example> {
        let lines: Vec<&str> = code.lines().collect();
        extract_examples("test.cpp", &lines)
    }

    #[test]
    fn test_single_line_example() {
        let examples = extract("/// >>> add(2, 3)\n/// 5\nint add(int a, int b);\n");
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].code, "add(2, 3)");
        assert_eq!(examples[0].expected_output.as_deref(), Some("5"));
        assert_eq!(examples[0].location.line, 1);
    }

    #[test]
    fn test_continuation_lines() {
        let code = "/// >>> int x = 5;\n/// ... int y = 10;\n/// ... add(x, y)\n/// 15\n";
        let examples = extract(code);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].code, "int x = 5;\nint y = 10;\nadd(x, y)");
        assert_eq!(examples[0].expected_output.as_deref(), Some("15"));
    }

    #[test]
    fn test_no_expected_output() {
        let examples = extract("/// >>> printMessage(\"Hello\")\nvoid printMessage(const char* msg) {\n");
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].code, "printMessage(\"Hello\")");
        assert!(examples[0].expected_output.is_none());
    }

    #[test]
    fn test_marker_opens_next_block() {
        let code = "/// >>> f(1)\n/// 1\n/// >>> f(2)\n/// 2\n";
        let examples = extract(code);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].code, "f(2)");
        assert_eq!(examples[1].expected_output.as_deref(), Some("2"));
        assert_eq!(examples[1].location.line, 3);
    }

    #[test]
    fn test_blank_line_closes_block() {
        let code = "// >>> f()\n\n/// not output\n";
        let examples = extract(code);
        assert_eq!(examples.len(), 1);
        assert!(examples[0].expected_output.is_none());
    }

    #[test]
    fn test_multi_line_output() {
        let code = "    /// >>> show()\n    /// a\n    /// b\n";
        let examples = extract(code);
        assert_eq!(examples[0].expected_output.as_deref(), Some("a\nb"));
        assert_eq!(examples[0].location.column, 9);
    }

    #[test]
    fn test_empty_comment_line_in_output() {
        let code = "/// >>> banner()\n/// top\n///\n/// bottom\n///\nvoid banner();\n";
        let examples = extract(code);
        assert_eq!(examples[0].expected_output.as_deref(), Some("top\n\nbottom"));
    }

    #[test]
    fn test_only_empty_comment_lines_mean_no_output() {
        let examples = extract("/// >>> f()\n///\nint f();\n");
        assert!(examples[0].expected_output.is_none());
    }

    #[test]
    fn test_plain_comments_are_ignored_outside_blocks() {
        assert!(extract("// just a note\n/// docs\nint x;\n").is_empty());
    }
}
