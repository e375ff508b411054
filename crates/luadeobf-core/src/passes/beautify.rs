//! Layout Beautifier Pass
//!
//! Re-indents each line from a single running indent level. Lines starting
//! with a block-closing keyword dedent before they are emitted; lines
//! starting with a block-opening keyword indent the lines after them.
//!
//! Matching is by prefix on the trimmed line, so `format(x)` counts as a
//! `for` line and a one-line `if ... end` still indents what follows.

use super::TextPass;
use crate::error::Result;

const INDENT_KEYWORDS: &[&str] = &[
    "function",
    "local function",
    "if",
    "else",
    "elseif",
    "for",
    "while",
    "do",
    "repeat",
];

const OUTDENT_KEYWORDS: &[&str] = &["end", "else", "elseif", "until"];

pub const DEFAULT_INDENT_WIDTH: usize = 4;

pub struct BeautifyPass {
    indent_width: usize,
}

impl Default for BeautifyPass {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT_WIDTH)
    }
}

impl BeautifyPass {
    pub fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }
}

impl TextPass for BeautifyPass {
    fn name(&self) -> &'static str {
        "beautify"
    }

    fn run(&mut self, source: &str) -> Result<String> {
        Ok(beautify(source, self.indent_width))
    }
}

/// Re-indent `source` with `indent_width` spaces per level.
///
/// Every emitted line, blank ones included, ends in `\n`.
pub fn beautify(source: &str, indent_width: usize) -> String {
    let unit = " ".repeat(indent_width);
    let mut level = 0usize;
    let mut out = String::with_capacity(source.len());

    for line in source.lines() {
        let stripped = line.trim();
        if starts_with_any(stripped, OUTDENT_KEYWORDS) {
            level = level.saturating_sub(1);
        }
        if !stripped.is_empty() {
            out.push_str(&unit.repeat(level));
            out.push_str(stripped);
        }
        out.push('\n');
        if starts_with_any(stripped, INDENT_KEYWORDS) {
            level += 1;
        }
    }

    out
}

fn starts_with_any(line: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| line.starts_with(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pretty(source: &str) -> String {
        beautify(source, DEFAULT_INDENT_WIDTH)
    }

    #[test]
    fn test_function_body_indented() {
        assert_eq!(
            pretty("function f()\nreturn 1\nend"),
            "function f()\n    return 1\nend\n"
        );
    }

    #[test]
    fn test_existing_indentation_replaced() {
        assert_eq!(
            pretty("   if x then\n\t\t\tprint(x)\n        end"),
            "if x then\n    print(x)\nend\n"
        );
    }

    #[test]
    fn test_else_branches() {
        assert_eq!(
            pretty("if a then\nx()\nelseif b then\ny()\nelse\nz()\nend"),
            "if a then\n    x()\nelseif b then\n    y()\nelse\n    z()\nend\n"
        );
    }

    #[test]
    fn test_nested_blocks() {
        assert_eq!(
            pretty("local function g()\nfor i = 1, 3 do\nprint(i)\nend\nend"),
            "local function g()\n    for i = 1, 3 do\n        print(i)\n    end\nend\n"
        );
    }

    #[test]
    fn test_repeat_until() {
        assert_eq!(
            pretty("repeat\nn = n - 1\nuntil n == 0"),
            "repeat\n    n = n - 1\nuntil n == 0\n"
        );
    }

    #[test]
    fn test_blank_lines_have_no_indent() {
        assert_eq!(
            pretty("function f()\n\n   \nreturn\nend"),
            "function f()\n\n\n    return\nend\n"
        );
    }

    #[test]
    fn test_unbalanced_end_floors_at_zero() {
        assert_eq!(pretty("end\nend\nprint(1)"), "end\nend\nprint(1)\n");
    }

    #[test]
    fn test_custom_width() {
        assert_eq!(
            beautify("while true do\nbreak\nend", 2),
            "while true do\n  break\nend\n"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(pretty(""), "");
    }
}
