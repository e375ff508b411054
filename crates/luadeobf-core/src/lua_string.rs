//! Emitting decoded text as Lua string literals

use std::fmt::Write;

/// Wrap `text` in double quotes, escaping whatever would end or break the literal.
///
/// Control characters without a short escape use the three-digit decimal
/// form (`\007`) so a following digit is never absorbed into the escape.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
