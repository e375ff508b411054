//! Literal Resolution Pass
//!
//! Replaces byte-list string construction with the string it builds.
//!
//! ```lua
//! -- Before:
//! print(string.char(72, 73))
//! local p1 = {112, 114}
//!
//! -- After:
//! print("HI")
//! local p1_resolved = "pr"
//! ```
//!
//! The table form renames the local by appending [`RESOLVED_SUFFIX`]; later
//! references to the old name are left for the identifier renamer.
//!
//! Only non-empty integer lists match; a table may end in one trailing comma.
//! Empty tables and other shapes are left alone. Values that overflow or are
//! not Unicode scalar values are errors, not skipped matches.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{try_replace_all, TextPass, RESOLVED_SUFFIX};
use crate::error::{DeobfError, Result};
use crate::lua_string::quote;

static CHAR_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bstring\.char\(\s*([0-9]+(?:\s*,\s*[0-9]+)*)\s*\)").unwrap()
});

static BYTE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\blocal\s+(\w+)\s*=\s*\{\s*([0-9]+(?:\s*,\s*[0-9]+)*)\s*,?\s*\}").unwrap()
});

pub struct LiteralResolverPass;

impl Default for LiteralResolverPass {
    fn default() -> Self {
        Self::new()
    }
}

impl LiteralResolverPass {
    pub fn new() -> Self {
        Self
    }
}

impl TextPass for LiteralResolverPass {
    fn name(&self) -> &'static str {
        "literal-resolution"
    }

    fn run(&mut self, source: &str) -> Result<String> {
        resolve_literals(source)
    }
}

/// Resolve `string.char(...)` calls, then byte-table locals
pub fn resolve_literals(source: &str) -> Result<String> {
    let mut calls = 0usize;
    let text = try_replace_all(&CHAR_CALL_RE, source, |caps| {
        calls += 1;
        let decoded = decode_byte_list(&caps[1], &caps[0])?;
        Ok(Some(quote(&decoded)))
    })?;

    let mut tables = 0usize;
    let text = try_replace_all(&BYTE_TABLE_RE, &text, |caps| {
        tables += 1;
        let decoded = decode_byte_list(&caps[2], &caps[0])?;
        Ok(Some(format!(
            "local {}{} = {}",
            &caps[1],
            RESOLVED_SUFFIX,
            quote(&decoded)
        )))
    })?;

    if calls + tables > 0 {
        debug!(calls, tables, "resolved byte-list literals");
    }
    Ok(text)
}

fn decode_byte_list(list: &str, source_text: &str) -> Result<String> {
    list.split(',')
        .map(|entry| {
            let entry = entry.trim();
            let value: u32 = entry.parse().map_err(|_| DeobfError::InvalidByteList {
                entry: entry.to_string(),
                source_text: source_text.to_string(),
            })?;
            char::from_u32(value).ok_or(DeobfError::InvalidCodePoint { value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_call() {
        assert_eq!(resolve_literals("string.char(72,73)").unwrap(), "\"HI\"");
        assert_eq!(
            resolve_literals("print(string.char( 104, 105 ))").unwrap(),
            "print(\"hi\")"
        );
    }

    #[test]
    fn test_byte_table() {
        assert_eq!(
            resolve_literals("local p1 = {112,114}").unwrap(),
            "local p1_resolved = \"pr\""
        );
        assert_eq!(
            resolve_literals("local  key={ 65, 66,\n 67 }").unwrap(),
            "local key_resolved = \"ABC\""
        );
    }

    #[test]
    fn test_both_forms_in_one_source() {
        let source = "local a = {104,105}\nprint(string.char(33))";
        assert_eq!(
            resolve_literals(source).unwrap(),
            "local a_resolved = \"hi\"\nprint(\"!\")"
        );
    }

    #[test]
    fn test_non_matching_text_untouched() {
        let source = "local t = {a, b}\nstring.char(x)\nlocal u = {}";
        assert_eq!(resolve_literals(source).unwrap(), source);
        assert_eq!(resolve_literals("mystring.char(65)").unwrap(), "mystring.char(65)");
    }

    #[test]
    fn test_decoded_quotes_are_escaped() {
        assert_eq!(resolve_literals("string.char(34,10)").unwrap(), r#""\"\n""#);
    }

    #[test]
    fn test_unicode_code_points() {
        assert_eq!(resolve_literals("string.char(233)").unwrap(), "\"é\"");
    }

    #[test]
    fn test_out_of_range_code_point_is_error() {
        let err = resolve_literals("string.char(1114112)").unwrap_err();
        assert!(matches!(err, DeobfError::InvalidCodePoint { value: 1114112 }));

        let err = resolve_literals("local s = {55296}").unwrap_err();
        assert!(matches!(err, DeobfError::InvalidCodePoint { value: 55296 }));
    }

    #[test]
    fn test_trailing_comma_in_table() {
        assert_eq!(
            resolve_literals("local t = {65, 66, 67,}").unwrap(),
            "local t_resolved = \"ABC\""
        );
        assert_eq!(
            resolve_literals("local t = {\n  104,\n  105,\n}").unwrap(),
            "local t_resolved = \"hi\""
        );
    }

    #[test]
    fn test_empty_tables_untouched() {
        let source = "local t = { }\nlocal u = {\n}\nlocal v = {,}";
        assert_eq!(resolve_literals(source).unwrap(), source);
    }

    #[test]
    fn test_malformed_calls_untouched() {
        let source = "string.char(72,,73)\nstring.char(72,)\nstring.char( )";
        assert_eq!(resolve_literals(source).unwrap(), source);
    }

    #[test]
    fn test_overflowing_entry_is_error() {
        let err = resolve_literals("string.char(4294967296)").unwrap_err();
        assert!(matches!(
            err,
            DeobfError::InvalidByteList { ref entry, .. } if entry == "4294967296"
        ));
    }
}
