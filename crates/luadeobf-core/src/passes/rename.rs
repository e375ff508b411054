//! Identifier Renaming Pass
//!
//! Replaces obfuscated local and function names with sequential synthetic
//! names. Locals become `deobf_var_<n>` and functions `deobf_func_<n>`, each
//! counter starting at 1 in order of first declaration.
//!
//! There is no scope analysis: every whole-word occurrence of a collected
//! name is renamed, except where it follows a member-access operator
//! (`obj.name`, `obj:name`). Names ending in [`RESOLVED_SUFFIX`] are kept.
//!
//! Function names are collected after locals have been renamed, so a name
//! declared both ways ends up as a function name.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rustc_hash::FxBuildHasher;
use tracing::debug;

use super::{TextPass, RESOLVED_SUFFIX};
use crate::error::Result;

pub const VAR_PREFIX: &str = "deobf_var_";
pub const FUNC_PREFIX: &str = "deobf_func_";

static LOCAL_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\blocal\s+(\w+(?:\s*,\s*\w+)*)").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

static FUNCTION_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\s+(\w+)\s*\(").unwrap());

const LUA_KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Original name -> synthetic name, in declaration order
type RenameMap = IndexMap<String, String, FxBuildHasher>;

pub struct IdentifierRenamePass;

impl Default for IdentifierRenamePass {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierRenamePass {
    pub fn new() -> Self {
        Self
    }
}

impl TextPass for IdentifierRenamePass {
    fn name(&self) -> &'static str {
        "identifier-rename"
    }

    fn run(&mut self, source: &str) -> Result<String> {
        rename_identifiers(source)
    }
}

pub fn rename_identifiers(source: &str) -> Result<String> {
    let var_map = collect_locals(source);
    let text = apply_renames(source, &var_map);

    let func_map = collect_functions(&text);
    let text = apply_renames(&text, &func_map);

    debug!(
        variables = var_map.len(),
        functions = func_map.len(),
        "renamed identifiers"
    );
    Ok(text)
}

fn collect_locals(source: &str) -> RenameMap {
    let mut map = RenameMap::default();
    for caps in LOCAL_DECL_RE.captures_iter(source) {
        for name in caps[1].split(',').map(str::trim) {
            if is_keyword(name) || name.ends_with(RESOLVED_SUFFIX) || map.contains_key(name) {
                continue;
            }
            let synthetic = format!("{}{}", VAR_PREFIX, map.len() + 1);
            map.insert(name.to_string(), synthetic);
        }
    }
    map
}

fn collect_functions(source: &str) -> RenameMap {
    let mut map = RenameMap::default();
    for caps in FUNCTION_DECL_RE.captures_iter(source) {
        let name = &caps[1];
        if is_keyword(name) || map.contains_key(name) {
            continue;
        }
        let synthetic = format!("{}{}", FUNC_PREFIX, map.len() + 1);
        map.insert(name.to_string(), synthetic);
    }
    map
}

fn is_keyword(name: &str) -> bool {
    LUA_KEYWORDS.contains(&name)
}

/// Substitute every whole-word, non-member occurrence in a single scan
fn apply_renames(source: &str, map: &RenameMap) -> String {
    if map.is_empty() {
        return source.to_string();
    }

    WORD_RE
        .replace_all(source, |caps: &Captures<'_>| {
            let word = &caps[0];
            let start = caps.get(0).map_or(0, |m| m.start());
            match map.get(word) {
                Some(synthetic) if !is_member_access(&source[..start]) => synthetic.clone(),
                _ => word.to_string(),
            }
        })
        .into_owned()
}

/// True when `before` ends in `.` or `:` that is not part of `..` or `::`
fn is_member_access(before: &str) -> bool {
    let mut tail = before.chars().rev();
    match (tail.next(), tail.next()) {
        (Some('.'), prev) => prev != Some('.'),
        (Some(':'), prev) => prev != Some(':'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename(source: &str) -> String {
        rename_identifiers(source).unwrap()
    }

    #[test]
    fn test_locals_numbered_in_declaration_order() {
        assert_eq!(
            rename("local foo = 1\nlocal bar = foo + 1\nprint(foo, bar)"),
            "local deobf_var_1 = 1\nlocal deobf_var_2 = deobf_var_1 + 1\nprint(deobf_var_1, deobf_var_2)"
        );
    }

    #[test]
    fn test_member_access_not_renamed() {
        assert_eq!(
            rename("local foo = {}\nobj.foo = foo\nobj:foo()"),
            "local deobf_var_1 = {}\nobj.foo = deobf_var_1\nobj:foo()"
        );
    }

    #[test]
    fn test_concatenation_is_not_member_access() {
        assert_eq!(
            rename("local a = \"x\"\nlocal b = a..a"),
            "local deobf_var_1 = \"x\"\nlocal deobf_var_2 = deobf_var_1..deobf_var_1"
        );
    }

    #[test]
    fn test_whole_words_only() {
        assert_eq!(
            rename("local x = 1\nlocal xy = x\nprint(xy)"),
            "local deobf_var_1 = 1\nlocal deobf_var_2 = deobf_var_1\nprint(deobf_var_2)"
        );
    }

    #[test]
    fn test_resolved_names_kept() {
        assert_eq!(
            rename("local t_resolved = \"AB\"\nlocal k = t_resolved"),
            "local t_resolved = \"AB\"\nlocal deobf_var_1 = t_resolved"
        );
    }

    #[test]
    fn test_redeclaration_keeps_first_number() {
        assert_eq!(
            rename("local a = 1\nlocal b = 2\nlocal a = 3"),
            "local deobf_var_1 = 1\nlocal deobf_var_2 = 2\nlocal deobf_var_1 = 3"
        );
    }

    #[test]
    fn test_name_lists() {
        assert_eq!(
            rename("local a, b = 1, 2\nreturn b"),
            "local deobf_var_1, deobf_var_2 = 1, 2\nreturn deobf_var_2"
        );
    }

    #[test]
    fn test_functions_numbered_separately() {
        assert_eq!(
            rename("local v = 1\nfunction f(x)\nreturn x\nend\nlocal function g()\nend\nf(v)\ng()"),
            "local deobf_var_1 = 1\nfunction deobf_func_1(x)\nreturn x\nend\nlocal function deobf_func_2()\nend\ndeobf_func_1(deobf_var_1)\ndeobf_func_2()"
        );
    }

    #[test]
    fn test_function_member_access_not_renamed() {
        assert_eq!(
            rename("function run()\nend\nrun()\nmodule.run()"),
            "function deobf_func_1()\nend\ndeobf_func_1()\nmodule.run()"
        );
    }

    #[test]
    fn test_field_functions_not_collected() {
        let source = "function M.helper()\nend\nfunction M:method()\nend";
        assert_eq!(rename(source), source);
    }

    #[test]
    fn test_no_declarations_is_noop() {
        let source = "print(\"hello\")\nx = 1";
        assert_eq!(rename(source), source);
    }

    #[test]
    fn test_many_locals() {
        let source: String = (0..50_000)
            .map(|i| format!("local name_{i} = {i}\n"))
            .collect();
        let renamed = rename(&source);
        assert!(renamed.starts_with("local deobf_var_1 = 0\n"));
        assert!(renamed.ends_with("local deobf_var_50000 = 49999\n"));
        assert!(!renamed.contains("name_"));
    }

    #[test]
    fn test_synthetic_names_not_resubstituted() {
        assert_eq!(
            rename("local deobf_var_2 = 1\nlocal a = deobf_var_2"),
            "local deobf_var_1 = 1\nlocal deobf_var_2 = deobf_var_1"
        );
    }

    #[test]
    fn test_fresh_counters_per_call() {
        assert_eq!(rename("local a"), "local deobf_var_1");
        assert_eq!(rename("local b"), "local deobf_var_1");
    }
}
