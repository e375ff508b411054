use regex::{Captures, Regex};

use crate::error::Result;

mod base64_literals;
pub use base64_literals::{decode_base64_literals, Base64LiteralPass};

mod beautify;
pub use beautify::{beautify, BeautifyPass};

mod fold;
pub use fold::{fold_arithmetic, fold_arithmetic_with_limit, ArithmeticFoldingPass};

mod literals;
pub use literals::{resolve_literals, LiteralResolverPass};

mod loadstring;
pub use loadstring::{rewrite_loadstring, LoadstringRewritePass};

mod rename;
pub use rename::{rename_identifiers, IdentifierRenamePass};

/// Suffix appended to a byte-table local once its value is decoded.
///
/// Names carrying it are never renamed, and the loadstring rewrite only
/// fires when both concatenated operands carry it.
pub const RESOLVED_SUFFIX: &str = "_resolved";

/// A single text-to-text rewrite in the deobfuscation pipeline
pub trait TextPass {
    /// Get the name of this pass
    fn name(&self) -> &'static str;

    /// Rewrite `source`, returning the full new text
    fn run(&mut self, source: &str) -> Result<String>;
}

/// Matches `\w` in the pattern sense: Unicode alphanumerics and `_`
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `Regex::replace_all` with a fallible replacer.
///
/// The replacer returns `Ok(None)` to keep a match as it was.
pub(crate) fn try_replace_all<F>(re: &Regex, text: &str, mut replacer: F) -> Result<String>
where
    F: FnMut(&Captures<'_>) -> Result<Option<String>>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let Some(m) = caps.get(0) else {
            continue;
        };
        out.push_str(&text[last..m.start()]);
        match replacer(&caps)? {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(m.as_str()),
        }
        last = m.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}
