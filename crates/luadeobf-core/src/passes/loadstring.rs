//! Loadstring Rewrite Pass
//!
//! Splits `loadstring(a_resolved .. b_resolved)` into an explicit compile
//! step and an invoke step:
//!
//! ```lua
//! local _exec = loadstring(a_resolved .. b_resolved)
//! _exec()
//! ```
//!
//! Only the exact two-operand shape with both operands carrying
//! [`RESOLVED_SUFFIX`] is rewritten.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use super::{TextPass, RESOLVED_SUFFIX};
use crate::error::Result;

/// Local bound to the compiled chunk
pub const EXEC_LOCAL: &str = "_exec";

static LOADSTRING_RE: Lazy<Regex> = Lazy::new(|| {
    let operand = format!(r"(\w+{})", regex::escape(RESOLVED_SUFFIX));
    Regex::new(&format!(
        r"\bloadstring\({}\s*\.\.\s*{}\)",
        operand, operand
    ))
    .unwrap()
});

pub struct LoadstringRewritePass;

impl Default for LoadstringRewritePass {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadstringRewritePass {
    pub fn new() -> Self {
        Self
    }
}

impl TextPass for LoadstringRewritePass {
    fn name(&self) -> &'static str {
        "loadstring-rewrite"
    }

    fn run(&mut self, source: &str) -> Result<String> {
        Ok(rewrite_loadstring(source))
    }
}

pub fn rewrite_loadstring(source: &str) -> String {
    let mut rewritten = 0usize;
    let result = LOADSTRING_RE.replace_all(source, |caps: &Captures<'_>| {
        rewritten += 1;
        format!(
            "local {exec} = loadstring({} .. {})\n{exec}()",
            &caps[1],
            &caps[2],
            exec = EXEC_LOCAL
        )
    });

    if rewritten > 0 {
        debug!(rewritten, "rewrote loadstring calls");
    }
    result.into_owned()
}
