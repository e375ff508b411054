//! Arithmetic Folding Pass
//!
//! Finds chains of two or more numeric terms joined by `+ - * /` and replaces
//! each with its value, as computed by [`crate::sandbox`]:
//!
//! ```lua
//! local x = 12 * 4 + 3   →   local x = 51
//! local y = 10 / 4       →   local y = 2.5
//! ```
//!
//! A chain may not touch a word character on either side, so `v1+2` and
//! `1+2x` are not candidates. When the full chain is followed by a word
//! character, the longest prefix of it (still two terms or more) that is not
//! is used instead. Chains the sandbox rejects stay as written.
//!
//! The scan repeats until a pass over the text changes nothing, bounded by an
//! iteration limit so adversarial input cannot spin forever.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use super::{is_word_char, TextPass};
use crate::error::{DeobfError, Result};
use crate::sandbox;

/// Default bound on fixed-point scans
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

static ARITH_CHAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?\d+(?:\.\d+)?(?:\s*[-+*/]\s*[-+]?\d+(?:\.\d+)?)+").unwrap()
});

static TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-+]?(\d+)(\.\d+)?").unwrap());

pub struct ArithmeticFoldingPass {
    max_iterations: usize,
}

impl Default for ArithmeticFoldingPass {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl ArithmeticFoldingPass {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }
}

impl TextPass for ArithmeticFoldingPass {
    fn name(&self) -> &'static str {
        "arithmetic-folding"
    }

    fn run(&mut self, source: &str) -> Result<String> {
        fold_arithmetic_with_limit(source, self.max_iterations)
    }
}

pub fn fold_arithmetic(source: &str) -> Result<String> {
    fold_arithmetic_with_limit(source, DEFAULT_MAX_ITERATIONS)
}

/// Fold until a scan changes nothing, giving up after `max_iterations` scans
pub fn fold_arithmetic_with_limit(source: &str, max_iterations: usize) -> Result<String> {
    let mut text = source.to_string();
    for iteration in 1..=max_iterations {
        let next = fold_once(&text);
        if next == text {
            debug!(iterations = iteration, "arithmetic folding converged");
            return Ok(text);
        }
        text = next;
    }
    Err(DeobfError::FoldDidNotConverge {
        iterations: max_iterations,
    })
}

fn fold_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;

    while let Some(m) = ARITH_CHAIN_RE.find_at(text, pos) {
        let start = m.start();
        let after_word = text[..start].chars().next_back().is_some_and(is_word_char);
        let end = if after_word {
            None
        } else {
            chain_end(text, start, m.end())
        };

        let Some(end) = end else {
            pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
            continue;
        };

        let expr = &text[start..end];
        out.push_str(&text[last..start]);
        match sandbox::evaluate_to_string(expr) {
            Ok(value) => out.push_str(&value),
            Err(err) => {
                trace!(expr, %err, "leaving expression unfolded");
                out.push_str(expr);
            }
        }
        last = end;
        pos = end;
    }

    out.push_str(&text[last..]);
    out
}

/// Longest end of the chain at `start` that is not followed by a word character.
///
/// Candidates are the end of each term from the second on, plus the end of
/// its integer part when it has a fraction.
fn chain_end(text: &str, start: usize, greedy_end: usize) -> Option<usize> {
    let mut ends = Vec::new();
    for caps in TERM_RE.captures_iter(&text[start..greedy_end]).skip(1) {
        if let (Some(int_part), Some(_)) = (caps.get(1), caps.get(2)) {
            ends.push(start + int_part.end());
        }
        if let Some(term) = caps.get(0) {
            ends.push(start + term.end());
        }
    }

    ends.into_iter()
        .rev()
        .find(|&end| !text[end..].chars().next().is_some_and(is_word_char))
}
