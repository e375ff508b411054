//! Base64 Literal Decoding Pass
//!
//! Any double-quoted literal of at least eight base64-alphabet characters is
//! treated as a candidate. Candidates that decode to valid UTF-8 are replaced
//! by the decoded text; everything else is left alone.
//!
//! This is a heuristic. A plain identifier-like string such as `"abcdefgh"`
//! satisfies the character class too, and will be replaced if it happens to
//! decode cleanly.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::Engine;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use super::TextPass;
use crate::error::Result;
use crate::lua_string::quote;

/// Standard padded alphabet that ignores non-zero bits in the final symbol
const LENIENT: GeneralPurpose =
    GeneralPurpose::new(&alphabet::STANDARD, PAD.with_decode_allow_trailing_bits(true));

static BASE64_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([A-Za-z0-9+/=]{8,})""#).unwrap());

pub struct Base64LiteralPass;

impl Default for Base64LiteralPass {
    fn default() -> Self {
        Self::new()
    }
}

impl Base64LiteralPass {
    pub fn new() -> Self {
        Self
    }
}

impl TextPass for Base64LiteralPass {
    fn name(&self) -> &'static str {
        "base64-literals"
    }

    fn run(&mut self, source: &str) -> Result<String> {
        Ok(decode_base64_literals(source))
    }
}

/// Replace every decodable base64 literal with its decoded text
pub fn decode_base64_literals(source: &str) -> String {
    let mut decoded_count = 0usize;
    let result = BASE64_LITERAL_RE.replace_all(source, |caps: &Captures<'_>| {
        let candidate = &caps[1];
        match decode(candidate) {
            Some(text) => {
                decoded_count += 1;
                quote(&text)
            }
            None => {
                trace!(candidate, "not decodable as base64 text");
                caps[0].to_string()
            }
        }
    });

    if decoded_count > 0 {
        debug!(decoded_count, "decoded base64 literals");
    }
    result.into_owned()
}

fn decode(candidate: &str) -> Option<String> {
    let bytes = LENIENT.decode(candidate).ok()?;
    String::from_utf8(bytes).ok()
}
