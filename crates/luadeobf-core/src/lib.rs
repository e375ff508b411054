//! Pattern-based deobfuscation of Lua source text.
//!
//! The input is never parsed as Lua. Each pass recognizes one obfuscation
//! idiom by pattern and rewrites it, and [`Pipeline`] runs the passes in a
//! fixed order over the whole text.
//!
//! ```
//! let out = luadeobf_core::deobfuscate("print(string.char(72, 105))").unwrap();
//! assert_eq!(out, "print(\"Hi\")\n");
//! ```

pub mod config;
pub mod error;
pub mod lua_string;
pub mod passes;
pub mod pipeline;
pub mod sandbox;

pub use config::DeobfConfig;
pub use error::{ConfigError, DeobfError, Result};
pub use passes::{TextPass, RESOLVED_SUFFIX};
pub use pipeline::{deobfuscate, PassOutcome, Pipeline, PipelineReport};
