use std::path::PathBuf;

use clap::Parser;

/// luadeobf - best-effort deobfuscation of Lua scripts
#[derive(Debug, Parser)]
#[command(name = "luadeobf", version, about, long_about = None)]
pub struct Cli {
    /// Obfuscated Lua source to read.
    #[arg(value_name = "INPUT", default_value = "script.txt")]
    pub input: PathBuf,

    /// Where to write the deobfuscated source.
    #[arg(value_name = "OUTPUT", default_value = "deobf_script.txt")]
    pub output: PathBuf,

    /// YAML config file; flags below override its values.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip the arithmetic folding pass.
    #[arg(long)]
    pub no_fold: bool,

    /// Spaces per indent level in the output.
    #[arg(long, value_name = "N")]
    pub indent: Option<usize>,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Wait for Enter before exiting.
    #[arg(long)]
    pub pause: bool,
}
