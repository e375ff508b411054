use thiserror::Error;

/// Errors raised by the deobfuscation pipeline
#[derive(Debug, Error)]
pub enum DeobfError {
    /// A byte-list entry does not fit in a code point
    #[error("invalid byte list entry `{entry}` in `{source_text}`")]
    InvalidByteList { entry: String, source_text: String },

    /// A byte-list value does not name a Unicode scalar value
    #[error("code point {value} is out of range")]
    InvalidCodePoint { value: u32 },

    /// The arithmetic folder kept changing the text past its iteration bound
    #[error("arithmetic folding did not converge after {iterations} iterations")]
    FoldDidNotConverge { iterations: usize },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while loading a [`crate::DeobfConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("indent width must be at most {max}, got {got}")]
    IndentTooWide { got: usize, max: usize },

    #[error("max_fold_iterations must be greater than zero")]
    ZeroFoldIterations,
}

pub type Result<T> = std::result::Result<T, DeobfError>;
