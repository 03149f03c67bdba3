use thiserror::Error;
use treeforge::{ConfigError, TreeForgeError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] TreeForgeError),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("{count} of {samples} samples resolved to another leaf than the interpreter")]
    Mismatch { count: usize, samples: usize },

    #[error("benchmark checksums differ: interpreter {interpreted:?}, compiled {compiled:?}")]
    ChecksumMismatch {
        interpreted: Option<u64>,
        compiled: Option<u64>,
    },
}
