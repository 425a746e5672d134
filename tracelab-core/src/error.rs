use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors surfaced by the core crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying I/O failure (config files, trace files).
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid or unreadable configuration.
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Build a configuration error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
