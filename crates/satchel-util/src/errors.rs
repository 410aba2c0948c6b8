use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all Satchel operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SatchelError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed project configuration (satchel.toml).
    #[error("Config error: {message}")]
    #[diagnostic(help("Check your satchel.toml for syntax errors"))]
    Config { message: String },

    /// Invalid or malformed lock file (satchel.lock).
    #[error("Lockfile error: {message}")]
    #[diagnostic(help("Delete satchel.lock and re-resolve if it was edited by hand"))]
    Lockfile { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type SatchelResult<T> = miette::Result<T>;
