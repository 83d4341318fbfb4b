use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all nuscan operations.
#[derive(Debug, Error, Diagnostic)]
pub enum NuscanError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable project input (.sln, .csproj, packages.config, ...).
    #[error("Project error: {message}")]
    #[diagnostic(help("Check that the target path points at a valid solution or project file"))]
    Project { message: String },

    /// Dependency resolution failed (unsatisfiable ranges, conflicting pins, etc.).
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Registry request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type NuscanResult<T> = miette::Result<T>;
