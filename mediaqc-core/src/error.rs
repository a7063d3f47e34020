use thiserror::Error;

/// Custom error types for mediaqc
#[derive(Error, Debug)]
pub enum QcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required tool not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, std::io::Error),

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Command timed out after {0} seconds")]
    CommandTimeout(u64),

    #[error("External tool error: {0}")]
    ExternalTool(String),

    #[error("Media file error: {0}")]
    MediaFile(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Analysis cancelled")]
    Cancelled,
}

/// Result type for mediaqc operations
pub type Result<T> = std::result::Result<T, QcError>;
