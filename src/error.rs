use miette::Diagnostic;
use thiserror::Error;

/// Main error type for orasprite operations
#[derive(Error, Diagnostic, Debug)]
pub enum OraError {
    #[error("IO error: {0}")]
    #[diagnostic(code(orasprite::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(orasprite::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(orasprite::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Source error with {path}: {message}")]
    #[diagnostic(code(orasprite::source))]
    Source {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Build error: {message}")]
    #[diagnostic(code(orasprite::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, OraError>;
