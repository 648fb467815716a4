use crate::loader::LoadError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a document from being read at all.
///
/// Problems inside a document are never reported through this type; they
/// become diagnostics on the validation result.
#[derive(Debug, Error)]
pub enum RulemarkError {
    #[error("Path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Permission denied accessing: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Path is a directory: {}", path.display())]
    IsDirectory { path: PathBuf },

    #[error("I/O error reading {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("File is not valid UTF-8: {}", path.display())]
    Utf8 { path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, RulemarkError>;

impl RulemarkError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn utf8<P: Into<PathBuf>>(path: P) -> Self {
        Self::Utf8 { path: path.into() }
    }

    /// Stable diagnostic code for a document that could not be read.
    pub fn code(&self) -> crate::validation::DiagnosticCode {
        use crate::validation::DiagnosticCode;
        match self {
            Self::NotFound { .. } => DiagnosticCode::FileNotFound,
            Self::PermissionDenied { .. } => DiagnosticCode::FilePermissionDenied,
            Self::IsDirectory { .. } => DiagnosticCode::FileIsDirectory,
            Self::Io { .. } | Self::Config { .. } => DiagnosticCode::FileIoError,
            Self::Utf8 { .. } => DiagnosticCode::InvalidEncoding,
        }
    }
}

impl From<LoadError> for RulemarkError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound(path) => Self::NotFound { path },
            LoadError::PermissionDenied(path) => Self::PermissionDenied { path },
            LoadError::IsDirectory(path) => Self::IsDirectory { path },
            LoadError::Io { path, message } => Self::Io { path, message },
        }
    }
}
