//! Error types for rostersync

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`SyncError`]
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by the synchronization pipeline
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A spreadsheet could not be opened or parsed
    #[error("Failed to open spreadsheet {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    /// A file could not be written, renamed or removed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backup file name is already taken
    #[error("Backup file exists already: {}", .0.display())]
    Conflict(PathBuf),

    /// Fetching records from the membership database failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// An operation was invoked out of its required order
    #[error("Invalid state: {0}")]
    State(String),

    /// A lookup by name found nothing
    #[error("{0} not found")]
    NotFound(String),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for package level operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors raised while reading or writing an xlsx package
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid package: {0}")]
    InvalidFormat(String),
}

impl From<quick_xml::events::attributes::AttrError> for XlsxError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        XlsxError::Xml(err.into())
    }
}

/// Classification of membership database failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The configured certificate file does not exist or is unreadable
    CertificateMissing,
    /// Connection, TLS or timeout failure
    Transport,
    /// The server answered with a non-success status
    HttpStatus(u16),
    /// A request was attempted before logging in
    MissingToken,
    /// The server kept redirecting
    TooManyRedirects,
    /// The response body was not the expected JSON
    InvalidResponse,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteErrorKind::CertificateMissing => write!(f, "certificate file not found"),
            RemoteErrorKind::Transport => write!(f, "transport error"),
            RemoteErrorKind::HttpStatus(code) => write!(f, "HTTP status {code}"),
            RemoteErrorKind::MissingToken => write!(f, "authentication token missing"),
            RemoteErrorKind::TooManyRedirects => write!(f, "too many redirects"),
            RemoteErrorKind::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

/// Error returned by a [`crate::remote::RemoteSource`]
#[derive(Debug, Clone, Error)]
#[error("Membership database: {kind}: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
