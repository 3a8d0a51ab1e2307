use std::fmt;

/// Errors that can occur during asset storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// No file exists at the given relative path.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The relative path is empty, absolute, or escapes the storage root.
    InvalidPath(String),
    /// The destination of a move is already occupied.
    AlreadyExists(String),
    /// The inbound stream exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "file not found: {path}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidPath(path) => write!(f, "invalid storage path: {path}"),
            Self::AlreadyExists(path) => write!(f, "destination already exists: {path}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "stream exceeds size limit ({actual} > {limit} bytes)")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
