use common::storage::StorageError;
use sea_orm::DbErr;

/// Failure kinds of the asset pipelines.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Declared content type is not on the allow-list.
    #[error("unsupported content type '{0}'")]
    UnsupportedType(String),
    /// Descriptive fields are missing or out of bounds.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("upload exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },
    /// The durable store could not accept, open, or size a file.
    #[error("storage failure: {0}")]
    StorageFailure(#[source] StorageError),
    /// The metadata store rejected a read or write.
    #[error("metadata failure: {0}")]
    MetadataFailure(#[source] DbErr),
    /// The asset record or its backing file is absent.
    #[error("asset not found")]
    NotFound,
    #[error("range not satisfiable for {size} bytes")]
    RangeNotSatisfiable { size: u64 },
    #[error("elevated rights required")]
    Unauthorized,
}

impl From<StorageError> for AssetError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => Self::TooLarge { limit },
            StorageError::NotFound(_) => Self::NotFound,
            other => Self::StorageFailure(other),
        }
    }
}
