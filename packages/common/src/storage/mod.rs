mod error;
mod traits;

pub mod filesystem;
pub mod staging;

pub use error::StorageError;
pub use filesystem::FilesystemAssetStore;
pub use staging::{PendingUpload, StagedFile, StagingArea};
pub use traits::{AssetStore, BoxReader};
