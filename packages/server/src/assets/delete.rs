use tracing::{info, warn};

use super::{AssetError, AssetService, Caller};
use crate::entity::asset;

/// What happened to the backing file during a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicalRemoval {
    Removed,
    /// The file was already gone.
    AlreadyMissing,
    /// The file could not be removed; it may still be on disk.
    Failed(String),
}

impl PhysicalRemoval {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// A completed deletion: the record is gone, whatever happened to the file.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub asset: asset::Model,
    pub physical: PhysicalRemoval,
}

impl AssetService {
    /// Remove an asset's record and, on a best-effort basis, its file.
    ///
    /// The metadata store is authoritative: a file that is missing or cannot
    /// be removed is reported in the outcome but never blocks the deletion.
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<DeleteOutcome, AssetError> {
        caller.require_elevated()?;
        let asset = self.find(id).await?;

        let physical = match self.store.remove(&asset.stored_path).await {
            Ok(true) => PhysicalRemoval::Removed,
            Ok(false) => {
                warn!(asset_id = id, "Asset file already missing on delete");
                PhysicalRemoval::AlreadyMissing
            }
            Err(e) => {
                warn!(asset_id = id, error = %e, "Failed to remove asset file, deleting record anyway");
                PhysicalRemoval::Failed(e.to_string())
            }
        };

        let removed = self
            .repo
            .delete(id)
            .await
            .map_err(AssetError::MetadataFailure)?;
        if !removed {
            return Err(AssetError::NotFound);
        }

        info!(asset_id = id, category = %asset.category, "Asset deleted");
        Ok(DeleteOutcome { asset, physical })
    }
}
