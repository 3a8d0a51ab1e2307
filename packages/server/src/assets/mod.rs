//! File ingestion and range-addressable delivery.
//!
//! [`AssetService`] owns the write path (commit, update, delete) and the read
//! path. It keeps the durable file store and the metadata store consistent:
//! a record is only ever visible with its file in place, and every failure
//! after a side effect runs its compensating action before returning.

mod commit;
mod delete;
mod error;
mod fields;
mod naming;
mod reader;
pub mod repository;

use std::sync::Arc;

use common::storage::{AssetStore, StagingArea};

use crate::entity::asset;

pub use delete::{DeleteOutcome, PhysicalRemoval};
pub use error::AssetError;
pub use fields::{DescriptiveFields, FieldChanges};
pub use naming::StoredNameGenerator;
pub use reader::{AssetContent, Extent};
pub use repository::{AssetPage, AssetQuery, AssetRepository, AssetStats, NewAsset};

/// Identity of the caller, as established by the authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: i32,
    /// Whether the caller may commit, update, or delete assets.
    pub elevated: bool,
}

impl Caller {
    fn require_elevated(&self) -> Result<(), AssetError> {
        if self.elevated {
            Ok(())
        } else {
            Err(AssetError::Unauthorized)
        }
    }
}

pub struct AssetService {
    store: Arc<dyn AssetStore>,
    repo: Arc<dyn AssetRepository>,
    staging: StagingArea,
    names: StoredNameGenerator,
}

impl AssetService {
    pub fn new(
        store: Arc<dyn AssetStore>,
        repo: Arc<dyn AssetRepository>,
        staging: StagingArea,
    ) -> Self {
        Self {
            store,
            repo,
            staging,
            names: StoredNameGenerator::new(),
        }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Look up a committed asset.
    pub async fn find(&self, id: i32) -> Result<asset::Model, AssetError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(AssetError::MetadataFailure)?
            .ok_or(AssetError::NotFound)
    }

    pub async fn list(&self, query: &AssetQuery) -> Result<AssetPage, AssetError> {
        self.repo
            .list(query)
            .await
            .map_err(AssetError::MetadataFailure)
    }

    pub async fn stats(&self) -> Result<AssetStats, AssetError> {
        self.repo.stats().await.map_err(AssetError::MetadataFailure)
    }

    /// Replace the descriptive fields of an asset. Everything else is fixed.
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        changes: FieldChanges,
    ) -> Result<asset::Model, AssetError> {
        caller.require_elevated()?;
        let changes = changes.validated()?;

        if changes.is_empty() {
            return self.find(id).await;
        }

        self.repo
            .update(id, changes)
            .await
            .map_err(AssetError::MetadataFailure)?
            .ok_or(AssetError::NotFound)
    }
}
