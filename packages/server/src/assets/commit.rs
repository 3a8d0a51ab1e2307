use chrono::Utc;
use common::{Category, classify};
use common::storage::StagedFile;
use tracing::{error, info, warn};

use super::{AssetError, AssetService, Caller, DescriptiveFields, NewAsset};
use crate::entity::asset;

impl AssetService {
    /// Promote a staged upload into a committed asset.
    ///
    /// Rejections before the relocation release the staged file. A failed
    /// relocation leaves nothing at the destination. A failed insert removes
    /// the relocated file again before the error is returned.
    pub async fn commit(
        &self,
        caller: &Caller,
        staged: StagedFile,
        declared_type: &str,
        fields: DescriptiveFields,
    ) -> Result<asset::Model, AssetError> {
        let (category, fields, size_bytes) =
            match self.admit(caller, declared_type, fields, staged.size()) {
                Ok(admitted) => admitted,
                Err(e) => {
                    staged.release().await;
                    return Err(e);
                }
            };

        let stored_path = self
            .names
            .generate(category, staged.original_name(), Utc::now());

        if let Err(e) = self.store.move_into(staged.path(), &stored_path).await {
            error!(error = %e, "Failed to relocate staged upload");
            staged.release().await;
            return Err(AssetError::StorageFailure(e));
        }
        let original_name = staged.original_name().to_string();
        staged.mark_promoted();

        let new = NewAsset {
            title: fields.title,
            description: fields.description,
            theme: fields.theme,
            category,
            stored_path: stored_path.clone(),
            original_name,
            size_bytes,
            owner_id: caller.id,
        };

        match self.repo.insert(new).await {
            Ok(model) => {
                info!(
                    asset_id = model.id,
                    category = %model.category,
                    size = model.size_bytes,
                    "Asset committed"
                );
                Ok(model)
            }
            Err(db_err) => {
                match self.store.remove(&stored_path).await {
                    Ok(_) => warn!(error = %db_err, "Metadata insert failed, relocated file removed"),
                    Err(e) => error!(
                        error = %e,
                        insert_error = %db_err,
                        "Metadata insert failed and relocated file could not be removed"
                    ),
                }
                Err(AssetError::MetadataFailure(db_err))
            }
        }
    }

    /// Checks that run before any durable side effect.
    fn admit(
        &self,
        caller: &Caller,
        declared_type: &str,
        fields: DescriptiveFields,
        size: u64,
    ) -> Result<(Category, DescriptiveFields, i64), AssetError> {
        caller.require_elevated()?;
        let category =
            classify(declared_type).map_err(|e| AssetError::UnsupportedType(e.0))?;
        let fields = fields.validated()?;
        let size = i64::try_from(size).map_err(|_| AssetError::TooLarge {
            limit: self.staging.max_size(),
        })?;
        Ok((category, fields, size))
    }
}
