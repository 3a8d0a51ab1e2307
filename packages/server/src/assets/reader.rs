use common::range::{ByteRange, parse_range};
use common::storage::{BoxReader, StorageError};
use tracing::{debug, warn};

use super::{AssetError, AssetService};
use crate::entity::asset;

/// Which part of the file a response body covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Full { length: u64 },
    Partial { range: ByteRange, total: u64 },
}

impl Extent {
    /// Bytes in the body.
    pub fn content_length(&self) -> u64 {
        match self {
            Self::Full { length } => *length,
            Self::Partial { range, .. } => range.length(),
        }
    }
}

/// An open body ready to be streamed to a client.
pub struct AssetContent {
    pub asset: asset::Model,
    pub content_type: &'static str,
    pub extent: Extent,
    pub body: BoxReader,
}

impl AssetService {
    /// Open an asset's content, whole or as a single byte range.
    ///
    /// A range is honoured only for streamable categories; for everything
    /// else the header is ignored and the full body is returned. A record
    /// whose file is gone is reported as [`AssetError::NotFound`].
    pub async fn read(&self, id: i32, range: Option<&str>) -> Result<AssetContent, AssetError> {
        let asset = self.find(id).await?;

        let total = self.store.size(&asset.stored_path).await.map_err(|e| match e {
            StorageError::NotFound(_) => {
                warn!(asset_id = id, "Asset file missing from storage");
                AssetError::NotFound
            }
            other => AssetError::StorageFailure(other),
        })?;
        if i64::try_from(total).ok() != Some(asset.size_bytes) {
            warn!(
                asset_id = id,
                recorded = asset.size_bytes,
                actual = total,
                "Asset file size differs from its record"
            );
        }

        let content_type = asset.category.default_content_type();

        let extent = match range {
            Some(header) if asset.category.is_streamable() => {
                let range = parse_range(header, total).map_err(|e| {
                    debug!(asset_id = id, error = %e, "Rejected range request");
                    AssetError::RangeNotSatisfiable { size: total }
                })?;
                Extent::Partial { range, total }
            }
            _ => Extent::Full { length: total },
        };

        let slice = match extent {
            Extent::Partial { range, .. } => Some(range),
            Extent::Full { .. } => None,
        };
        let body = self
            .store
            .open_range(&asset.stored_path, slice)
            .await
            .map_err(AssetError::from)?;

        Ok(AssetContent {
            asset,
            content_type,
            extent,
            body,
        })
    }
}
