use chrono::{DateTime, Utc};
use common::Category;
use serde::{Deserialize, Serialize};

use crate::assets::repository::{SortField, SortOrder};
use crate::assets::{AssetPage, AssetQuery, AssetStats, DeleteOutcome, FieldChanges};
use crate::entity::asset;
use crate::error::AppError;

use super::shared::Pagination;

/// Highest page number accepted by list endpoints.
const MAX_PAGE: u64 = 1_000_000;

/// Query parameters for listing assets.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct AssetListQuery {
    /// Restrict to one category.
    #[param(example = "audio")]
    pub category: Option<Category>,
    /// Case-insensitive substring of the theme.
    #[param(example = "jazz")]
    pub theme: Option<String>,
    /// Case-insensitive substring of title, description or theme.
    #[param(example = "lecture")]
    pub search: Option<String>,
    /// One of `created_at` (default), `title`, `size_bytes`.
    #[param(example = "created_at")]
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    #[param(example = "desc")]
    pub sort_order: Option<String>,
    /// Page number (1-indexed).
    #[param(example = 1)]
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    #[param(example = 20)]
    pub per_page: Option<u64>,
}

impl AssetListQuery {
    pub fn into_query(self) -> Result<AssetQuery, AppError> {
        let sort_by = match self.sort_by.as_deref().unwrap_or("created_at") {
            "created_at" => SortField::CreatedAt,
            "title" => SortField::Title,
            "size_bytes" => SortField::SizeBytes,
            _ => {
                return Err(AppError::Validation(
                    "sort_by must be one of: created_at, title, size_bytes".into(),
                ));
            }
        };
        let sort_order = match self.sort_order.as_deref().unwrap_or("desc") {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => {
                return Err(AppError::Validation(
                    "sort_order must be asc or desc".into(),
                ));
            }
        };

        let page = Ord::max(self.page.unwrap_or(1), 1);
        if page > MAX_PAGE {
            return Err(AppError::Validation(format!(
                "page must be between 1 and {MAX_PAGE}"
            )));
        }

        Ok(AssetQuery {
            category: self.category,
            theme: self.theme,
            search: self.search,
            sort_by,
            sort_order,
            page,
            per_page: self.per_page.unwrap_or(20).clamp(1, 100),
        })
    }
}

/// Request body for `PATCH /assets/{id}`. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateAssetRequest {
    #[schema(example = "Spring concert")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "Concerts")]
    pub theme: Option<String>,
}

impl From<UpdateAssetRequest> for FieldChanges {
    fn from(req: UpdateAssetRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            theme: req.theme,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssetResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Spring concert")]
    pub title: String,
    pub description: String,
    #[schema(example = "Concerts")]
    pub theme: String,
    pub category: Category,
    /// Filename as uploaded.
    #[schema(example = "concert.mp4")]
    pub original_name: String,
    #[schema(example = 1048576)]
    pub size_bytes: i64,
    /// Whether `GET /assets/{id}/serve` honours `Range`.
    pub streamable: bool,
    pub created_at: DateTime<Utc>,
    pub owner_id: i32,
}

impl From<asset::Model> for AssetResponse {
    fn from(m: asset::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            theme: m.theme,
            streamable: m.category.is_streamable(),
            category: m.category,
            original_name: m.original_name,
            size_bytes: m.size_bytes,
            created_at: m.created_at,
            owner_id: m.owner_id,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssetListResponse {
    pub data: Vec<AssetResponse>,
    pub pagination: Pagination,
}

impl AssetListResponse {
    pub fn from_page(page: AssetPage, query: &AssetQuery) -> Self {
        Self {
            data: page.items.into_iter().map(AssetResponse::from).collect(),
            pagination: Pagination {
                page: query.page,
                per_page: query.per_page,
                total: page.total,
                total_pages: page.total.div_ceil(query.per_page),
            },
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryCount {
    pub category: Category,
    #[schema(example = 12)]
    pub count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ThemeCount {
    #[schema(example = "Concerts")]
    pub theme: String,
    #[schema(example = 4)]
    pub count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssetStatsResponse {
    #[schema(example = 42)]
    pub total: u64,
    pub by_category: Vec<CategoryCount>,
    /// Up to five most used themes.
    pub top_themes: Vec<ThemeCount>,
}

impl From<AssetStats> for AssetStatsResponse {
    fn from(s: AssetStats) -> Self {
        Self {
            total: s.total,
            by_category: s
                .by_category
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
            top_themes: s
                .top_themes
                .into_iter()
                .map(|(theme, count)| ThemeCount { theme, count })
                .collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteAssetResponse {
    #[schema(example = 1)]
    pub id: i32,
    /// Whether the stored file was removed along with the record.
    pub file_removed: bool,
    /// Present when the record was deleted but the file needs attention.
    #[schema(example = "Asset record deleted; stored file was already missing")]
    pub warning: Option<String>,
}

impl From<DeleteOutcome> for DeleteAssetResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        use crate::assets::PhysicalRemoval;

        let warning = match &outcome.physical {
            PhysicalRemoval::Removed => None,
            PhysicalRemoval::AlreadyMissing => {
                Some("Asset record deleted; stored file was already missing".to_string())
            }
            PhysicalRemoval::Failed(_) => {
                Some("Asset record deleted; stored file could not be removed".to_string())
            }
        };

        Self {
            id: outcome.asset.id,
            file_removed: outcome.physical.is_clean(),
            warning,
        }
    }
}
