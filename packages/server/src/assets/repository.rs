//! Authoritative record of committed assets.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use common::Category;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tokio::sync::RwLock;

use super::FieldChanges;
use crate::entity::asset;

/// How many themes [`AssetStats::top_themes`] reports.
pub const TOP_THEMES: usize = 5;

/// A record about to be inserted. The id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub title: String,
    pub description: String,
    pub theme: String,
    pub category: Category,
    pub stored_path: String,
    pub original_name: String,
    pub size_bytes: i64,
    pub owner_id: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    Title,
    SizeBytes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and page selection for [`AssetRepository::list`].
#[derive(Debug, Clone)]
pub struct AssetQuery {
    pub category: Option<Category>,
    /// Case-insensitive substring of the theme.
    pub theme: Option<String>,
    /// Case-insensitive substring of title, description or theme.
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
}

impl Default for AssetQuery {
    fn default() -> Self {
        Self {
            category: None,
            theme: None,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            per_page: 20,
        }
    }
}

impl AssetQuery {
    fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Clone)]
pub struct AssetPage {
    pub items: Vec<asset::Model>,
    /// Matching records across all pages.
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStats {
    pub total: u64,
    /// Every category, including empty ones, in [`Category::ALL`] order.
    pub by_category: Vec<(Category, u64)>,
    /// Most used themes, most frequent first.
    pub top_themes: Vec<(String, u64)>,
}

impl AssetStats {
    /// Assemble stats from aggregate counts. Categories without rows report zero.
    fn from_counts(
        total: u64,
        per_category: impl IntoIterator<Item = (Category, i64)>,
        top_themes: impl IntoIterator<Item = (String, i64)>,
    ) -> Self {
        let per_category: HashMap<Category, i64> = per_category.into_iter().collect();
        let count = |n: i64| u64::try_from(n).unwrap_or(0);

        Self {
            total,
            by_category: Category::ALL
                .iter()
                .map(|c| (*c, per_category.get(c).copied().map_or(0, count)))
                .collect(),
            top_themes: top_themes
                .into_iter()
                .take(TOP_THEMES)
                .map(|(theme, n)| (theme, count(n)))
                .collect(),
        }
    }

    /// Count per-row `(category, theme)` pairs in memory.
    fn from_rows(rows: impl IntoIterator<Item = (Category, String)>) -> Self {
        let mut total = 0u64;
        let mut per_category: HashMap<Category, u64> = HashMap::new();
        let mut per_theme: HashMap<String, u64> = HashMap::new();

        for (category, theme) in rows {
            total += 1;
            *per_category.entry(category).or_insert(0) += 1;
            *per_theme.entry(theme).or_insert(0) += 1;
        }

        let by_category = Category::ALL
            .iter()
            .map(|c| (*c, per_category.get(c).copied().unwrap_or(0)))
            .collect();

        let mut top_themes: Vec<_> = per_theme.into_iter().collect();
        top_themes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_themes.truncate(TOP_THEMES);

        Self {
            total,
            by_category,
            top_themes,
        }
    }
}

#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Insert a record, returning it with its assigned id.
    async fn insert(&self, new: NewAsset) -> Result<asset::Model, DbErr>;

    async fn find_by_id(&self, id: i32) -> Result<Option<asset::Model>, DbErr>;

    /// Apply descriptive-field changes. `None` if no such record exists.
    async fn update(&self, id: i32, changes: FieldChanges)
    -> Result<Option<asset::Model>, DbErr>;

    /// Remove a record. `false` if no such record existed.
    async fn delete(&self, id: i32) -> Result<bool, DbErr>;

    async fn list(&self, query: &AssetQuery) -> Result<AssetPage, DbErr>;

    async fn stats(&self) -> Result<AssetStats, DbErr>;
}

/// [`AssetRepository`] over a SeaORM connection.
pub struct SeaOrmAssetRepository {
    db: DatabaseConnection,
}

impl SeaOrmAssetRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Case-insensitive substring match on `column`.
fn contains_ci(column: asset::Column, term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\')),
    )
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn non_blank(term: &Option<String>) -> Option<&str> {
    term.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

#[async_trait]
impl AssetRepository for SeaOrmAssetRepository {
    async fn insert(&self, new: NewAsset) -> Result<asset::Model, DbErr> {
        asset::ActiveModel {
            title: Set(new.title),
            description: Set(new.description),
            theme: Set(new.theme),
            category: Set(new.category),
            stored_path: Set(new.stored_path),
            original_name: Set(new.original_name),
            size_bytes: Set(new.size_bytes),
            created_at: Set(Utc::now()),
            owner_id: Set(new.owner_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<asset::Model>, DbErr> {
        asset::Entity::find_by_id(id).one(&self.db).await
    }

    async fn update(
        &self,
        id: i32,
        changes: FieldChanges,
    ) -> Result<Option<asset::Model>, DbErr> {
        let Some(existing) = asset::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: asset::ActiveModel = existing.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(theme) = changes.theme {
            active.theme = Set(theme);
        }

        match active.update(&self.db).await {
            Ok(model) => Ok(Some(model)),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        let result = asset::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self, query: &AssetQuery) -> Result<AssetPage, DbErr> {
        let mut select = asset::Entity::find();

        if let Some(category) = query.category {
            select = select.filter(asset::Column::Category.eq(category));
        }
        if let Some(theme) = non_blank(&query.theme) {
            select = select.filter(contains_ci(asset::Column::Theme, theme));
        }
        if let Some(search) = non_blank(&query.search) {
            select = select.filter(
                Condition::any()
                    .add(contains_ci(asset::Column::Title, search))
                    .add(contains_ci(asset::Column::Description, search))
                    .add(contains_ci(asset::Column::Theme, search)),
            );
        }

        let total = select.clone().count(&self.db).await?;

        let column = match query.sort_by {
            SortField::CreatedAt => asset::Column::CreatedAt,
            SortField::Title => asset::Column::Title,
            SortField::SizeBytes => asset::Column::SizeBytes,
        };
        let order = match query.sort_order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let items = select
            .order_by(column, order.clone())
            .order_by(asset::Column::Id, order)
            .offset(query.offset())
            .limit(query.per_page)
            .all(&self.db)
            .await?;

        Ok(AssetPage { items, total })
    }

    async fn stats(&self) -> Result<AssetStats, DbErr> {
        let total = asset::Entity::find().count(&self.db).await?;

        let per_category: Vec<(Category, i64)> = asset::Entity::find()
            .select_only()
            .column(asset::Column::Category)
            .column_as(asset::Column::Id.count(), "total")
            .group_by(asset::Column::Category)
            .into_tuple()
            .all(&self.db)
            .await?;

        let top_themes: Vec<(String, i64)> = asset::Entity::find()
            .select_only()
            .column(asset::Column::Theme)
            .column_as(asset::Column::Id.count(), "total")
            .group_by(asset::Column::Theme)
            .order_by_desc(asset::Column::Id.count())
            .order_by_asc(asset::Column::Theme)
            .limit(TOP_THEMES as u64)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(AssetStats::from_counts(total, per_category, top_themes))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i32,
    rows: BTreeMap<i32, asset::Model>,
}

/// In-process [`AssetRepository`] for tests and database-less runs.
#[derive(Debug, Default)]
pub struct MemoryAssetRepository {
    state: RwLock<MemoryState>,
}

impl MemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_query(model: &asset::Model, query: &AssetQuery) -> bool {
    let contains = |haystack: &str, needle: &str| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    };

    if let Some(category) = query.category
        && model.category != category
    {
        return false;
    }
    if let Some(theme) = non_blank(&query.theme)
        && !contains(&model.theme, theme)
    {
        return false;
    }
    if let Some(search) = non_blank(&query.search)
        && !(contains(&model.title, search)
            || contains(&model.description, search)
            || contains(&model.theme, search))
    {
        return false;
    }
    true
}

#[async_trait]
impl AssetRepository for MemoryAssetRepository {
    async fn insert(&self, new: NewAsset) -> Result<asset::Model, DbErr> {
        let mut state = self.state.write().await;

        if state
            .rows
            .values()
            .any(|row| row.stored_path == new.stored_path)
        {
            return Err(DbErr::Custom(format!(
                "duplicate stored_path '{}'",
                new.stored_path
            )));
        }

        state.next_id += 1;
        let model = asset::Model {
            id: state.next_id,
            title: new.title,
            description: new.description,
            theme: new.theme,
            category: new.category,
            stored_path: new.stored_path,
            original_name: new.original_name,
            size_bytes: new.size_bytes,
            created_at: Utc::now(),
            owner_id: new.owner_id,
        };
        state.rows.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<asset::Model>, DbErr> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn update(
        &self,
        id: i32,
        changes: FieldChanges,
    ) -> Result<Option<asset::Model>, DbErr> {
        let mut state = self.state.write().await;
        let Some(row) = state.rows.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(theme) = changes.theme {
            row.theme = theme;
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        Ok(self.state.write().await.rows.remove(&id).is_some())
    }

    async fn list(&self, query: &AssetQuery) -> Result<AssetPage, DbErr> {
        let state = self.state.read().await;
        let mut matching: Vec<_> = state
            .rows
            .values()
            .filter(|m| matches_query(m, query))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ord = match query.sort_by {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::Title => a.title.cmp(&b.title),
                SortField::SizeBytes => a.size_bytes.cmp(&b.size_bytes),
            }
            .then_with(|| a.id.cmp(&b.id));
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page as usize)
            .collect();

        Ok(AssetPage { items, total })
    }

    async fn stats(&self) -> Result<AssetStats, DbErr> {
        let state = self.state.read().await;
        Ok(AssetStats::from_rows(
            state.rows.values().map(|m| (m.category, m.theme.clone())),
        ))
    }
}
