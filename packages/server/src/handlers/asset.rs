use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::{StagedFile, StagingArea};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::assets::{AssetContent, AssetError, DescriptiveFields, Extent};
use crate::config::StorageConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::asset::{
    AssetListQuery, AssetListResponse, AssetResponse, AssetStatsResponse, DeleteAssetResponse,
    UpdateAssetRequest,
};
use crate::state::AppState;

/// Headroom over the file limit for the other multipart fields and framing.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn upload_body_limit(storage: &StorageConfig) -> DefaultBodyLimit {
    let limit = storage.max_upload_size.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Assets",
    operation_id = "listAssets",
    summary = "List assets with filtering, search and pagination",
    description = "Returns a paginated list of assets. Supports filtering by `category` and `theme`, case-insensitive `search` over title, description and theme, and sorting by `created_at` (default, desc), `title`, or `size_bytes`.",
    params(AssetListQuery),
    responses(
        (status = 200, description = "List of assets", body = AssetListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_assets(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AssetListQuery>,
) -> Result<Json<AssetListResponse>, AppError> {
    let query = query.into_query()?;
    let page = state.assets.list(&query).await?;
    Ok(Json(AssetListResponse::from_page(page, &query)))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Assets",
    operation_id = "getAssetStats",
    summary = "Library statistics",
    description = "Total asset count, count per category, and the five most used themes.",
    responses(
        (status = 200, description = "Statistics", body = AssetStatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn asset_stats(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AssetStatsResponse>, AppError> {
    Ok(Json(state.assets.stats().await?.into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Assets",
    operation_id = "uploadAsset",
    summary = "Upload a new asset",
    description = "Uploads a file with its descriptive metadata. Multipart fields: `file` (required, with filename), `title`, `description`, `theme`. The part's content type decides the category; if absent it is guessed from the filename. Requires the admin role.",
    request_body(content_type = "multipart/form-data", description = "File with title, description and theme"),
    responses(
        (status = 201, description = "Asset created", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, UNSUPPORTED_TYPE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id, username = %auth_user.username))]
pub async fn upload_asset(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_elevated()?;
    let limit = state.assets.staging().max_size();

    let mut staged: Option<(StagedFile, String)> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut theme: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        match field.name() {
            Some("file") => {
                if staged.is_some() {
                    return Err(AppError::Validation("Only one 'file' field is allowed".into()));
                }
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
                let declared = match field.content_type() {
                    Some(mime) => mime.to_string(),
                    None => mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string(),
                };
                let file = stage_field(field, state.assets.staging(), &file_name).await?;
                staged = Some((file, declared));
            }
            Some("title") => title = Some(text_field(field, "title").await?),
            Some("description") => description = Some(text_field(field, "description").await?),
            Some("theme") => theme = Some(text_field(field, "theme").await?),
            _ => {} // Ignore unknown fields.
        }
    }

    let (file, declared) =
        staged.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let fields = DescriptiveFields {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        theme: theme.unwrap_or_default(),
    };

    let model = state
        .assets
        .commit(&auth_user.caller(), file, &declared, fields)
        .await?;

    Ok((StatusCode::CREATED, Json(AssetResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Assets",
    operation_id = "getAsset",
    summary = "Get asset metadata",
    params(("id" = i32, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset details", body = AssetResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_asset(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AssetResponse>, AppError> {
    Ok(Json(state.assets.find(id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Assets",
    operation_id = "updateAsset",
    summary = "Update asset metadata",
    description = "Partially updates title, description and theme. Category, file, size and owner never change. Requires the admin role. An empty payload returns the current resource unchanged.",
    params(("id" = i32, Path, description = "Asset ID")),
    request_body = UpdateAssetRequest,
    responses(
        (status = 200, description = "Asset updated", body = AssetResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_asset(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAssetRequest>,
) -> Result<Json<AssetResponse>, AppError> {
    let model = state
        .assets
        .update(&auth_user.caller(), id, payload.into())
        .await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Assets",
    operation_id = "deleteAsset",
    summary = "Delete an asset",
    description = "Deletes the asset record and its stored file. A file that is already missing or cannot be removed does not block the deletion; the response carries a warning instead. Requires the admin role.",
    params(("id" = i32, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Asset deleted", body = DeleteAssetResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Asset not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_asset(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteAssetResponse>, AppError> {
    let outcome = state.assets.delete(&auth_user.caller(), id).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/serve",
    tag = "Assets",
    operation_id = "serveAsset",
    summary = "Stream asset content",
    description = "Streams the content inline with the category's content type. For audio and video a single `Range: bytes=start-end` header yields 206 Partial Content; other categories are always served whole.",
    params(
        ("id" = i32, Path, description = "Asset ID"),
        ("Range" = Option<String>, Header, description = "Byte range, e.g. `bytes=0-99`"),
    ),
    responses(
        (status = 200, description = "Full content"),
        (status = 206, description = "Partial content"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Asset or file not found (NOT_FOUND)", body = ErrorBody),
        (status = 416, description = "Range not satisfiable (RANGE_NOT_SATISFIABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, headers))]
pub async fn serve_asset(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());
    let content = state.assets.read(id, range).await?;
    content_response(content, Disposition::Inline)
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Assets",
    operation_id = "downloadAsset",
    summary = "Download asset content",
    description = "Returns the whole file as an attachment named after the uploaded filename.",
    params(("id" = i32, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "File content"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Asset or file not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn download_asset(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let content = state.assets.read(id, None).await?;
    content_response(content, Disposition::Attachment)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Inline,
    Attachment,
}

fn content_response(content: AssetContent, disposition: Disposition) -> Result<Response, AppError> {
    let AssetContent {
        asset,
        content_type,
        extent,
        body,
    } = content;

    let content_type = match disposition {
        Disposition::Inline => content_type,
        Disposition::Attachment => "application/octet-stream",
    };

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, extent.content_length().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(disposition, &asset.original_name),
        )
        .header(header::CACHE_CONTROL, "private, max-age=3600");

    if asset.category.is_streamable() {
        builder = builder.header(header::ACCEPT_RANGES, "bytes");
    }

    builder = match extent {
        Extent::Full { .. } => builder.status(StatusCode::OK),
        Extent::Partial { range, total } => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, range.content_range(total)),
    };

    builder
        .body(Body::from_stream(ReaderStream::new(body)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(disposition: Disposition, filename: &str) -> String {
    let kind = match disposition {
        Disposition::Inline => "inline",
        Disposition::Attachment => "attachment",
    };

    let ascii_safe: String = filename
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = match ascii_safe.trim() {
        "" => "download".to_string(),
        name => name.to_string(),
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("{kind}; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

/// Stream a multipart file field into the staging area.
async fn stage_field(
    mut field: Field<'_>,
    staging: &StagingArea,
    file_name: &str,
) -> Result<StagedFile, AppError> {
    let limit = staging.max_size();
    let mut upload = staging.begin(file_name).await.map_err(AssetError::from)?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        upload.write_chunk(&chunk).await.map_err(AssetError::from)?;
    }

    let staged = upload.finish().await.map_err(AssetError::from)?;
    Ok(staged)
}

async fn text_field(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

/// Body-limit rejections surface as multipart errors.
fn multipart_error(e: MultipartError, limit: u64) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}
