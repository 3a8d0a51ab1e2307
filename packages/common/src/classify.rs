#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Internal category of a committed asset.
///
/// The category decides the storage sub-partition, the default response
/// content type, and whether byte-range delivery is offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// PDF documents.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "document"))]
    Document,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "image"))]
    Image,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "audio"))]
    Audio,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "video"))]
    Video,
}

impl Category {
    pub const ALL: &'static [Category] = &[Self::Document, Self::Image, Self::Audio, Self::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Directory under the durable root holding assets of this category.
    pub fn partition(&self) -> &'static str {
        self.as_str()
    }

    /// Content type used when serving an asset of this category.
    pub fn default_content_type(&self) -> &'static str {
        match self {
            Self::Document => "application/pdf",
            Self::Image => "image/jpeg",
            Self::Audio => "audio/mpeg",
            Self::Video => "video/mp4",
        }
    }

    /// Returns true if partial-content delivery is offered for this category.
    pub fn is_streamable(&self) -> bool {
        matches!(self, Self::Audio | Self::Video)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The declared content type is not on the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported content type '{0}'")]
pub struct UnsupportedType(pub String);

/// Human-readable summary of the allow-list, suitable for client errors.
pub const ACCEPTED_TYPES_SUMMARY: &str =
    "PDF, images (JPEG, PNG, GIF), audio (MP3, WAV, OGG), video (MP4, AVI, MOV, WMV)";

static ALLOW_LIST: LazyLock<HashMap<&'static str, Category>> = LazyLock::new(|| {
    HashMap::from([
        ("application/pdf", Category::Document),
        ("image/jpeg", Category::Image),
        ("image/jpg", Category::Image),
        ("image/png", Category::Image),
        ("image/gif", Category::Image),
        ("audio/mpeg", Category::Audio),
        ("audio/mp3", Category::Audio),
        ("audio/wav", Category::Audio),
        ("audio/ogg", Category::Audio),
        ("video/mp4", Category::Video),
        ("video/avi", Category::Video),
        ("video/mov", Category::Video),
        ("video/wmv", Category::Video),
    ])
});

/// Map a declared MIME type onto its category.
///
/// Matching ignores case and any `; param=value` suffix.
pub fn classify(declared: &str) -> Result<Category, UnsupportedType> {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    ALLOW_LIST
        .get(essence.as_str())
        .copied()
        .ok_or_else(|| UnsupportedType(declared.trim().to_string()))
}
