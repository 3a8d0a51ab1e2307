use super::AssetError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const THEME_MAX_CHARS: usize = 50;

/// Caller-supplied descriptive metadata for a new asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptiveFields {
    pub title: String,
    pub description: String,
    pub theme: String,
}

impl DescriptiveFields {
    /// Trim every field and check it against its bounds.
    pub fn validated(self) -> Result<Self, AssetError> {
        Ok(Self {
            title: bounded("title", &self.title, TITLE_MAX_CHARS)?,
            description: bounded("description", &self.description, DESCRIPTION_MAX_CHARS)?,
            theme: bounded("theme", &self.theme, THEME_MAX_CHARS)?,
        })
    }
}

/// Partial replacement of the descriptive fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub theme: Option<String>,
}

impl FieldChanges {
    pub fn validated(self) -> Result<Self, AssetError> {
        Ok(Self {
            title: self
                .title
                .map(|t| bounded("title", &t, TITLE_MAX_CHARS))
                .transpose()?,
            description: self
                .description
                .map(|d| bounded("description", &d, DESCRIPTION_MAX_CHARS))
                .transpose()?,
            theme: self
                .theme
                .map(|t| bounded("theme", &t, THEME_MAX_CHARS))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.theme.is_none()
    }
}

fn bounded(name: &str, value: &str, max: usize) -> Result<String, AssetError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > max {
        return Err(AssetError::InvalidMetadata(format!(
            "{name} must be 1-{max} characters"
        )));
    }
    Ok(value.to_string())
}
