//! Helpers for caller-supplied filenames.
//!
//! An uploaded filename is attacker-controlled. It is kept for display and
//! download headers only; anything that reaches the filesystem goes through
//! [`sanitize_for_storage`] or [`safe_extension`] first.

/// Longest sanitized stem kept in a durable file name.
pub const MAX_STORED_NAME_LEN: usize = 100;

/// Longest extension carried over onto a staged file.
const MAX_EXTENSION_LEN: usize = 10;

/// Reduce a caller-supplied filename to a display name.
///
/// Drops any directory components (browsers and some clients send full
/// paths), strips control characters, and trims whitespace. Falls back to
/// `"upload"` if nothing usable remains.
pub fn display_name(raw: &str) -> String {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Map a filename onto the `[A-Za-z0-9.-]` alphabet used for durable names.
///
/// Every other character becomes `_`. Leading dots are replaced so the
/// result is never hidden, and the output is capped at
/// [`MAX_STORED_NAME_LEN`] characters.
pub fn sanitize_for_storage(name: &str) -> String {
    let mut out: String = display_name(name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STORED_NAME_LEN)
        .collect();

    if out.starts_with('.') {
        out.replace_range(..1, "_");
    }
    out
}

/// Extension of `name` including the leading dot, if it is short and
/// alphanumeric. Returns an empty string otherwise.
pub fn safe_extension(name: &str) -> String {
    let name = display_name(name);
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Checks if a relative path string contains path traversal patterns.
pub fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
        || path.contains('\\')
}
