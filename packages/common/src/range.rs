/// An inclusive byte range `[start, end]` within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a resource of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Header is not of the single `bytes=start-[end]` form.
    #[error("malformed range header '{0}'")]
    Malformed(String),
    /// Range is well-formed but lies outside the resource.
    #[error("range {start}-{end} not satisfiable for {size} bytes")]
    Unsatisfiable { start: u64, end: u64, size: u64 },
}

/// Parse a `Range` header against a resource of `size` bytes.
///
/// Only a single `bytes=start-end` range with an explicit start is accepted.
/// A missing end defaults to the last byte, and an end past the last byte is
/// clamped to it.
pub fn parse_range(header: &str, size: u64) -> Result<ByteRange, RangeError> {
    let malformed = || RangeError::Malformed(header.to_string());

    let set = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(malformed)?
        .trim();

    if set.contains(',') {
        return Err(malformed());
    }

    let (start, end) = set.split_once('-').ok_or_else(malformed)?;
    let start = position(start).ok_or_else(malformed)?;

    let end = match end.trim() {
        "" => size.saturating_sub(1),
        raw => position(raw).ok_or_else(malformed)?,
    };

    if size == 0 || start >= size {
        return Err(RangeError::Unsatisfiable { start, end, size });
    }

    let end = end.min(size - 1);
    if start > end {
        return Err(RangeError::Unsatisfiable { start, end, size });
    }

    Ok(ByteRange { start, end })
}

/// A byte position: ASCII digits only, no sign.
fn position(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
