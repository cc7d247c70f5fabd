use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// A validated inclusive byte range within a file of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

/// Parse a `Range: bytes=start-end` header against a file size. Only the
/// first range of a list is honored; the end bound is optional and defaults
/// to EOF. Anything unparsable or out of bounds is 416.
pub fn parse_range(header: &str, file_size: u64) -> AppResult<ByteRange> {
    let unsatisfiable = |detail: &str| AppError::RangeNotSatisfiable(detail.to_string());

    let spec = header
        .strip_prefix("bytes=")
        .ok_or_else(|| unsatisfiable("only byte ranges are supported"))?;

    // Multi-range requests: serve the first range only
    let first = spec.split(',').next().unwrap_or("").trim();

    let (start_str, end_str) = first
        .split_once('-')
        .ok_or_else(|| unsatisfiable("malformed range"))?;

    let start: u64 = start_str
        .parse()
        .map_err(|_| unsatisfiable("malformed range start"))?;

    let end: u64 = if end_str.is_empty() {
        file_size.saturating_sub(1)
    } else {
        end_str
            .parse()
            .map_err(|_| unsatisfiable("malformed range end"))?
    };

    if start > end || end >= file_size {
        return Err(unsatisfiable(&format!(
            "range {}-{} outside 0-{}",
            start,
            end,
            file_size.saturating_sub(1)
        )));
    }

    Ok(ByteRange { start, end })
}

/// Resolve an attacker-controlled relative path against the output root,
/// rejecting anything that escapes it after canonicalization.
pub async fn resolve_within_root(root: &Path, relative: &str) -> AppResult<PathBuf> {
    let root_canonical = tokio::fs::canonicalize(root)
        .await
        .map_err(|e| AppError::Internal(format!("output root unavailable: {}", e)))?;

    let requested = root.join(relative);
    let resolved = tokio::fs::canonicalize(&requested)
        .await
        .map_err(|_| AppError::NotFound(format!("no such file: {}", relative)))?;

    if !resolved.starts_with(&root_canonical) {
        tracing::warn!(path = %relative, "Path traversal attempt rejected");
        return Err(AppError::Forbidden("path escapes output root".to_string()));
    }

    Ok(resolved)
}

/// Guess a MIME type from the file extension
pub fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("txt") | Some("md") => "text/plain",
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}
