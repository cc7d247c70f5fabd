use crate::error::AppResult;
use crate::infrastructure::ports::ObjectStore;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owns the on-disk output tree. Audio bytes only ever land here; the
/// catalog references them by path.
pub struct OutputStore {
    root: PathBuf,
    object_store: Arc<dyn ObjectStore>,
    bucket: Option<String>,
}

impl OutputStore {
    pub fn new(root: PathBuf, object_store: Arc<dyn ObjectStore>, bucket: Option<String>) -> Self {
        Self {
            root,
            object_store,
            bucket,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write audio bytes under `root/YYYY/MM/DD/<timestamp>-<slug>.<ext>`.
    /// On collision an incrementing `-N` suffix is appended until a free
    /// path is found. Returns the path relative to the output root.
    pub async fn place(&self, bytes: &[u8], hint: &str, extension: &str) -> AppResult<PathBuf> {
        let now = Utc::now();
        let day_dir = PathBuf::from(now.format("%Y").to_string())
            .join(now.format("%m").to_string())
            .join(now.format("%d").to_string());
        tokio::fs::create_dir_all(self.root.join(&day_dir)).await?;

        let base = format!("{}-{}", now.format("%Y%m%d-%H%M%S"), slugify(hint));

        let mut candidate = day_dir.join(format!("{}.{}", base, extension));
        let mut suffix = 0u32;
        while tokio::fs::try_exists(self.root.join(&candidate)).await? {
            suffix += 1;
            candidate = day_dir.join(format!("{}-{}.{}", base, suffix, extension));
        }

        tokio::fs::write(self.root.join(&candidate), bytes).await?;

        tracing::info!(
            path = %candidate.display(),
            bytes = bytes.len(),
            "Audio written"
        );

        Ok(candidate)
    }

    /// Best-effort mirror to the object store. A failure is logged and
    /// swallowed; the caller proceeds without a mirror URL.
    pub async fn mirror(&self, relative_path: &Path) -> Option<String> {
        let bucket = self.bucket.as_deref()?;
        let key = relative_path.to_string_lossy().replace('\\', "/");

        let bytes = match tokio::fs::read(self.root.join(relative_path)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %relative_path.display(), error = %e, "Mirror read failed");
                return None;
            }
        };

        match self.object_store.put(bucket, &key, bytes).await {
            Ok(url) => {
                tracing::info!(url = %url, "Mirrored to object store");
                Some(url)
            }
            Err(e) => {
                tracing::warn!(
                    path = %relative_path.display(),
                    error = %e,
                    "Object store mirroring failed, continuing without mirror"
                );
                None
            }
        }
    }
}

/// Reduce a filename hint to alnum/hyphen/underscore, whitespace collapsed
/// to hyphens, at most 64 characters.
pub fn slugify(hint: &str) -> String {
    let mut slug = String::new();
    let mut last_was_hyphen = false;

    for c in hint.trim().chars() {
        let mapped = if c.is_ascii_alphanumeric() || c == '_' {
            Some(c)
        } else if c.is_whitespace() || c == '-' {
            if last_was_hyphen {
                None
            } else {
                Some('-')
            }
        } else {
            None
        };

        if let Some(c) = mapped {
            last_was_hyphen = c == '-';
            slug.push(c);
            if slug.len() >= 64 {
                break;
            }
        }
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "speech".to_string()
    } else {
        slug
    }
}
