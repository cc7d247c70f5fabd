use super::model::{CatalogEntry, CatalogFilters, CatalogUpdate};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{entries_to_csv, CatalogRepository};
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use zip::write::SimpleFileOptions;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    Download,
    ExportCsv,
    Edit,
}

pub enum BatchOutcome {
    Zip(Vec<u8>),
    Csv(Vec<u8>),
    Edited(usize),
}

pub struct CatalogService {
    repo: Arc<CatalogRepository>,
    output_root: PathBuf,
}

impl CatalogService {
    pub fn new(repo: Arc<CatalogRepository>, output_root: PathBuf) -> Self {
        Self { repo, output_root }
    }

    /// Filtered page of the catalog plus the total filtered count.
    /// Page and page size clamp to at least 1.
    pub async fn query(
        &self,
        filters: &CatalogFilters,
        page: usize,
        page_size: usize,
    ) -> AppResult<(Vec<CatalogEntry>, usize)> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let matching: Vec<CatalogEntry> = self
            .repo
            .read_all()
            .await?
            .into_iter()
            .filter(|e| filters.matches(e))
            .collect();
        let total = matching.len();

        let rows = matching
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        Ok((rows, total))
    }

    /// Full filtered result set as CSV, header row included even when empty
    pub async fn export_csv(&self, filters: &CatalogFilters) -> AppResult<Vec<u8>> {
        let matching: Vec<CatalogEntry> = self
            .repo
            .read_all()
            .await?
            .into_iter()
            .filter(|e| filters.matches(e))
            .collect();
        entries_to_csv(&matching)
    }

    pub async fn update_by_index(
        &self,
        index: usize,
        update: CatalogUpdate,
    ) -> AppResult<CatalogEntry> {
        self.repo
            .update_at(index, |entry| update.apply(entry))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no catalog entry at index {}", index)))
    }

    /// Remove the row and its backing audio file. The file may already be
    /// gone; that is not an error.
    pub async fn delete_by_index(&self, index: usize) -> AppResult<()> {
        let removed = self
            .repo
            .delete_at(index)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no catalog entry at index {}", index)))?;

        if !removed.file_path.is_empty() {
            let path = self.output_root.join(&removed.file_path);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::info!(path = %path.display(), "Deleted audio file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Audio file delete failed")
                }
            }
        }
        Ok(())
    }

    pub async fn batch(
        &self,
        action: BatchAction,
        indices: &[usize],
        update: Option<CatalogUpdate>,
    ) -> AppResult<BatchOutcome> {
        match action {
            BatchAction::Edit => {
                let update = update.ok_or_else(|| {
                    AppError::BadRequest("batch edit requires an update body".to_string())
                })?;
                let count = self
                    .repo
                    .update_many(indices, |entry| update.apply(entry))
                    .await?;
                Ok(BatchOutcome::Edited(count))
            }
            BatchAction::ExportCsv => {
                let entries = self.select(indices).await?;
                Ok(BatchOutcome::Csv(entries_to_csv(&entries)?))
            }
            BatchAction::Download => {
                let entries = self.select(indices).await?;
                Ok(BatchOutcome::Zip(self.zip_files(&entries).await?))
            }
        }
    }

    async fn select(&self, indices: &[usize]) -> AppResult<Vec<CatalogEntry>> {
        let all = self.repo.read_all().await?;
        Ok(indices
            .iter()
            .filter_map(|&i| all.get(i).cloned())
            .collect())
    }

    /// Zip the referenced audio files. Entries whose file is missing on
    /// disk are silently skipped.
    async fn zip_files(&self, entries: &[CatalogEntry]) -> AppResult<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for entry in entries {
            if entry.file_path.is_empty() {
                continue;
            }
            let path = self.output_root.join(&entry.file_path);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    tracing::debug!(path = %path.display(), "Skipping missing file in batch download");
                    continue;
                }
            };
            let name = entry
                .file_path
                .rsplit('/')
                .next()
                .unwrap_or(&entry.file_path)
                .to_string();
            writer
                .start_file(name, options)
                .map_err(|e| AppError::Internal(format!("zip entry: {}", e)))?;
            writer
                .write_all(&bytes)
                .map_err(|e| AppError::Internal(format!("zip write: {}", e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| AppError::Internal(format!("zip finish: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: usize, user: &str, title: &str) -> CatalogEntry {
        CatalogEntry {
            id: format!("id-{}", id),
            title: title.to_string(),
            date: "2026-08-31 10:00:00".to_string(),
            length: 5,
            tone: String::new(),
            prompt: String::new(),
            voice: String::new(),
            speed: String::new(),
            pitch: String::new(),
            format: "wav".to_string(),
            quality: "medium".to_string(),
            file_path: format!("files/{}.wav", id),
            user: user.to_string(),
            tenant: "acme".to_string(),
            object_store_url: String::new(),
        }
    }

    async fn service_with(dir: &tempfile::TempDir, entries: &[CatalogEntry]) -> CatalogService {
        let repo = Arc::new(CatalogRepository::new(dir.path().join("catalog.csv")));
        for e in entries {
            repo.append(e).await.unwrap();
        }
        CatalogService::new(repo, dir.path().to_path_buf())
    }

    #[tokio::test]
    async fn test_pagination_returns_total_regardless_of_page() {
        let dir = tempfile::tempdir().unwrap();
        let entries: Vec<CatalogEntry> =
            (0..45).map(|i| entry(i, "alice", "T")).collect();
        let service = service_with(&dir, &entries).await;

        let (rows, total) = service
            .query(&CatalogFilters::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!(rows.len(), 20);
        assert_eq!(total, 45);

        let (rows, total) = service
            .query(&CatalogFilters::default(), 3, 20)
            .await
            .unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(total, 45);

        // Page and size clamp to 1
        let (rows, _) = service.query(&CatalogFilters::default(), 0, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_query_filters_before_paginating() {
        let dir = tempfile::tempdir().unwrap();
        let mut entries: Vec<CatalogEntry> =
            (0..10).map(|i| entry(i, "alice", "T")).collect();
        entries.extend((10..15).map(|i| entry(i, "bob", "T")));
        let service = service_with(&dir, &entries).await;

        let filters = CatalogFilters {
            user: Some("bob".to_string()),
            ..Default::default()
        };
        let (rows, total) = service.query(&filters, 1, 20).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(total, 5);
        assert!(rows.iter().all(|e| e.user == "bob"));
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(0, "alice", "T");
        std::fs::create_dir_all(dir.path().join("files")).unwrap();
        std::fs::write(dir.path().join(&e.file_path), b"audio").unwrap();
        let service = service_with(&dir, &[e.clone()]).await;

        service.delete_by_index(0).await.unwrap();
        assert!(!dir.path().join(&e.file_path).exists());
        assert!(matches!(
            service.delete_by_index(0).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_download_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = entry(0, "alice", "T");
        let missing = entry(1, "alice", "T");
        std::fs::create_dir_all(dir.path().join("files")).unwrap();
        std::fs::write(dir.path().join(&present.file_path), b"audio-bytes").unwrap();
        let service = service_with(&dir, &[present, missing]).await;

        let outcome = service
            .batch(BatchAction::Download, &[0, 1], None)
            .await
            .unwrap();
        let BatchOutcome::Zip(bytes) = outcome else {
            panic!("expected zip")
        };

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.by_index(0).unwrap().name(), "0.wav");
    }

    #[tokio::test]
    async fn test_batch_edit_applies_update() {
        let dir = tempfile::tempdir().unwrap();
        let entries: Vec<CatalogEntry> = (0..3).map(|i| entry(i, "alice", "T")).collect();
        let service = service_with(&dir, &entries).await;

        let outcome = service
            .batch(
                BatchAction::Edit,
                &[0, 2],
                Some(CatalogUpdate {
                    tone: Some("brisk".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
        let BatchOutcome::Edited(count) = outcome else {
            panic!("expected edit count")
        };
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_batch_edit_without_update_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_with(&dir, &[]).await;
        assert!(matches!(
            service.batch(BatchAction::Edit, &[0], None).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
