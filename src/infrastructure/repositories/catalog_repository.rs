use super::run_blocking;
use crate::domain::catalog::CatalogEntry;
use crate::error::{AppError, AppResult};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// CSV-backed catalog ledger.
///
/// All writers go through the single per-ledger mutex. Appends hold it only
/// for the append; read-modify-write operations hold it for the full
/// read + rewrite span so concurrent mutations cannot lose updates.
/// Rewrites go through a temp file + rename so a failed write never
/// truncates the ledger.
const HEADER: [&str; 15] = [
    "id", "title", "date", "length", "tone", "prompt", "voice", "speed", "pitch", "format",
    "quality", "file_path", "user", "tenant", "object_store_url",
];

pub struct CatalogRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CatalogRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub async fn append(&self, entry: &CatalogEntry) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let entry = entry.clone();
        run_blocking(move || {
            let write_header = !path.exists();
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(write_header)
                .from_writer(file);
            writer
                .serialize(&entry)
                .map_err(|e| AppError::Internal(format!("catalog append: {}", e)))?;
            writer
                .flush()
                .map_err(|e| AppError::Internal(format!("catalog flush: {}", e)))?;
            Ok(())
        })
        .await
    }

    pub async fn read_all(&self) -> AppResult<Vec<CatalogEntry>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        run_blocking(move || load_entries(&path)).await
    }

    /// Apply `mutate` to the row at `index`, rewriting the ledger. Returns
    /// the updated row, or None when the index is out of range.
    pub async fn update_at(
        &self,
        index: usize,
        mutate: impl FnOnce(&mut CatalogEntry),
    ) -> AppResult<Option<CatalogEntry>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();

        // Load and rewrite run on the blocking pool; the caller's closure
        // runs here in between.
        let mut entries = {
            let path = path.clone();
            run_blocking(move || load_entries(&path)).await?
        };
        let Some(entry) = entries.get_mut(index) else {
            return Ok(None);
        };
        mutate(entry);
        let updated = entry.clone();
        run_blocking(move || rewrite_entries(&path, &entries)).await?;
        Ok(Some(updated))
    }

    /// Apply `mutate` to every listed row in one rewrite, returning how
    /// many indices were in range.
    pub async fn update_many(
        &self,
        indices: &[usize],
        mutate: impl Fn(&mut CatalogEntry),
    ) -> AppResult<usize> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();

        let mut entries = {
            let path = path.clone();
            run_blocking(move || load_entries(&path)).await?
        };
        let mut updated = 0;
        for &index in indices {
            if let Some(entry) = entries.get_mut(index) {
                mutate(entry);
                updated += 1;
            }
        }
        if updated > 0 {
            run_blocking(move || rewrite_entries(&path, &entries)).await?;
        }
        Ok(updated)
    }

    /// Remove the row at `index`, returning it so the caller can clean up
    /// the backing audio file.
    pub async fn delete_at(&self, index: usize) -> AppResult<Option<CatalogEntry>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        run_blocking(move || {
            let mut entries = load_entries(&path)?;
            if index >= entries.len() {
                return Ok(None);
            }
            let removed = entries.remove(index);
            rewrite_entries(&path, &entries)?;
            Ok(Some(removed))
        })
        .await
    }
}

fn load_entries(path: &Path) -> AppResult<Vec<CatalogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::Internal(format!("catalog open: {}", e)))?;
    reader
        .deserialize()
        .collect::<Result<Vec<CatalogEntry>, _>>()
        .map_err(|e| AppError::Internal(format!("catalog row: {}", e)))
}

fn rewrite_entries(path: &Path, entries: &[CatalogEntry]) -> AppResult<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)
            .map_err(|e| AppError::Internal(format!("catalog rewrite: {}", e)))?;
        if entries.is_empty() {
            // Keep the header so later appends do not have to re-detect it
            writer
                .write_record(HEADER)
                .map_err(|e| AppError::Internal(format!("catalog rewrite header: {}", e)))?;
        }
        for entry in entries {
            writer
                .serialize(entry)
                .map_err(|e| AppError::Internal(format!("catalog rewrite row: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::Internal(format!("catalog rewrite flush: {}", e)))?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Serialize entries (header included) to an in-memory CSV byte stream.
/// Used by the export and batch endpoints.
pub fn entries_to_csv(entries: &[CatalogEntry]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if entries.is_empty() {
        // csv only emits headers alongside a record, so write them by hand
        writer
            .write_record(HEADER)
            .map_err(|e| AppError::Internal(format!("csv header: {}", e)))?;
    }
    for entry in entries {
        writer
            .serialize(entry)
            .map_err(|e| AppError::Internal(format!("csv row: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("csv finish: {}", e)))
}
