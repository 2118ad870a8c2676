// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::pipeline::{PageTables, PipelineOutput};
use crate::utils::error::StorageError;

// Anything that is not safe in a file name.
static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+").expect("Failed to compile UNSAFE_FILENAME_CHARS")
});

/// Facts about a run, written next to the results.
#[derive(Debug, Serialize)]
pub struct RunMetadata<'a> {
    pub model: &'a str,
    pub chunk_size: usize,
    pub urls_requested: usize,
    pub urls_contributing: usize,
    pub urls_unsuccessful: usize,
    pub institutions: usize,
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Saves the merged records and the unsuccessful URL list as JSON.
    /// Returns the paths written.
    pub fn save_output(&self, output: &PipelineOutput) -> Result<Vec<PathBuf>, StorageError> {
        let results = self.write_json("results.json", &output.records)?;
        let unsuccessful = self.write_json("unsuccessful_urls.json", &output.unsuccessful)?;
        Ok(vec![results, unsuccessful])
    }

    /// Saves run metadata in JSON format, stamped with the current time.
    pub fn save_run_metadata(&self, meta: &RunMetadata) -> Result<PathBuf, StorageError> {
        let metadata = serde_json::json!({
            "run": meta,
            "completed_at": chrono::Utc::now().to_rfc3339(),
        });
        self.write_json("run_meta.json", &metadata)
    }

    /// Writes each page's serialized tables to `tables/<url>.csv`.
    pub fn save_tables(&self, pages: &[PageTables]) -> Result<Vec<PathBuf>, StorageError> {
        let target_dir = self.base_dir.join("tables");
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }

        let mut written = Vec::with_capacity(pages.len());
        for page in pages {
            let file_path = target_dir.join(format!("{}.csv", sanitize_filename(&page.url)));
            fs::write(&file_path, page.tables.join("\n")).map_err(StorageError::IoError)?;
            tracing::debug!("Saved {} table(s) to {}", page.tables.len(), file_path.display());
            written.push(file_path);
        }
        Ok(written)
    }

    fn write_json<T: Serialize + ?Sized>(&self, filename: &str, value: &T) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(filename);
        let contents = serde_json::to_string_pretty(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, contents).map_err(StorageError::IoError)?;
        tracing::info!("Saved {}", file_path.display());

        Ok(file_path)
    }
}

/// Turns a URL into a flat file name, e.g.
/// `https://www.dcu.org/bank/savings.html` → `www.dcu.org_bank_savings.html`.
fn sanitize_filename(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(without_scheme, "_");
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "page".to_string()
    } else {
        trimmed.to_string()
    }
}
