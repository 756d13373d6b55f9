use crate::cache::{ExtractionCacheKey, ExtractionCacheValue};
use crate::config::RuleDef;
use crate::rules::Rule;
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage abstraction for caching extraction results
pub trait ExtractionStorage {
    fn get_output(&self, cache_key: &ExtractionCacheKey) -> Result<Option<ExtractionCacheValue>>;
    fn store_output(&self, cache_key: &ExtractionCacheKey, cache_value: &ExtractionCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: PathBuf,
}

impl FileStorage {
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(cache_dir.join("extractions"))?;
        Ok(Self { cache_dir })
    }

    fn output_path(&self, cache_key: &ExtractionCacheKey) -> PathBuf {
        self.cache_dir
            .join("extractions")
            .join(format!("{}.json", cache_key.to_cache_hash()))
    }
}

impl ExtractionStorage for FileStorage {
    fn get_output(&self, cache_key: &ExtractionCacheKey) -> Result<Option<ExtractionCacheValue>> {
        let path = self.output_path(cache_key);
        if path.exists() {
            let json_str = fs::read_to_string(path)?;
            let cache_value: ExtractionCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached extraction: {}", e))?;
            Ok(Some(cache_value))
        } else {
            Ok(None)
        }
    }

    fn store_output(&self, cache_key: &ExtractionCacheKey, cache_value: &ExtractionCacheValue) -> Result<()> {
        let path = self.output_path(cache_key);
        let json_str = serde_json::to_string_pretty(cache_value)
            .map_err(|e| anyhow!("Failed to serialize extraction for cache: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// No-op storage implementation that disables all caching
#[derive(Default)]
pub struct NoOpStorage;

impl ExtractionStorage for NoOpStorage {
    fn get_output(&self, _cache_key: &ExtractionCacheKey) -> Result<Option<ExtractionCacheValue>> {
        Ok(None)
    }

    fn store_output(&self, _cache_key: &ExtractionCacheKey, _cache_value: &ExtractionCacheValue) -> Result<()> {
        Ok(())
    }
}

/// SHA-256 of the whole workbook file.
///
/// Workbooks are zip containers, so an edit can leave both ends of the file
/// untouched; every byte is hashed.
pub fn calculate_workbook_hash(workbook_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(workbook_bytes);
    format!("{:x}", hasher.finalize())
}

/// Hash of the compiled rules in their persisted form
pub fn calculate_rules_hash(rules: &[Rule]) -> Result<String> {
    let defs: Vec<RuleDef> = rules.iter().map(RuleDef::from).collect();
    let rules_json = serde_json::to_string(&defs)
        .map_err(|e| anyhow!("Failed to serialize rules for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(rules_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
