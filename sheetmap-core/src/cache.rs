use crate::types::ExtractionOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version constants for cache invalidation
pub mod versions {
    pub const SHEETMAP_VERSION: &str = env!("CARGO_PKG_VERSION");
    /// Bump whenever extraction semantics change
    pub const ENGINE_VERSION: &str = "1.0.0";
}

/// Workbook + rules + sheet → output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExtractionCacheKey {
    pub workbook_hash: String,
    pub rules_hash: String,
    pub sheet: Option<String>,
    pub engine_version: String,
}

impl ExtractionCacheKey {
    pub fn new(workbook_hash: String, rules_hash: String, sheet: Option<String>) -> Self {
        Self {
            workbook_hash,
            rules_hash,
            sheet,
            engine_version: versions::ENGINE_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.workbook_hash);
        hasher.update(&self.rules_hash);
        // Keep "no sheet" distinct from a sheet named ""
        match &self.sheet {
            Some(sheet) => {
                hasher.update([1u8]);
                hasher.update(sheet);
            }
            None => hasher.update([0u8]),
        }
        hasher.update(&self.engine_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cached output with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionCacheValue {
    pub output: ExtractionOutput,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

impl ExtractionCacheValue {
    pub fn new(output: ExtractionOutput, processing_time_ms: u64) -> Self {
        Self {
            output,
            created_at: Utc::now(),
            processing_time_ms,
            cache_version: versions::SHEETMAP_VERSION.to_string(),
        }
    }
}
