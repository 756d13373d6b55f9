use crate::cache::{ExtractionCacheKey, ExtractionCacheValue};
use crate::config::MappingConfig;
use crate::error::ExtractError;
use crate::grid::{load_sheet_from_bytes, Grid, SheetSelector};
use crate::rules::{RuleEngine, RuleReport, TraceConfig};
use crate::storage::{
    calculate_rules_hash, calculate_workbook_hash, ExtractionStorage, FileStorage, NoOpStorage,
};
use crate::types::ExtractionOutput;
use anyhow::Result;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Simple profiler that collects timings for processing steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        info!("⏱️  {}: {}ms", step_name, elapsed.as_millis());
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        info!("📊 Performance Summary:");
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            info!(
                "   {:.<35} {}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        info!("   {:.<35} {}ms", "Total", total.as_millis());
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Overrides the rule file's sheet
    pub sheet: Option<String>,
    pub skip_cache: bool,
    pub profile: bool,
}

#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub output: ExtractionOutput,
    /// Empty on a cache hit
    pub reports: Vec<RuleReport>,
    pub cache_hit: bool,
}

pub struct SheetProcessor {
    storage: Box<dyn ExtractionStorage + Send + Sync>,
    rule_engine: RuleEngine,
}

impl Default for SheetProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetProcessor {
    /// Create SheetProcessor with explicit storage
    pub fn new_with_dependencies(storage: Box<dyn ExtractionStorage + Send + Sync>) -> Self {
        Self {
            storage,
            rule_engine: RuleEngine::new(),
        }
    }

    /// Processor without caching
    pub fn new() -> Self {
        Self::new_with_dependencies(Box::new(NoOpStorage))
    }

    /// Processor caching outputs under `cache_dir`
    pub fn new_with_cache(cache_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new_with_dependencies(Box::new(FileStorage::new(cache_dir)?)))
    }

    pub fn set_trace_config(&mut self, trace: TraceConfig) {
        self.rule_engine = RuleEngine::with_trace(trace);
    }

    /// Workbook + rule file → output.
    ///
    /// Rules are validated before the workbook is opened, and the whole sheet
    /// is loaded before any rule runs, so either kind of bad input aborts the
    /// run with nothing extracted.
    pub fn process(
        &self,
        workbook_path: &Path,
        config: &MappingConfig,
        options: &ProcessOptions,
    ) -> Result<ProcessOutcome> {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(options.profile);

        let rules = profiler.time_step("Rule Validation", || config.compile())?;

        let sheet = options.sheet.clone().or_else(|| config.sheet.clone());
        let selector = SheetSelector::from_option(sheet.as_deref());

        let workbook_bytes = profiler.time_step("Workbook Read", || {
            std::fs::read(workbook_path).map_err(|e| ExtractError::grid_access(workbook_path, e))
        })?;

        let cache_key = profiler.time_step("Cache Key Generation", || {
            let workbook_hash = calculate_workbook_hash(&workbook_bytes);
            let rules_hash = calculate_rules_hash(&rules)?;
            Ok::<_, anyhow::Error>(ExtractionCacheKey::new(
                workbook_hash,
                rules_hash,
                sheet.clone(),
            ))
        })?;

        // A cached output carries no per-rule reports or trace lines
        let skip_cache = options.skip_cache || self.rule_engine.trace().is_active();
        if skip_cache {
            info!("🚫 Skipping cache lookup");
        } else if let Some(cached) =
            profiler.time_step("Cache Lookup", || self.storage.get_output(&cache_key))?
        {
            info!("🎯 Cache hit for workbook + rules combination");
            profiler.log_summary();
            return Ok(ProcessOutcome {
                output: cached.output,
                reports: Vec::new(),
                cache_hit: true,
            });
        }

        let grid = profiler.time_step("Sheet Load", || {
            load_sheet_from_bytes(workbook_bytes, &selector, workbook_path)
        })?;
        info!(
            "📄 Loaded {} rows x {} cols from {}",
            grid.row_count(),
            grid.col_count(),
            workbook_path.display()
        );

        let (output, reports) =
            profiler.time_step("Rule Engine", || self.rule_engine.run_with_report(&rules, &grid));

        if !skip_cache {
            profiler.time_step("Cache Storage", || {
                let processing_time = start_time.elapsed().as_millis() as u64;
                let cache_value = ExtractionCacheValue::new(output.clone(), processing_time);
                self.storage.store_output(&cache_key, &cache_value)
            })?;
        }

        profiler.log_summary();
        Ok(ProcessOutcome {
            output,
            reports,
            cache_hit: false,
        })
    }

    /// Apply a rule file to an already-loaded grid
    pub fn process_grid<G: Grid + ?Sized>(
        &self,
        grid: &G,
        config: &MappingConfig,
    ) -> Result<ProcessOutcome> {
        let rules = config.compile()?;
        let (output, reports) = self.rule_engine.run_with_report(&rules, grid);
        Ok(ProcessOutcome {
            output,
            reports,
            cache_hit: false,
        })
    }
}
