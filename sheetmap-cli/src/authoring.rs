//! Rule file authoring: append rules and describe what a file contains.

use anyhow::{anyhow, Result};
use sheetmap_core::{MappingConfig, Rule, RuleBuilder};
use std::path::Path;

/// Rule fields as given on the command line.
///
/// `skip_rows` means the row part of the block skip offset for block rules
/// and the rows skipped below the anchor for until rules.
#[derive(Debug, Clone, Default)]
pub struct RuleDraft {
    pub section: String,
    pub keyword: Option<String>,
    pub skip_rows: Option<i64>,
    pub skip_cols: Option<isize>,
    pub start_rows: Option<isize>,
    pub start_cols: Option<isize>,
    pub stop_col: Option<isize>,
    pub repeat: bool,
    pub until: bool,
    pub stop_before: Option<String>,
}

impl RuleDraft {
    fn is_until(&self) -> bool {
        self.until || self.stop_before.is_some()
    }

    pub fn to_rule(&self) -> Result<Rule> {
        let mut builder = RuleBuilder::new().section(self.section.clone());
        if let Some(keyword) = &self.keyword {
            builder = builder.keyword(keyword.clone());
        }

        if self.is_until() {
            builder = builder.until();
            if let Some(rows) = self.skip_rows {
                builder = builder.skip_rows(rows);
            }
            if let Some(stop_before) = &self.stop_before {
                builder = builder.stop_before(stop_before.clone());
            }
            // Block-only flags are passed through so the builder rejects the mix
            if let Some(cols) = self.skip_cols {
                builder = builder.skip(0, cols);
            }
        } else if self.skip_rows.is_some() || self.skip_cols.is_some() {
            let rows = self.skip_rows.unwrap_or(0) as isize;
            builder = builder.skip(rows, self.skip_cols.unwrap_or(0));
        }

        if self.start_rows.is_some() || self.start_cols.is_some() {
            builder =
                builder.extract_start(self.start_rows.unwrap_or(0), self.start_cols.unwrap_or(0));
        }
        if let Some(stop_col) = self.stop_col {
            builder = builder.stop_col(stop_col);
        }
        if self.repeat {
            builder = builder.repeat(true);
        }

        builder
            .finalize()
            .map_err(|e| anyhow!("Cannot build rule '{}': {}", self.section, e))
    }
}

/// Append a rule to the file at `path`, creating the file if needed.
///
/// The whole file is rewritten in mapping-object form, in YAML or JSON by
/// extension. Rules keep their meaning and order, but key spellings are
/// normalized (`from`/`as` become `keyword`/`section`) and a bare rule list
/// gains the `{"rules": [...]}` wrapper.
pub fn append_rule(
    path: &Path,
    draft: &RuleDraft,
    workbook: Option<&Path>,
) -> Result<(MappingConfig, Rule)> {
    let rule = draft.to_rule()?;
    let mut config = MappingConfig::load_or_default(path)?;

    if let Some(workbook) = workbook {
        config.workbook = Some(workbook.to_path_buf());
    }
    config.push_rule(&rule);
    config.save_to_file(path)?;

    Ok((config, rule))
}

/// One line per rule, numbered from 1; rules that fail to build say why
pub fn describe_rules(config: &MappingConfig) -> Vec<String> {
    config
        .rules
        .iter()
        .enumerate()
        .map(|(i, def)| match def.to_rule() {
            Ok(rule) => format!("{:>3}. {}", i + 1, rule),
            Err(issue) => format!(
                "{:>3}. ⚠️  {}: {}",
                i + 1,
                def.section.as_deref().unwrap_or("<unnamed>"),
                issue
            ),
        })
        .collect()
}
