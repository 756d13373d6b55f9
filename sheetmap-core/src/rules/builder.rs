use super::rule::{BlockSpec, ExtractionMode, Offset, Rule, UntilSpec, MAX_COLUMNS};
use super::validation::RuleIssue;

/// Accumulates rule fields one at a time, then validates them in `finalize`.
///
/// Block fields (`skip`, `extract_start`, `stop_col`, `repeat`) and
/// until-keyword fields (`until`, `skip_rows`, `stop_before`) describe two
/// different extraction modes and cannot be mixed.
#[derive(Debug, Clone, Default)]
pub struct RuleBuilder {
    keyword: Option<String>,
    section: Option<String>,
    skip: Option<Offset>,
    start: Option<Offset>,
    stop_col: Option<isize>,
    repeat: bool,
    until: bool,
    skip_rows: Option<i64>,
    stop_before: Option<String>,
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor keyword; blank text leaves the rule disabled
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn skip(mut self, rows: isize, cols: isize) -> Self {
        self.skip = Some(Offset::new(rows, cols));
        self
    }

    pub fn extract_start(mut self, rows: isize, cols: isize) -> Self {
        self.start = Some(Offset::new(rows, cols));
        self
    }

    pub fn stop_col(mut self, delta: isize) -> Self {
        self.stop_col = Some(delta);
        self
    }

    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// Switch to until-keyword mode
    pub fn until(mut self) -> Self {
        self.until = true;
        self
    }

    pub fn skip_rows(mut self, rows: i64) -> Self {
        self.skip_rows = Some(rows);
        self
    }

    pub fn stop_before(mut self, keyword: impl Into<String>) -> Self {
        self.stop_before = Some(keyword.into());
        self
    }

    pub fn finalize(self) -> Result<Rule, RuleIssue> {
        let section = self
            .section
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(RuleIssue::MissingSection)?;

        let anchor = self.keyword.filter(|kw| !kw.is_empty());

        let has_block_fields =
            self.skip.is_some() || self.start.is_some() || self.stop_col.is_some() || self.repeat;
        let has_until_fields = self.skip_rows.is_some() || self.stop_before.is_some();
        let until = self.until || (has_until_fields && !has_block_fields);

        let mode = if until {
            if has_block_fields {
                return Err(RuleIssue::MixedModes);
            }
            let skip_rows = self.skip_rows.unwrap_or(0);
            if skip_rows < 0 {
                return Err(RuleIssue::NegativeSkipRows(skip_rows));
            }
            ExtractionMode::UntilKeyword(UntilSpec {
                skip_rows: skip_rows as usize,
                stop_before: self.stop_before.filter(|kw| !kw.is_empty()),
            })
        } else {
            if has_until_fields {
                return Err(RuleIssue::MixedModes);
            }
            let spec = BlockSpec {
                skip: self.skip.unwrap_or_default(),
                start: self.start.unwrap_or_default(),
                stop_col: self.stop_col.unwrap_or(0),
                repeat: self.repeat,
            };
            check_column_offset("skip.cols", spec.skip.cols)?;
            check_column_offset("extract.start.cols", spec.start.cols)?;
            check_column_offset("stop_col", spec.stop_col)?;
            ExtractionMode::Block(spec)
        };

        Ok(Rule {
            anchor,
            section,
            mode,
        })
    }
}

/// Column deltas must fit within one sheet's width
fn check_column_offset(field: &'static str, value: isize) -> Result<(), RuleIssue> {
    if value.unsigned_abs() >= MAX_COLUMNS {
        return Err(RuleIssue::ColumnOffsetTooLarge {
            field,
            value,
            max: MAX_COLUMNS,
        });
    }
    Ok(())
}
