use crate::error::{ExtractError, ExtractResult};
use crate::rules::{
    compile_rules, validate, ExtractionMode, Offset, Rule, RuleBuilder, RuleIssue, ValidationReport,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `extract` block of a persisted block rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractDef {
    #[serde(default)]
    pub start: Offset,
    #[serde(default)]
    pub stop_col: isize,
}

/// A rule as stored in a rule file.
///
/// Accepts both persisted shapes:
/// - block rules: `from`, `skip {rows, cols}`, `extract {start {rows, cols}, stop_col}`, `loop`, `as`
/// - until rules: `keyword`, `rule_type: "extract_until"`, `skip_rows`, `stop_before`, `section`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDef {
    #[serde(default, alias = "from", skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<Offset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_rows: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractDef>,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub repeat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_before: Option<String>,
    #[serde(default, alias = "as", skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

pub const RULE_TYPE_BLOCK: &str = "block";
pub const RULE_TYPE_EXTRACT_UNTIL: &str = "extract_until";

impl RuleDef {
    pub fn to_rule(&self) -> Result<Rule, RuleIssue> {
        let mut builder = RuleBuilder::new();
        if let Some(keyword) = &self.keyword {
            builder = builder.keyword(keyword.clone());
        }
        if let Some(section) = &self.section {
            builder = builder.section(section.clone());
        }

        match self.rule_type.as_deref() {
            None => {}
            Some(RULE_TYPE_EXTRACT_UNTIL) => builder = builder.until(),
            Some(RULE_TYPE_BLOCK) => {
                if self.skip_rows.is_some() || self.stop_before.is_some() {
                    return Err(RuleIssue::MixedModes);
                }
            }
            Some(other) => return Err(RuleIssue::UnknownRuleType(other.to_string())),
        }

        if let Some(skip) = self.skip {
            builder = builder.skip(skip.rows, skip.cols);
        }
        if let Some(extract) = &self.extract {
            builder = builder
                .extract_start(extract.start.rows, extract.start.cols)
                .stop_col(extract.stop_col);
        }
        if let Some(repeat) = self.repeat {
            builder = builder.repeat(repeat);
        }
        if let Some(skip_rows) = self.skip_rows {
            builder = builder.skip_rows(skip_rows);
        }
        if let Some(stop_before) = &self.stop_before {
            builder = builder.stop_before(stop_before.clone());
        }

        builder.finalize()
    }
}

impl From<&Rule> for RuleDef {
    fn from(rule: &Rule) -> Self {
        let keyword = Some(rule.anchor.clone().unwrap_or_default());
        let section = Some(rule.section.clone());
        match &rule.mode {
            ExtractionMode::Block(spec) => RuleDef {
                keyword,
                skip: Some(spec.skip),
                extract: Some(ExtractDef {
                    start: spec.start,
                    stop_col: spec.stop_col,
                }),
                repeat: Some(spec.repeat),
                section,
                ..RuleDef::default()
            },
            ExtractionMode::UntilKeyword(spec) => RuleDef {
                keyword,
                rule_type: Some(RULE_TYPE_EXTRACT_UNTIL.to_string()),
                skip_rows: Some(spec.skip_rows as i64),
                stop_before: Some(spec.stop_before.clone().unwrap_or_default()),
                section,
                ..RuleDef::default()
            },
        }
    }
}

/// A rule file: which workbook and sheet to read, and the rules to apply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default, alias = "excel_file", skip_serializing_if = "Option::is_none")]
    pub workbook: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

/// Either a full mapping object or a bare rule list
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Mapping(MappingConfig),
    Bare(Vec<RuleDef>),
}

impl From<RuleFile> for MappingConfig {
    fn from(file: RuleFile) -> Self {
        match file {
            RuleFile::Mapping(config) => config,
            RuleFile::Bare(rules) => MappingConfig {
                rules,
                ..MappingConfig::default()
            },
        }
    }
}

impl MappingConfig {
    pub fn from_rules(rules: &[Rule]) -> Self {
        Self {
            rules: rules.iter().map(RuleDef::from).collect(),
            ..Self::default()
        }
    }

    /// Load a rule file; `.yaml`/`.yml` are read as YAML, everything else as JSON
    pub fn load_from_file(path: &Path) -> ExtractResult<Self> {
        let content = fs::read_to_string(path)?;
        let parsed: Result<RuleFile, String> = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map(Into::into).map_err(|reason| ExtractError::RuleFile {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Load a rule file, or start an empty one if it does not exist yet
    pub fn load_or_default(path: &Path) -> ExtractResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json_str(content: &str) -> ExtractResult<Self> {
        let file: RuleFile = serde_json::from_str(content)?;
        Ok(file.into())
    }

    /// Write in mapping-object form; YAML for `.yaml`/`.yml`, pretty JSON otherwise
    pub fn save_to_file(&self, path: &Path) -> ExtractResult<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| ExtractError::RuleFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            serde_json::to_string_pretty(self)?
        };
        fs::write(path, content)?;
        Ok(())
    }

    pub fn push_rule(&mut self, rule: &Rule) {
        self.rules.push(RuleDef::from(rule));
    }

    /// Validate every rule; any malformed rule rejects the whole file
    pub fn compile(&self) -> ExtractResult<Vec<Rule>> {
        compile_rules(self.candidates())
    }

    /// Validate every rule and return the full report without failing
    pub fn check(&self) -> (Vec<Rule>, ValidationReport) {
        validate(self.candidates())
    }

    fn candidates(&self) -> impl Iterator<Item = (Option<String>, Result<Rule, RuleIssue>)> + '_ {
        self.rules.iter().map(|def| (def.section.clone(), def.to_rule()))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("yaml") | Some("yml")
    )
}
