use super::rule::Rule;
use crate::error::{ExtractError, ExtractResult};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Why a rule definition cannot be turned into a [`Rule`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleIssue {
    #[error("section name is required")]
    MissingSection,

    #[error("unknown rule_type '{0}' (expected 'block' or 'extract_until')")]
    UnknownRuleType(String),

    #[error("mixes until-keyword fields (skip_rows, stop_before) with block fields (skip, extract, loop)")]
    MixedModes,

    #[error("skip_rows must not be negative (got {0})")]
    NegativeSkipRows(i64),

    #[error("{field} of {value} columns exceeds the sheet width of {max}")]
    ColumnOffsetTooLarge {
        field: &'static str,
        value: isize,
        max: usize,
    },
}

/// A rejected rule and where it sits in the rule list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleProblem {
    pub index: usize,
    pub section: Option<String>,
    pub issue: RuleIssue,
}

/// Things worth telling the user that do not stop a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleWarning {
    Disabled {
        index: usize,
        section: String,
    },
    DuplicateSection {
        index: usize,
        section: String,
        first_index: usize,
    },
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleWarning::Disabled { index, section } => {
                write!(f, "rule #{index} ({section}) has no keyword and will produce an empty section")
            }
            RuleWarning::DuplicateSection {
                index,
                section,
                first_index,
            } => write!(
                f,
                "rule #{index} reuses section '{section}' from rule #{first_index}; its output replaces the earlier one"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub problems: Vec<RuleProblem>,
    pub warnings: Vec<RuleWarning>,
    pub total_rules: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for problem in &self.problems {
            let section = problem.section.as_deref().unwrap_or("<unnamed>");
            writeln!(f, "  rule #{} ({}): {}", problem.index, section, problem.issue)?;
        }
        write!(
            f,
            "  {} of {} rules rejected",
            self.problems.len(),
            self.total_rules
        )
    }
}

/// Check every candidate and collect all problems at once.
///
/// Each candidate is the rule's declared section name (for reporting) and the
/// outcome of building it. Rules that built successfully are returned even
/// when others failed; callers decide whether a partial list is usable.
pub fn validate<I>(candidates: I) -> (Vec<Rule>, ValidationReport)
where
    I: IntoIterator<Item = (Option<String>, Result<Rule, RuleIssue>)>,
{
    let mut report = ValidationReport::default();
    let mut rules = Vec::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (index, (section, built)) in candidates.into_iter().enumerate() {
        report.total_rules += 1;
        match built {
            Ok(rule) => {
                if rule.is_disabled() {
                    report.warnings.push(RuleWarning::Disabled {
                        index,
                        section: rule.section.clone(),
                    });
                }
                if let Some(&first_index) = first_seen.get(&rule.section) {
                    report.warnings.push(RuleWarning::DuplicateSection {
                        index,
                        section: rule.section.clone(),
                        first_index,
                    });
                } else {
                    first_seen.insert(rule.section.clone(), index);
                }
                rules.push(rule);
            }
            Err(issue) => report.problems.push(RuleProblem {
                index,
                section: section.filter(|s| !s.trim().is_empty()),
                issue,
            }),
        }
    }

    (rules, report)
}

/// Like [`validate`], but any problem rejects the whole list
pub fn compile_rules<I>(candidates: I) -> ExtractResult<Vec<Rule>>
where
    I: IntoIterator<Item = (Option<String>, Result<Rule, RuleIssue>)>,
{
    let (rules, report) = validate(candidates);
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if !report.is_valid() {
        return Err(ExtractError::MalformedRules(report));
    }
    Ok(rules)
}
