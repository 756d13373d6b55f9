// Extraction rules
// - rule.rs: validated rule model
// - builder.rs: field-by-field rule construction
// - validation.rs: malformed rule detection and reporting
// - anchor.rs: keyword anchor lookup
// - block.rs: block readers and record labeling
// - engine.rs: RuleEngine, applies rules to a grid

pub mod anchor;
pub mod block;
pub mod builder;
pub mod engine;
pub mod rule;
pub mod validation;

pub use builder::RuleBuilder;
pub use engine::*;
pub use rule::{BlockSpec, ExtractionMode, Offset, Rule, UntilSpec, MAX_COLUMNS};
pub use validation::{compile_rules, validate, RuleIssue, RuleProblem, RuleWarning, ValidationReport};
