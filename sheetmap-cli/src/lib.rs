// All extraction functionality is in sheetmap-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod authoring;

// Re-export core types for convenience
pub use sheetmap_core::*;

// Re-export CLI utilities
pub use authoring::{append_rule, describe_rules, RuleDraft};
