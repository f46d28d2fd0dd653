//! Semantic Validation for scenario scripts
//!
//! This module provides an extensible rule-based validation system that runs
//! after parsing to catch errors the grammar can't enforce: duplicate state
//! names, transitions to states that don't exist, and a missing start state.
//! These checks need the complete state table, which is why they run once
//! the whole token stream has been consumed (forward references between
//! states are always legal).
//!
//! # Usage
//!
//! ```ignore
//! use scenario_core::parser::{parse, tokenize, semantic_validator::validate_script};
//!
//! let script = parse(tokenize(source)?)?;
//! let errors = validate_script(&script);
//! if errors.iter().any(|e| e.is_error()) {
//!     // Refuse to load
//! }
//! ```
//!
//! # Adding a New Rule
//!
//! 1. Create a new file in `semantic_validator/rules/`
//! 2. Implement `ValidationRule` for your struct
//! 3. Add it to the `Validator::new()` constructor

pub mod rules;

use crate::executor::types::ast::ScriptDef;

// ============================================================================
// Validation Error Types
// ============================================================================

/// A validation error produced by semantic analysis.
///
/// Independent of any output format so both the loader and the CLI's
/// `check` command can use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// 1-based source line of the offending construct
    pub line: usize,
    /// Human-readable message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Which rule produced this error
    pub rule_id: &'static str,
}

/// Severity levels for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Script cannot be loaded
    Error,
    /// Script loads, but probably doesn't do what the author meant
    Warning,
}

impl ValidationError {
    /// Create a new error
    pub fn error(line: usize, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Error,
            rule_id,
        }
    }

    /// Create a new warning
    pub fn warning(line: usize, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Warning,
            rule_id,
        }
    }

    /// Check if this is an error (not a warning)
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{} at line {}: {} [{}]",
            severity, self.line, self.message, self.rule_id
        )
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait that all validation rules must implement.
///
/// Each rule checks one aspect of the script and must not depend on the
/// results of other rules.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "dangling-transition")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    /// Run the validation and return any errors found.
    fn validate(&self, script: &ScriptDef) -> Vec<ValidationError>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

/// The main validator that orchestrates all validation rules.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                // Error rules - the script can't be loaded
                Box::new(rules::MissingStartStateRule),
                Box::new(rules::DuplicateStateRule),
                Box::new(rules::DanglingTransitionRule),
                // Warning rules - suspicious but executable
                Box::new(rules::UnreachableStateRule),
                Box::new(rules::DuplicateIntentRule),
                Box::new(rules::IgnoredTransitionsRule),
            ],
        }
    }

    /// Run all validation rules and collect errors, ordered by line.
    pub fn validate(&self, script: &ScriptDef) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .rules
            .iter()
            .flat_map(|rule| rule.validate(script))
            .collect();
        errors.sort_by_key(|e| e.line);
        errors
    }

    /// Get a list of all registered rules (id, description)
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Validate a script and return everything found, errors and warnings.
pub fn validate_script(script: &ScriptDef) -> Vec<ValidationError> {
    Validator::new().validate(script)
}

/// Check if a script has any validation errors (not just warnings).
pub fn has_errors(script: &ScriptDef) -> bool {
    validate_script(script).iter().any(|e| e.is_error())
}
