//! Rule: Missing Start State
//!
//! Reports an error when a script has no state to start a session from.
//! Sessions always start in the first declared state, so this only fires
//! for an empty state list (the parser rejects those in source form, but
//! definitions can also be built programmatically).

use crate::executor::types::ast::ScriptDef;

use super::super::{ValidationError, ValidationRule};

pub struct MissingStartStateRule;

impl ValidationRule for MissingStartStateRule {
    fn id(&self) -> &'static str {
        "missing-start-state"
    }

    fn description(&self) -> &'static str {
        "A script must declare at least one state to start from"
    }

    fn validate(&self, script: &ScriptDef) -> Vec<ValidationError> {
        if script.start_state().is_some() {
            return Vec::new();
        }

        vec![ValidationError::error(
            script.line,
            format!("Domain '{}' declares no start state", script.domain),
            self.id(),
        )]
    }
}
