//! Rule: Ignored Transitions
//!
//! Reports a warning when a state marked `end` also declares transitions.
//! The session closes after an `end` state's response, so they never fire.

use crate::executor::types::ast::ScriptDef;

use super::super::{ValidationError, ValidationRule};

pub struct IgnoredTransitionsRule;

impl ValidationRule for IgnoredTransitionsRule {
    fn id(&self) -> &'static str {
        "ignored-transitions"
    }

    fn description(&self) -> &'static str {
        "States marked 'end' should not declare transitions"
    }

    fn validate(&self, script: &ScriptDef) -> Vec<ValidationError> {
        script
            .states
            .iter()
            .filter(|s| s.is_end && !s.transitions.is_empty())
            .map(|s| {
                ValidationError::warning(
                    s.line,
                    format!(
                        "State '{}' is marked 'end'; its {} transition(s) will never be followed",
                        s.name,
                        s.transitions.len()
                    ),
                    self.id(),
                )
            })
            .collect()
    }
}
