//! Rule: Dangling Transition
//!
//! Reports an error when a transition targets a state that is never
//! declared anywhere in the script. Declaration order doesn't matter:
//! a transition may point at a state defined further down.

use std::collections::HashSet;

use crate::executor::types::ast::ScriptDef;

use super::super::{ValidationError, ValidationRule};

pub struct DanglingTransitionRule;

impl ValidationRule for DanglingTransitionRule {
    fn id(&self) -> &'static str {
        "dangling-transition"
    }

    fn description(&self) -> &'static str {
        "Transition targets must name a declared state"
    }

    fn validate(&self, script: &ScriptDef) -> Vec<ValidationError> {
        let declared: HashSet<&str> = script.states.iter().map(|s| s.name.as_str()).collect();
        let mut errors = Vec::new();

        for state in &script.states {
            for t in &state.transitions {
                if !declared.contains(t.target.as_str()) {
                    errors.push(ValidationError::error(
                        t.line,
                        format!(
                            "Transition '{}' in state '{}' targets undefined state '{}'",
                            t.intent, state.name, t.target
                        ),
                        self.id(),
                    ));
                }
            }
        }

        errors
    }
}
