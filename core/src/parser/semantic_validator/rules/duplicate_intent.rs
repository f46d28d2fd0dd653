//! Rule: Duplicate Intent
//!
//! Reports a warning when one state declares the same intent twice. The
//! first transition always wins, so the later one is dead.

use std::collections::HashMap;

use crate::executor::types::ast::ScriptDef;

use super::super::{ValidationError, ValidationRule};

pub struct DuplicateIntentRule;

impl ValidationRule for DuplicateIntentRule {
    fn id(&self) -> &'static str {
        "duplicate-intent"
    }

    fn description(&self) -> &'static str {
        "Intents should be unique within a state"
    }

    fn validate(&self, script: &ScriptDef) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for state in &script.states {
            let mut first_seen: HashMap<&str, usize> = HashMap::new();
            for t in &state.transitions {
                if let Some(first_line) = first_seen.get(t.intent.as_str()) {
                    errors.push(ValidationError::warning(
                        t.line,
                        format!(
                            "Intent '{}' in state '{}' shadows the transition on line {}",
                            t.intent, state.name, first_line
                        ),
                        self.id(),
                    ));
                } else {
                    first_seen.insert(&t.intent, t.line);
                }
            }
        }

        errors
    }
}
