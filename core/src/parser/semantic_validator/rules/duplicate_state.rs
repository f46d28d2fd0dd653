//! Rule: Duplicate State
//!
//! Reports an error when two states share a name. "Last definition wins"
//! would silently drop a whole block of the script, so the script is
//! rejected instead.
//!
//! # Examples
//!
//! ```text
//! state start:
//!     response "Hi"
//! state start:        # Error: 'start' is already declared on line 1
//!     response "Hello"
//! ```

use std::collections::HashMap;

use crate::executor::types::ast::ScriptDef;

use super::super::{ValidationError, ValidationRule};

pub struct DuplicateStateRule;

impl ValidationRule for DuplicateStateRule {
    fn id(&self) -> &'static str {
        "duplicate-state"
    }

    fn description(&self) -> &'static str {
        "State names must be unique within a script"
    }

    fn validate(&self, script: &ScriptDef) -> Vec<ValidationError> {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut errors = Vec::new();

        for state in &script.states {
            match first_seen.get(state.name.as_str()) {
                Some(first_line) => errors.push(ValidationError::error(
                    state.line,
                    format!(
                        "State '{}' is already declared on line {}",
                        state.name, first_line
                    ),
                    self.id(),
                )),
                None => {
                    first_seen.insert(&state.name, state.line);
                }
            }
        }

        errors
    }
}
