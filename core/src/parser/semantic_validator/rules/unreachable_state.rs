//! Rule: Unreachable State
//!
//! Reports a warning for a state that no session can ever enter: it isn't
//! the start state and no transition from a reachable state leads to it.

use std::collections::{HashMap, HashSet};

use crate::executor::types::ast::{ScriptDef, State};

use super::super::{ValidationError, ValidationRule};

pub struct UnreachableStateRule;

impl ValidationRule for UnreachableStateRule {
    fn id(&self) -> &'static str {
        "unreachable-state"
    }

    fn description(&self) -> &'static str {
        "Every state should be reachable from the start state"
    }

    fn validate(&self, script: &ScriptDef) -> Vec<ValidationError> {
        let Some(start) = script.start_state() else {
            return Vec::new();
        };

        let by_name: HashMap<&str, &State> = script
            .states
            .iter()
            .rev()
            .map(|s| (s.name.as_str(), s))
            .collect();

        // Walk the graph from the start state. Transitions out of a state
        // marked `end` are never followed at runtime.
        let mut reached: HashSet<&str> = HashSet::new();
        let mut pending = vec![start.name.as_str()];
        while let Some(name) = pending.pop() {
            if !reached.insert(name) {
                continue;
            }
            if let Some(state) = by_name.get(name) {
                if state.is_end {
                    continue;
                }
                pending.extend(state.transitions.iter().map(|t| t.target.as_str()));
            }
        }

        script
            .states
            .iter()
            .filter(|s| !reached.contains(s.name.as_str()))
            .map(|s| {
                ValidationError::warning(
                    s.line,
                    format!("State '{}' can never be reached from '{}'", s.name, start.name),
                    self.id(),
                )
            })
            .collect()
    }
}
