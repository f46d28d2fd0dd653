//! Document model shared by the parser and the executor

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A labeled edge from one state to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Short machine token offered to keyword matching and to the classifier
    pub intent: String,
    /// Human-readable label shown to the classifier and in fallback replies
    pub description: String,
    /// Name of the state this transition leads to
    pub target: String,
    /// 1-based source line of the `transition` keyword
    #[serde(default)]
    pub line: usize,
}

/// One node of the dialogue graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub response: String,
    /// Outgoing transitions in declaration order
    pub transitions: Vec<Transition>,
    /// Set by an explicit `end` marker
    pub is_end: bool,
    /// 1-based source line of the `state` keyword
    #[serde(default)]
    pub line: usize,
}

impl State {
    /// A state is terminal when it is marked `end` or has nowhere to go.
    pub fn is_terminal(&self) -> bool {
        self.is_end || self.transitions.is_empty()
    }

    /// Find the first transition carrying `intent` (exact match).
    pub fn transition_for(&self, intent: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.intent == intent)
    }
}

/* ===================== Script Definition ===================== */

/// Parser output: a structurally valid script that has not been
/// semantically validated yet. States keep declaration order and may
/// still contain duplicates or dangling targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDef {
    pub domain: String,
    pub states: Vec<State>,
    /// 1-based line of the `domain` keyword
    #[serde(default)]
    pub line: usize,
}

impl ScriptDef {
    /// The first declared state is where every session starts.
    pub fn start_state(&self) -> Option<&State> {
        self.states.first()
    }
}

/* ===================== Document ===================== */

/// A parsed and validated script.
///
/// Built only through [`Document::from_validated`], after the semantic
/// validator has accepted the definition, so every transition target and the
/// start state are guaranteed to exist. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    domain: String,
    states: Vec<State>,
    index: HashMap<String, usize>,
    start_state: String,
}

impl Document {
    /// Freeze a definition that already passed validation.
    ///
    /// Returns `None` when the definition has no states. Duplicate names are
    /// expected to have been rejected upstream; if one slips through, the
    /// first declaration is kept in the index.
    pub(crate) fn from_validated(def: ScriptDef) -> Option<Self> {
        let start_state = def.start_state()?.name.clone();
        let mut index = HashMap::with_capacity(def.states.len());
        for (i, state) in def.states.iter().enumerate() {
            index.entry(state.name.clone()).or_insert(i);
        }
        Some(Self {
            domain: def.domain,
            states: def.states,
            index,
            start_state,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    /// Look up a state by name.
    pub fn state(&self, name: &str) -> Option<&State> {
        self.index.get(name).map(|&i| &self.states[i])
    }

    pub fn contains_state(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// States in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }
}
