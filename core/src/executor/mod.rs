//! # Executor - one conversation over a Document
//!
//! The executor owns a cursor (current state plus a finished flag) and moves
//! it along transitions in response to user input. The document itself is
//! shared and read-only, so any number of sessions can run over one script.
//!
//! Each [`Executor::step`] runs these checks, in order:
//!
//! 1. A finished session answers with the closed message and does nothing else
//! 2. A terminal current state finishes the session
//! 3. Keyword pass: the first transition whose intent occurs in the input
//! 4. Classifier pass: the label returned for the current transitions
//! 5. No match: a fallback reply listing the options; the cursor stays put
//!
//! ```ignore
//! let document = Arc::new(scenario_core::scripts::load_script("shop.rsl")?);
//! let mut session = Executor::new(document, Arc::new(KeywordClassifier));
//! println!("{}", session.run()?);
//! println!("{}", session.step("I want a refund")?);
//! ```

pub mod types;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::{Candidate, Classification, Classifier};

pub use types::{
    Cursor, Document, Messages, Outcome, Reply, Resolution, SessionOptions, State, Transition,
    Turn,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The cursor names a state the document doesn't have. Loading rules this
    /// out, so seeing it means the document and session got out of step.
    #[error("state '{0}' is not defined in the loaded script")]
    StateNotFound(String),
}

/// One live conversation
pub struct Executor {
    id: Uuid,
    document: Arc<Document>,
    classifier: Arc<dyn Classifier>,
    options: SessionOptions,
    cursor: Cursor,
    history: Vec<Turn>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("id", &self.id)
            .field("domain", &self.document.domain())
            .field("classifier", &self.classifier.name())
            .field("cursor", &self.cursor)
            .field("turns", &self.history.len())
            .finish()
    }
}

impl Executor {
    /// Start a session at the document's start state.
    pub fn new(document: impl Into<Arc<Document>>, classifier: Arc<dyn Classifier>) -> Self {
        Self::with_options(document, classifier, SessionOptions::default())
    }

    pub fn with_options(
        document: impl Into<Arc<Document>>,
        classifier: Arc<dyn Classifier>,
        options: SessionOptions,
    ) -> Self {
        let document = document.into();
        let cursor = Cursor {
            current_state: document.start_state().to_string(),
            finished: false,
        };
        Self {
            id: Uuid::new_v4(),
            document,
            classifier,
            options,
            cursor,
            history: Vec::new(),
        }
    }

    /// Reset to the start state and return its response.
    ///
    /// Does not mark the session finished even when the start state is
    /// terminal; the first `step` does that.
    pub fn run(&mut self) -> Result<String, ExecutorError> {
        self.cursor = Cursor {
            current_state: self.document.start_state().to_string(),
            finished: false,
        };
        self.history.clear();

        let state = self.current_state()?;
        info!(
            session = %self.id,
            domain = self.document.domain(),
            state = %state.name,
            "session started"
        );
        Ok(state.response.clone())
    }

    /// Process one user input and return the reply text.
    pub fn step(&mut self, input: &str) -> Result<String, ExecutorError> {
        self.advance(input).map(|reply| reply.text)
    }

    /// Like [`step`](Self::step), but also says what happened.
    pub fn advance(&mut self, input: &str) -> Result<Reply, ExecutorError> {
        if self.cursor.finished {
            return Ok(Reply {
                text: self.options.messages.session_closed.clone(),
                outcome: Outcome::SessionClosed,
            });
        }

        let state_before = self.cursor.current_state.clone();
        let reply = self.resolve(input)?;
        self.record(input, state_before, &reply);
        Ok(reply)
    }

    fn resolve(&mut self, input: &str) -> Result<Reply, ExecutorError> {
        let document = Arc::clone(&self.document);
        let state = document
            .state(&self.cursor.current_state)
            .ok_or_else(|| ExecutorError::StateNotFound(self.cursor.current_state.clone()))?;

        if state.is_terminal() {
            self.cursor.finished = true;
            debug!(session = %self.id, state = %state.name, "input at terminal state");
            return Ok(Reply {
                text: self.options.messages.session_ended.clone(),
                outcome: Outcome::SessionEnded,
            });
        }

        let Some((transition, resolved_by)) = self.match_transition(state, input) else {
            debug!(session = %self.id, state = %state.name, "no transition matched");
            return Ok(Reply {
                text: self
                    .options
                    .messages
                    .fallback(state.transitions.iter().map(|t| t.description.as_str())),
                outcome: Outcome::Fallback,
            });
        };

        let target = document
            .state(&transition.target)
            .ok_or_else(|| ExecutorError::StateNotFound(transition.target.clone()))?;

        self.cursor.current_state = target.name.clone();
        if target.is_terminal() {
            self.cursor.finished = true;
        }

        info!(
            session = %self.id,
            from = %state.name,
            to = %target.name,
            intent = %transition.intent,
            via = ?resolved_by,
            finished = self.cursor.finished,
            "transition"
        );

        Ok(Reply {
            text: target.response.clone(),
            outcome: Outcome::Transitioned {
                from: state.name.clone(),
                to: target.name.clone(),
                intent: transition.intent.clone(),
                resolved_by,
            },
        })
    }

    /// Keyword pass, then classifier pass. First declared transition wins.
    fn match_transition<'d>(
        &self,
        state: &'d State,
        input: &str,
    ) -> Option<(&'d Transition, Resolution)> {
        if self.options.keyword_pass {
            let lowered = input.to_lowercase();
            if let Some(t) = state
                .transitions
                .iter()
                .find(|t| lowered.contains(&t.intent.to_lowercase()))
            {
                return Some((t, Resolution::Keyword));
            }
        }

        let candidates: Vec<Candidate<'_>> =
            state.transitions.iter().map(Candidate::from).collect();
        match self.classifier.classify(input, &candidates) {
            Classification::Intent(intent) => {
                debug!(
                    session = %self.id,
                    classifier = self.classifier.name(),
                    intent = %intent,
                    "classifier label"
                );
                state
                    .transition_for(&intent)
                    .map(|t| (t, Resolution::Classifier))
            }
            Classification::Unknown => None,
        }
    }

    fn record(&mut self, input: &str, state_before: String, reply: &Reply) {
        let limit = self.options.history_limit;
        if limit > 0 && self.history.len() >= limit {
            let excess = self.history.len() + 1 - limit;
            self.history.drain(..excess);
        }
        self.history.push(Turn {
            user: input.to_string(),
            reply: reply.text.clone(),
            state_before,
            state_after: self.cursor.current_state.clone(),
            outcome: reply.outcome.clone(),
            at: Utc::now(),
        });
    }

    /* ===================== Accessors ===================== */

    pub fn is_finished(&self) -> bool {
        self.cursor.finished
    }

    pub fn current_state_name(&self) -> &str {
        &self.cursor.current_state
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    /// Completed turns since the last `run`, oldest first, capped at
    /// `history_limit`. Steps on a closed session are not recorded.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    fn current_state(&self) -> Result<&State, ExecutorError> {
        self.document
            .state(&self.cursor.current_state)
            .ok_or_else(|| ExecutorError::StateNotFound(self.cursor.current_state.clone()))
    }
}

/// Create a session over `document` using `classifier`.
pub fn new_session(document: Arc<Document>, classifier: Arc<dyn Classifier>) -> Executor {
    Executor::new(document, classifier)
}
