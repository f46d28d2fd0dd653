//! Session-level types: options, replies and the turn log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/* ===================== Options ===================== */

pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Per-session behaviour switches, loaded from the `[session]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Try case-insensitive intent containment before asking the classifier
    pub keyword_pass: bool,
    /// Most recent turns kept in the history; older ones are dropped. 0 keeps all.
    pub history_limit: usize,
    pub messages: Messages,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            keyword_pass: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            messages: Messages::default(),
        }
    }
}

/// Fixed texts the executor produces on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Returned by every step once the session has finished
    pub session_closed: String,
    /// Returned when a step is attempted on a terminal state
    pub session_ended: String,
    /// Prepended to the list of options when nothing matched
    pub fallback_prefix: String,
    pub option_separator: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            session_closed: "(session closed)".to_string(),
            session_ended: "(conversation ended)".to_string(),
            fallback_prefix: "Sorry, I didn't understand. Please reply with one of: "
                .to_string(),
            option_separator: " / ".to_string(),
        }
    }
}

impl Messages {
    /// "Sorry ... one of: A / B / C"
    pub fn fallback<'a>(&self, descriptions: impl IntoIterator<Item = &'a str>) -> String {
        let options: Vec<&str> = descriptions.into_iter().collect();
        format!(
            "{}{}",
            self.fallback_prefix,
            options.join(&self.option_separator)
        )
    }
}

/* ===================== Cursor ===================== */

/// The only mutable part of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub current_state: String,
    pub finished: bool,
}

/* ===================== Outcomes ===================== */

/// Which pass picked the transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Keyword,
    Classifier,
}

/// What a single step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Moved along a transition
    Transitioned {
        from: String,
        to: String,
        intent: String,
        resolved_by: Resolution,
    },
    /// Nothing matched; the cursor did not move
    Fallback,
    /// Input arrived at a terminal state; the session is now finished
    SessionEnded,
    /// The session was already finished
    SessionClosed,
}

/// Reply text plus the outcome that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub outcome: Outcome,
}

/// One recorded exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub reply: String,
    pub state_before: String,
    pub state_after: String,
    pub outcome: Outcome,
    pub at: DateTime<Utc>,
}
