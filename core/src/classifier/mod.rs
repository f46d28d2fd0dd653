//! Intent classification
//!
//! The executor hands a classifier the user's text plus the transitions of
//! the current state, and gets back either one of the offered intents or
//! [`Classification::Unknown`]. Two backends ship with the crate:
//!
//! - [`KeywordClassifier`]: offline, deterministic
//! - [`RemoteClassifier`]: an OpenAI-compatible chat endpoint with bounded
//!   retries, degrading to the keyword matcher when the endpoint gives up
//!
//! Classifiers never fail outward. Transport problems are logged and folded
//! into `Unknown`, so the executor only ever sees a label.

pub mod error;
pub mod http;
pub mod keyword;
pub mod remote;

use std::sync::Arc;

use crate::config::{Backend, Config};
use crate::executor::types::ast::Transition;

pub use error::{ClassifierError, ClassifierErrorKind};
pub use http::HttpTransport;
pub use keyword::KeywordClassifier;
pub use remote::{ChatTransport, RemoteClassifier, RetryPolicy};

/// Label a remote model uses to say "none of these"
pub const UNKNOWN_INTENT: &str = "unknown";

/// One option offered to a classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub intent: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a Transition> for Candidate<'a> {
    fn from(t: &'a Transition) -> Self {
        Self {
            intent: &t.intent,
            description: &t.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Intent(String),
    Unknown,
}

impl Classification {
    pub fn intent(&self) -> Option<&str> {
        match self {
            Classification::Intent(intent) => Some(intent),
            Classification::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &str {
        self.intent().unwrap_or(UNKNOWN_INTENT)
    }
}

/// Maps free text onto one of a fixed set of intents.
///
/// Implementations may return a label that isn't among the candidates; the
/// executor treats that the same as `Unknown`.
pub trait Classifier: Send + Sync {
    fn classify(&self, input: &str, candidates: &[Candidate<'_>]) -> Classification;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Build the classifier selected by `config.classifier.backend`.
pub fn build_classifier(config: &Config) -> Result<Arc<dyn Classifier>, ClassifierError> {
    match config.classifier.backend {
        Backend::Local => Ok(Arc::new(KeywordClassifier)),
        Backend::Remote => {
            let transport = HttpTransport::new(&config.llm)?;
            let mut classifier =
                RemoteClassifier::new(transport, RetryPolicy::from_config(&config.llm));
            if config.llm.fallback_to_local {
                classifier = classifier.with_fallback(KeywordClassifier);
            }
            tracing::debug!(
                url = %classifier.transport().api_url(),
                model = %config.llm.model,
                latency_bound_ms = config.llm.latency_bound().as_millis() as u64,
                fallback = config.llm.fallback_to_local,
                "remote classifier ready"
            );
            Ok(Arc::new(classifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_accessors() {
        let hit = Classification::Intent("refund".to_string());
        assert_eq!(hit.intent(), Some("refund"));
        assert_eq!(hit.as_str(), "refund");

        assert_eq!(Classification::Unknown.intent(), None);
        assert_eq!(Classification::Unknown.as_str(), UNKNOWN_INTENT);
    }

    #[test]
    fn test_candidate_from_transition() {
        let t = Transition {
            intent: "refund".to_string(),
            description: "I want a refund".to_string(),
            target: "done".to_string(),
            line: 3,
        };
        let c = Candidate::from(&t);
        assert_eq!(c.intent, "refund");
        assert_eq!(c.description, "I want a refund");
    }

    #[test]
    fn test_build_local_classifier() {
        let classifier = build_classifier(&Config::default()).unwrap();
        assert_eq!(classifier.name(), "keyword");
    }

    #[test]
    fn test_build_remote_classifier() {
        let mut config = Config::default();
        config.classifier.backend = Backend::Remote;
        config.llm.api_key = Some("sk-test".to_string());
        config.llm.base_url = Some("http://127.0.0.1:9".to_string());

        let classifier = build_classifier(&config).unwrap();
        assert_eq!(classifier.name(), "remote");
    }
}
