//! Test helpers for executor tests
//!
//! Script loading plus classifiers with fixed, observable behaviour

use std::sync::{Arc, Mutex};

use crate::classifier::{Candidate, Classification, Classifier};
use crate::executor::{Document, Executor, SessionOptions};
use crate::scripts::parse_script;

/// start --refund--> done(end)
pub const REFUND: &str = r#"
domain "Refund desk"

state start:
    response "Hi"
    transition refund "I want a refund" -> done

state done:
    response "Refunded"
    end
"#;

/// A small support desk with a loop back to the menu
pub const SUPPORT: &str = r#"
domain "Support"

state menu:
    response "How can I help?"
    transition issue "Report an issue" -> issue
    transition order "Check an order" -> order
    transition bye "Nothing else" -> goodbye

state issue:
    response "Sorry to hear that. Describe the issue."
    transition back "Back to the menu" -> menu

state order:
    response "Your order is on its way."
    transition back "Back to the menu" -> menu

state goodbye:
    response "Bye!"
"#;

/// Parse and validate a script; panics on any load error
pub fn document(source: &str) -> Arc<Document> {
    Arc::new(parse_script(source).expect("Script should load"))
}

/// Session over `source` with default options
pub fn session(source: &str, classifier: impl Classifier + 'static) -> Executor {
    Executor::new(document(source), Arc::new(classifier))
}

/// Session with the keyword pass disabled, so only the classifier decides
pub fn classifier_only_session(source: &str, classifier: impl Classifier + 'static) -> Executor {
    let options = SessionOptions {
        keyword_pass: false,
        ..SessionOptions::default()
    };
    Executor::with_options(document(source), Arc::new(classifier), options)
}

/// Always answers "unknown"
pub struct UnknownClassifier;

impl Classifier for UnknownClassifier {
    fn classify(&self, _input: &str, _candidates: &[Candidate<'_>]) -> Classification {
        Classification::Unknown
    }

    fn name(&self) -> &'static str {
        "unknown-stub"
    }
}

/// Always answers the same label, whether or not it is offered
pub struct FixedClassifier(pub &'static str);

impl Classifier for FixedClassifier {
    fn classify(&self, _input: &str, _candidates: &[Candidate<'_>]) -> Classification {
        Classification::Intent(self.0.to_string())
    }

    fn name(&self) -> &'static str {
        "fixed-stub"
    }
}

/// Records every call and answers "unknown"
#[derive(Clone, Default)]
pub struct RecordingClassifier {
    pub calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl RecordingClassifier {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Classifier for RecordingClassifier {
    fn classify(&self, input: &str, candidates: &[Candidate<'_>]) -> Classification {
        let intents = candidates.iter().map(|c| c.intent.to_string()).collect();
        self.calls.lock().unwrap().push((input.to_string(), intents));
        Classification::Unknown
    }

    fn name(&self) -> &'static str {
        "recording-stub"
    }
}
