//! Remote classifier backed by a chat completion model

use std::thread;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::{
    Candidate, Classification, Classifier, ClassifierError, ClassifierErrorKind,
    KeywordClassifier, UNKNOWN_INTENT,
};
use crate::config::LlmConfig;

/// Sends a single-message prompt and returns the model's text reply.
pub trait ChatTransport: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, ClassifierError>;
}

/* ===================== Retry Policy ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never less than 1.
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(llm: &LlmConfig) -> Self {
        Self {
            max_attempts: llm.max_attempts.max(1),
            retry_delay: llm.retry_delay(),
            rate_limit_cooldown: llm.rate_limit_cooldown(),
        }
    }

    /// How long to wait before retrying after `err`.
    ///
    /// A server-provided Retry-After is honoured up to the configured cooldown.
    pub fn delay_for(&self, err: &ClassifierError) -> Duration {
        match err.kind {
            ClassifierErrorKind::RateLimited => err
                .retry_after
                .map(|d| d.min(self.rate_limit_cooldown))
                .unwrap_or(self.rate_limit_cooldown),
            _ => self.retry_delay,
        }
    }
}

/* ===================== Classifier ===================== */

/// Classifies by asking a model to pick one intent code from a list.
///
/// Latency is bounded: at most `max_attempts` transport calls, with a pause
/// between them. When every attempt fails the classifier degrades to the
/// optional local fallback, or to `Unknown`.
pub struct RemoteClassifier<T> {
    transport: T,
    policy: RetryPolicy,
    fallback: Option<KeywordClassifier>,
}

impl<T: ChatTransport> RemoteClassifier<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: KeywordClassifier) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn complete_with_retry(&self, prompt: &str) -> Result<String, ClassifierError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.transport.complete(prompt) {
                Ok(reply) => return Ok(reply),
                Err(err) if err.kind.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.delay_for(&err);
                    warn!(
                        attempt,
                        max_attempts,
                        kind = ?err.kind,
                        delay_ms = delay.as_millis() as u64,
                        "classifier request failed, retrying: {}",
                        err
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn degrade(&self, input: &str, candidates: &[Candidate<'_>]) -> Classification {
        match &self.fallback {
            Some(local) => {
                let result = local.classify(input, candidates);
                debug!(result = result.as_str(), "used local fallback");
                result
            }
            None => Classification::Unknown,
        }
    }
}

impl<T: ChatTransport> Classifier for RemoteClassifier<T> {
    fn classify(&self, input: &str, candidates: &[Candidate<'_>]) -> Classification {
        if candidates.is_empty() {
            return Classification::Unknown;
        }

        let prompt = build_prompt(input, candidates);
        match self.complete_with_retry(&prompt) {
            Ok(reply) => {
                let result = parse_reply(&reply, candidates);
                debug!(reply = %reply, result = result.as_str(), "remote classification");
                result
            }
            Err(err) => {
                error!(kind = ?err.kind, "classifier gave up: {}", err);
                self.degrade(input, candidates)
            }
        }
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/* ===================== Prompt & Reply ===================== */

/// Render the instruction sent to the model.
pub fn build_prompt(input: &str, candidates: &[Candidate<'_>]) -> String {
    let options: Vec<String> = candidates
        .iter()
        .map(|c| format!("- {}: {}", c.intent, c.description))
        .collect();

    format!(
        "You are an intent classification assistant.\n\
         User input: \"{}\"\n\
         Candidate intents:\n{}\n\
         Reply with the single intent code that best matches the user input. \
         If none of them fits, reply \"{}\". \
         Reply with the code only, without punctuation or explanation.",
        input.replace('"', "'"),
        options.join("\n"),
        UNKNOWN_INTENT
    )
}

/// Map a model reply onto one of the candidates.
///
/// Models tend to decorate their answer with quotes or a trailing period, so
/// after an exact match fails the reply is split into identifier tokens and
/// the longest intent named by a whole token wins.
pub fn parse_reply(reply: &str, candidates: &[Candidate<'_>]) -> Classification {
    let lowered = reply.to_lowercase();
    let cleaned = lowered.trim_matches(|c: char| !is_ident_char(c));

    if cleaned.is_empty() || cleaned == UNKNOWN_INTENT {
        return Classification::Unknown;
    }

    if let Some(exact) = candidates
        .iter()
        .find(|c| c.intent.to_lowercase() == cleaned)
    {
        return Classification::Intent(exact.intent.to_string());
    }

    let tokens: Vec<&str> = cleaned
        .split(|c: char| !is_ident_char(c))
        .filter(|t| !t.is_empty())
        .collect();

    // Ties keep declaration order
    let mut best: Option<&Candidate<'_>> = None;
    for candidate in candidates {
        let intent = candidate.intent.to_lowercase();
        if !tokens.contains(&intent.as_str()) {
            continue;
        }
        if best.map_or(true, |b| candidate.intent.len() > b.intent.len()) {
            best = Some(candidate);
        }
    }

    best.map(|c| Classification::Intent(c.intent.to_string()))
        .unwrap_or(Classification::Unknown)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Replays scripted results and counts calls
    struct ScriptedTransport {
        results: Mutex<VecDeque<Result<String, ClassifierError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedTransport {
        fn new(results: Vec<Result<String, ClassifierError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl ChatTransport for ScriptedTransport {
        fn complete(&self, _prompt: &str) -> Result<String, ClassifierError> {
            *self.calls.lock().unwrap() += 1;
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClassifierError::transport("no more scripted results")))
        }
    }

    const OPTIONS: &[Candidate<'static>] = &[
        Candidate {
            intent: "refund",
            description: "I want a refund",
        },
        Candidate {
            intent: "order",
            description: "Check an order",
        },
    ];

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            retry_delay: Duration::from_millis(1),
            rate_limit_cooldown: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_prompt_lists_candidates() {
        let prompt = build_prompt("give me \"money\"", OPTIONS);
        assert!(prompt.contains("User input: \"give me 'money'\""));
        assert!(prompt.contains("- refund: I want a refund\n- order: Check an order"));
        assert!(prompt.contains("reply \"unknown\""));
    }

    #[test]
    fn test_parse_reply() {
        let intent = |s: &str| Classification::Intent(s.to_string());

        assert_eq!(parse_reply("refund", OPTIONS), intent("refund"));
        assert_eq!(parse_reply("  'Order'. ", OPTIONS), intent("order"));
        assert_eq!(parse_reply("The intent is `refund`", OPTIONS), intent("refund"));
        assert_eq!(parse_reply("unknown", OPTIONS), Classification::Unknown);
        assert_eq!(parse_reply("\"UNKNOWN\"", OPTIONS), Classification::Unknown);
        assert_eq!(parse_reply("cancel", OPTIONS), Classification::Unknown);
        assert_eq!(parse_reply("", OPTIONS), Classification::Unknown);
    }

    #[test]
    fn test_parse_reply_matches_whole_intents() {
        let options = [
            Candidate {
                intent: "order",
                description: "Check an order",
            },
            Candidate {
                intent: "reorder",
                description: "Buy it again",
            },
        ];
        let intent = |s: &str| Classification::Intent(s.to_string());

        assert_eq!(parse_reply("The intent is reorder", &options), intent("reorder"));
        assert_eq!(parse_reply("reorder!", &options), intent("reorder"));
        assert_eq!(parse_reply("(order)", &options), intent("order"));
        assert_eq!(parse_reply("order, not reorder", &options), intent("reorder"));
        assert_eq!(parse_reply("reordering", &options), Classification::Unknown);
    }

    #[test]
    fn test_success_on_first_attempt() {
        let classifier = RemoteClassifier::new(
            ScriptedTransport::new(vec![Ok("order".to_string())]),
            fast_policy(3),
        );

        let result = classifier.classify("where is it", OPTIONS);
        assert_eq!(result, Classification::Intent("order".to_string()));
        assert_eq!(classifier.transport().calls(), 1);
    }

    #[test]
    fn test_retries_transient_errors() {
        let classifier = RemoteClassifier::new(
            ScriptedTransport::new(vec![
                Err(ClassifierError::upstream("502")),
                Err(ClassifierError::rate_limited("slow down")
                    .with_retry_after(Duration::from_secs(60))),
                Ok("refund".to_string()),
            ]),
            fast_policy(3),
        );

        let started = Instant::now();
        let result = classifier.classify("money back", OPTIONS);

        assert_eq!(result, Classification::Intent("refund".to_string()));
        assert_eq!(classifier.transport().calls(), 3);
        // Retry-After of 60s is capped at the 5ms cooldown
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_auth_error_is_not_retried() {
        let classifier = RemoteClassifier::new(
            ScriptedTransport::new(vec![Err(ClassifierError::credentials("bad key"))]),
            fast_policy(3),
        );

        assert_eq!(classifier.classify("refund", OPTIONS), Classification::Unknown);
        assert_eq!(classifier.transport().calls(), 1);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let classifier =
            RemoteClassifier::new(ScriptedTransport::new(Vec::new()), fast_policy(4));

        let started = Instant::now();
        assert_eq!(classifier.classify("hello", OPTIONS), Classification::Unknown);
        assert_eq!(classifier.transport().calls(), 4);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_degrades_to_local_fallback() {
        let classifier = RemoteClassifier::new(ScriptedTransport::new(Vec::new()), fast_policy(2))
            .with_fallback(KeywordClassifier);

        assert_eq!(
            classifier.classify("I need a REFUND", OPTIONS),
            Classification::Intent("refund".to_string())
        );
        assert_eq!(classifier.transport().calls(), 2);
    }

    #[test]
    fn test_no_candidates_skips_transport() {
        let classifier = RemoteClassifier::new(
            ScriptedTransport::new(vec![Ok("refund".to_string())]),
            fast_policy(3),
        );

        assert_eq!(classifier.classify("refund", &[]), Classification::Unknown);
        assert_eq!(classifier.transport().calls(), 0);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let classifier = RemoteClassifier::new(
            ScriptedTransport::new(vec![Ok("order".to_string())]),
            fast_policy(0),
        );

        assert_eq!(
            classifier.classify("order", OPTIONS),
            Classification::Intent("order".to_string())
        );
    }

    #[test]
    fn test_rate_limit_delay() {
        let policy = RetryPolicy {
            max_attempts: 3,
            retry_delay: Duration::from_millis(100),
            rate_limit_cooldown: Duration::from_secs(5),
        };

        let plain = ClassifierError::transport("reset");
        assert_eq!(policy.delay_for(&plain), Duration::from_millis(100));

        let limited = ClassifierError::rate_limited("429");
        assert_eq!(policy.delay_for(&limited), Duration::from_secs(5));

        let hinted = ClassifierError::rate_limited("429").with_retry_after(Duration::from_secs(2));
        assert_eq!(policy.delay_for(&hinted), Duration::from_secs(2));
    }
}
