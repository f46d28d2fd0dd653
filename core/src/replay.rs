//! Transcript replay
//!
//! A case file holds one user turn per line, optionally followed by `|||`
//! and a substring the reply must contain:
//!
//! ```text
//! # refund path
//! hello ||| Please reply with one of
//! I want a refund ||| Refunded
//! anything else ||| (session closed)
//! ```

use serde::Serialize;
use tracing::debug;

use crate::executor::{Executor, ExecutorError, Outcome};

/// Separates the input from the expected reply fragment
pub const CASE_SEPARATOR: &str = "|||";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Case {
    /// 1-based line in the case file
    pub line: usize,
    pub input: String,
    pub expected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    pub line: usize,
    pub input: String,
    pub expected: Option<String>,
    pub reply: String,
    pub state: String,
    pub outcome: Outcome,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Response of the start state
    pub opening: String,
    pub results: Vec<CaseResult>,
    pub passed: usize,
    pub failed: usize,
}

impl ReplayReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Parse case lines. Blank lines and `#` comments are skipped.
pub fn parse_cases(text: &str) -> Vec<Case> {
    text.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (input, expected) = match line.split_once(CASE_SEPARATOR) {
                Some((input, expected)) => {
                    let expected = expected.trim();
                    (input.trim(), (!expected.is_empty()).then(|| expected.to_string()))
                }
                None => (line, None),
            };
            Some(Case {
                line: i + 1,
                input: input.to_string(),
                expected,
            })
        })
        .collect()
}

/// Start a fresh conversation on `executor` and feed it every case.
pub fn run(executor: &mut Executor, cases: &[Case]) -> Result<ReplayReport, ExecutorError> {
    let opening = executor.run()?;
    let mut results = Vec::with_capacity(cases.len());

    for case in cases {
        let reply = executor.advance(&case.input)?;
        let passed = case
            .expected
            .as_deref()
            .map_or(true, |expected| reply.text.contains(expected));
        debug!(line = case.line, passed, "replayed case");

        results.push(CaseResult {
            line: case.line,
            input: case.input.clone(),
            expected: case.expected.clone(),
            reply: reply.text,
            state: executor.current_state_name().to_string(),
            outcome: reply.outcome,
            passed,
        });
    }

    let passed = results.iter().filter(|r| r.passed).count();
    Ok(ReplayReport {
        opening,
        failed: results.len() - passed,
        passed,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::scripts::parse_script;
    use std::sync::Arc;

    const REFUND: &str = r#"
domain "Refund desk"
state start:
    response "Hi"
    transition refund "I want a refund" -> done
state done:
    response "Refunded"
    end
"#;

    fn executor() -> Executor {
        Executor::new(parse_script(REFUND).unwrap(), Arc::new(KeywordClassifier))
    }

    #[test]
    fn test_parse_cases() {
        let cases = parse_cases(
            "# comment\n\nhello ||| one of\n  just input  \nrefund|||\n",
        );

        assert_eq!(
            cases,
            vec![
                Case {
                    line: 3,
                    input: "hello".to_string(),
                    expected: Some("one of".to_string()),
                },
                Case {
                    line: 4,
                    input: "just input".to_string(),
                    expected: None,
                },
                Case {
                    line: 5,
                    input: "refund".to_string(),
                    expected: None,
                },
            ]
        );
    }

    #[test]
    fn test_replay_passes() {
        let cases = parse_cases(
            "gibberish ||| I want a refund\nI want a refund ||| Refunded\nmore ||| (session closed)\n",
        );

        let report = run(&mut executor(), &cases).unwrap();
        assert_eq!(report.opening, "Hi");
        assert_eq!(report.passed, 3);
        assert!(report.all_passed());
        assert_eq!(report.results[0].state, "start");
        assert_eq!(report.results[1].state, "done");
        assert_eq!(report.results[2].outcome, Outcome::SessionClosed);
    }

    #[test]
    fn test_replay_reports_failures() {
        let cases = parse_cases("gibberish ||| Refunded\n");

        let report = run(&mut executor(), &cases).unwrap();
        assert_eq!(report.failed, 1);
        assert!(!report.all_passed());
        assert!(!report.results[0].passed);
        assert_eq!(report.results[0].outcome, Outcome::Fallback);
    }

    #[test]
    fn test_bundled_scripts_replay_cleanly() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../scripts");
        let pairs = [
            ("ecommerce.rsl", "ecommerce_refund.txt"),
            ("ecommerce.rsl", "ecommerce_track.txt"),
            ("it_support.rsl", "it_support.txt"),
        ];

        for (script, cases) in pairs {
            let document = crate::scripts::load_script(root.join(script)).unwrap();
            let text = std::fs::read_to_string(root.join("cases").join(cases)).unwrap();
            let mut session = Executor::new(document, Arc::new(KeywordClassifier));

            let report = run(&mut session, &parse_cases(&text)).unwrap();
            assert!(report.all_passed(), "{cases}: {:#?}", report.results);
            assert!(session.is_finished(), "{cases} should end the conversation");
        }
    }

    #[test]
    fn test_report_serializes() {
        let cases = parse_cases("refund ||| Refunded");
        let report = run(&mut executor(), &cases).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["passed"], 1);
        assert_eq!(json["results"][0]["outcome"]["kind"], "transitioned");
    }
}
