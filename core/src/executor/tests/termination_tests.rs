//! Tests for terminal states and closed sessions

use super::helpers::{
    session, FixedClassifier, RecordingClassifier, UnknownClassifier, REFUND, SUPPORT,
};
use crate::executor::Outcome;

#[test]
fn test_closed_session_is_idempotent() {
    let mut exec = session(REFUND, UnknownClassifier);
    exec.run().unwrap();
    exec.step("I want a refund").unwrap();
    assert!(exec.is_finished());

    for input in ["anything", "refund", "", "1"] {
        let reply = exec.advance(input).unwrap();
        assert_eq!(reply.text, "(session closed)");
        assert_eq!(reply.outcome, Outcome::SessionClosed);
        assert_eq!(exec.current_state_name(), "done");
        assert!(exec.is_finished());
    }
}

#[test]
fn test_closed_session_does_not_consult_classifier() {
    let recorder = RecordingClassifier::default();
    let mut exec = session(REFUND, recorder.clone());
    exec.run().unwrap();
    exec.step("refund").unwrap();

    exec.step("hello?").unwrap();
    exec.step("anyone?").unwrap();
    assert_eq!(recorder.call_count(), 0);
}

#[test]
fn test_closed_steps_are_not_recorded() {
    let mut exec = session(REFUND, UnknownClassifier);
    exec.run().unwrap();
    exec.step("refund").unwrap();
    exec.step("again").unwrap();
    exec.step("and again").unwrap();

    assert_eq!(exec.history().len(), 1);
}

#[test]
fn test_state_without_transitions_is_terminal() {
    // goodbye has no transitions and no `end` marker
    let mut exec = session(SUPPORT, UnknownClassifier);
    exec.run().unwrap();

    assert_eq!(exec.step("nothing else, bye").unwrap(), "Bye!");
    assert!(exec.is_finished());
    assert_eq!(exec.step("wait").unwrap(), "(session closed)");
}

#[test]
fn test_end_marker_wins_over_transitions() {
    let source = r#"
domain "d"
state start:
    response "Hello"
    transition more "More" -> more
state more:
    response "That's all"
    transition again "Again" -> start
    end
"#;
    let mut exec = session(source, FixedClassifier("again"));
    exec.run().unwrap();

    assert_eq!(exec.step("more").unwrap(), "That's all");
    assert!(exec.is_finished());
    assert_eq!(exec.step("again").unwrap(), "(session closed)");
    assert_eq!(exec.current_state_name(), "more");
}

#[test]
fn test_input_at_terminal_start_ends_session() {
    let source = "domain \"d\"\nstate s:\n response \"Only\"\n end\n";
    let mut exec = session(source, UnknownClassifier);
    exec.run().unwrap();

    let reply = exec.advance("hi").unwrap();
    assert_eq!(reply.text, "(conversation ended)");
    assert_eq!(reply.outcome, Outcome::SessionEnded);
    assert!(exec.is_finished());
    assert_eq!(exec.current_state_name(), "s");

    let reply = exec.advance("hi").unwrap();
    assert_eq!(reply.outcome, Outcome::SessionClosed);
}

#[test]
fn test_step_before_run_starts_at_start_state() {
    let mut exec = session(REFUND, UnknownClassifier);

    assert_eq!(exec.current_state_name(), "start");
    assert_eq!(exec.step("refund").unwrap(), "Refunded");
}
