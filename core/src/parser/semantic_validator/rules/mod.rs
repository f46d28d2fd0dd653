//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `missing_start_state.rs` - Script has no state to start from
//! - `duplicate_state.rs` - State name declared more than once
//! - `dangling_transition.rs` - Transition target never declared
//! - `unreachable_state.rs` - State no transition leads to
//! - `duplicate_intent.rs` - Intent repeated within one state
//! - `ignored_transitions.rs` - Transitions on a state marked `end`

mod dangling_transition;
mod duplicate_intent;
mod duplicate_state;
mod ignored_transitions;
mod missing_start_state;
mod unreachable_state;

pub use dangling_transition::DanglingTransitionRule;
pub use duplicate_intent::DuplicateIntentRule;
pub use duplicate_state::DuplicateStateRule;
pub use ignored_transitions::IgnoredTransitionsRule;
pub use missing_start_state::MissingStartStateRule;
pub use unreachable_state::UnreachableStateRule;
