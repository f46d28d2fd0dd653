//! Type definitions for the executor
//!
//! - Document model (Transition, State, ScriptDef, Document)
//! - Session types (SessionOptions, Messages, Cursor, Outcome, Reply, Turn)

pub mod ast;
pub mod session;

pub use ast::{Document, ScriptDef, State, Transition};
pub use session::{Cursor, Messages, Outcome, Reply, Resolution, SessionOptions, Turn};
