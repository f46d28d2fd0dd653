//! Executor tests

mod helpers;
mod termination_tests;
