pub mod application;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod executor;
pub mod parser;
pub mod replay;
pub mod scripts;

// Re-export main types
pub use classifier::{Candidate, Classification, Classifier, KeywordClassifier, RemoteClassifier};
pub use config::Config;
pub use executor::{new_session, Document, Executor, ExecutorError, Outcome, Reply};
pub use scripts::{load_script, parse_script, LoadError};

// Re-export init API for convenience
pub use application::{initialize, Application, InitBuilder, InitOptions};
