//! Application bootstrap
//!
//! Loads configuration and builds the classifier once, then hands out
//! sessions. Nothing here is global: callers own the [`Application`].
//!
//! ```ignore
//! let app = InitBuilder::new().config_path("scenario.toml").init()?;
//! let document = app.load_script("scripts/ecommerce.rsl")?;
//! let mut session = app.new_session(document);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::classifier::{build_classifier, Classifier};
use crate::config::{Backend, Config};
use crate::executor::{Document, Executor};
use crate::scripts::load_script;

/// Configured classifier plus the settings sessions are created with
pub struct Application {
    pub config: Config,
    pub classifier: Arc<dyn Classifier>,
}

impl Application {
    /// Pure instantiation, no I/O
    pub fn new(config: Config, classifier: Arc<dyn Classifier>) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load and validate a script file.
    pub fn load_script(&self, path: impl AsRef<Path>) -> Result<Arc<Document>> {
        let path = path.as_ref();
        let document =
            load_script(path).with_context(|| format!("Failed to load {}", path.display()))?;
        Ok(Arc::new(document))
    }

    /// Start a session over `document` with the configured session options.
    pub fn new_session(&self, document: Arc<Document>) -> Executor {
        Executor::with_options(
            document,
            Arc::clone(&self.classifier),
            self.config.session.clone(),
        )
    }
}

/// Options for initializing an Application
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Config file path (overrides default search)
    pub config_path: Option<PathBuf>,

    /// Classifier backend (overrides config file and env vars)
    pub backend: Option<Backend>,
}

/// Builder for constructing InitOptions
#[derive(Debug, Default)]
pub struct InitBuilder {
    options: InitOptions,
}

impl InitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file path
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Force a classifier backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.options.backend = Some(backend);
        self
    }

    pub fn init(self) -> Result<Application> {
        initialize(self.options)
    }
}

/// Load config, build the classifier, return the Application.
pub fn initialize(options: InitOptions) -> Result<Application> {
    // Bootstrap: Load config
    let config = Config::builder()
        .config_path(options.config_path)
        .backend(options.backend)
        .build()
        .context("Failed to load configuration")?;

    // Instantiate
    let classifier = build_classifier(&config).context("Failed to set up the classifier")?;
    tracing::debug!(classifier = classifier.name(), "application initialized");

    Ok(Application::new(config, classifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use std::fs;

    #[test]
    fn test_init_with_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("scenario.toml");
        fs::write(&config_path, "[session]\nkeyword_pass = false\n").unwrap();

        let app = InitBuilder::new()
            .config_path(&config_path)
            .backend(Backend::Local)
            .init()
            .unwrap();

        assert_eq!(app.classifier.name(), "keyword");
        assert!(!app.config().session.keyword_pass);
    }

    #[test]
    fn test_sessions_use_configured_options() {
        let mut config = Config::default();
        config.session.messages.session_closed = "[done]".to_string();
        let app = Application::new(config, Arc::new(KeywordClassifier));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refund.rsl");
        let source = r#"
domain "d"
state start:
    response "Hi"
    transition refund "Refund" -> done
state done:
    response "Done"
"#;
        fs::write(&path, source).unwrap();

        let mut session = app.new_session(app.load_script(&path).unwrap());
        session.run().unwrap();
        session.step("refund").unwrap();
        assert_eq!(session.step("again").unwrap(), "[done]");
    }

    #[test]
    fn test_load_script_error_names_the_file() {
        let app = Application::new(Config::default(), Arc::new(KeywordClassifier));
        let err = app.load_script("missing.rsl").err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to load missing.rsl"));
    }
}
