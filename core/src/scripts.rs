//! Script loading: source text → tokens → definition → validated Document
//!
//! This is the only way to obtain a [`Document`]. Loading fails fast: a lex
//! error, a grammar violation or a semantic validation error aborts the load
//! and no partial document is ever produced.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::executor::types::ast::Document;
use crate::parser::semantic_validator::{validate_script, ValidationError};
use crate::parser::{parse, tokenize, LexError, ParseError};

/// File extensions recognised as scenario scripts
pub const SCRIPT_EXTENSIONS: &[&str] = &["rsl", "dsl"];

/* ===================== Errors ===================== */

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}", render_validation(.0))]
    Validation(Vec<ValidationError>),
}

impl LoadError {
    /// Line of the first problem, when the error points into the source.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoadError::Io { .. } => None,
            LoadError::Lex(e) => Some(e.line()),
            LoadError::Parse(e) => Some(e.line()),
            LoadError::Validation(errors) => errors.first().map(|e| e.line),
        }
    }
}

fn render_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/* ===================== Compilation ===================== */

/// A successfully loaded script plus the non-fatal findings about it.
#[derive(Debug, Clone)]
pub struct CompiledScript {
    pub document: Document,
    pub warnings: Vec<ValidationError>,
}

/// Run the whole front end over `source`.
pub fn compile(source: &str) -> Result<CompiledScript, LoadError> {
    let tokens = tokenize(source)?;
    debug!(tokens = tokens.len(), "tokenized script");

    let script = parse(tokens)?;
    let (errors, warnings): (Vec<_>, Vec<_>) = validate_script(&script)
        .into_iter()
        .partition(|e| e.is_error());

    if !errors.is_empty() {
        return Err(LoadError::Validation(errors));
    }

    let document = Document::from_validated(script).ok_or_else(|| {
        LoadError::Validation(vec![ValidationError::error(
            1,
            "Script declares no start state",
            "missing-start-state",
        )])
    })?;

    Ok(CompiledScript { document, warnings })
}

/// Parse and validate script text into a Document. Warnings are logged.
pub fn parse_script(source: &str) -> Result<Document, LoadError> {
    let compiled = compile(source)?;
    for warning in &compiled.warnings {
        warn!(rule = warning.rule_id, line = warning.line, "{}", warning.message);
    }
    Ok(compiled.document)
}

/// Read and load a script file.
pub fn load_script(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let file = ScriptFile::read(path)?;
    let document = parse_script(&file.source)?;
    info!(
        script = %file.name,
        domain = document.domain(),
        states = document.state_count(),
        version = file.short_fingerprint(),
        "loaded script"
    );
    Ok(document)
}

/* ===================== Script Files ===================== */

/// A script read from disk
#[derive(Debug, Clone)]
pub struct ScriptFile {
    /// File stem, e.g. `ecommerce` for `scripts/ecommerce.rsl`
    pub name: String,
    pub source: String,
    pub file_path: PathBuf,
    /// SHA-256 of the source, hex encoded
    pub fingerprint: String,
}

impl ScriptFile {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_source(path, source))
    }

    pub fn from_source(path: impl AsRef<Path>, source: String) -> Self {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let fingerprint = hash_source(&source);
        Self {
            name,
            source,
            file_path: path.to_path_buf(),
            fingerprint,
        }
    }

    /// First 8 hex chars of the fingerprint, for display
    pub fn short_fingerprint(&self) -> &str {
        self.fingerprint.get(..8).unwrap_or(&self.fingerprint)
    }

    pub fn compile(&self) -> Result<CompiledScript, LoadError> {
        compile(&self.source)
    }
}

/// List the script files directly inside `dir`, sorted by file name.
pub fn discover_scripts(dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_script = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext));
        if is_script && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn hash_source(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}
