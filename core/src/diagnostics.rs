//! Compiler-style rendering of script load errors
//!
//! ```text
//! error[dangling-transition]: transition 'refund' targets undefined state 'refunded'
//!   --> shop.rsl:5
//!    |
//!  5 |     transition refund "Refund" -> refunded
//!    |     ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//! ```

use std::fmt::Write;

use crate::parser::semantic_validator::{Severity, ValidationError};
use crate::scripts::LoadError;

/// Renders [`LoadError`]s and warnings against the script they came from.
pub struct DiagnosticPrinter<'a> {
    file_name: &'a str,
    source: &'a str,
}

impl<'a> DiagnosticPrinter<'a> {
    pub fn new(file_name: &'a str, source: &'a str) -> Self {
        Self { file_name, source }
    }

    /// Render every problem in `error`, blank-line separated.
    pub fn render(&self, error: &LoadError) -> String {
        match error {
            LoadError::Io { .. } => format!("error: {}\n", error),
            LoadError::Lex(e) => {
                let message = strip_line_prefix(&e.to_string());
                self.block("error", "lex", &message, e.line())
            }
            LoadError::Parse(e) => {
                let message = strip_line_prefix(&e.to_string());
                self.block("error", "parse", &message, e.line())
            }
            LoadError::Validation(errors) => self.render_findings(errors),
        }
    }

    /// Render validator findings, errors and warnings alike.
    pub fn render_findings(&self, findings: &[ValidationError]) -> String {
        findings
            .iter()
            .map(|f| {
                let level = match f.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                self.block(level, f.rule_id, &f.message, f.line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn block(&self, level: &str, code: &str, message: &str, line: usize) -> String {
        let mut out = format!("{}[{}]: {}\n", level, code, message);
        let _ = writeln!(out, "  --> {}:{}", self.file_name, line);
        let Some(text) = self.source.lines().nth(line.saturating_sub(1)) else {
            return out;
        };

        let width = line.to_string().len().max(2);
        let indent = text.len() - text.trim_start().len();
        let marked = text.trim().chars().count().max(1);
        let _ = writeln!(out, "{:>width$} |", "", width = width);
        let _ = writeln!(out, "{:>width$} | {}", line, text, width = width);
        let _ = writeln!(
            out,
            "{:>width$} | {}{}",
            "",
            &text[..indent],
            "^".repeat(marked),
            width = width
        );
        out
    }
}

/// Lexer and parser messages already start with "line N: ".
fn strip_line_prefix(message: &str) -> String {
    match message.split_once(": ") {
        Some((prefix, rest)) if prefix.starts_with("line ") => rest.to_string(),
        _ => message.to_string(),
    }
}
