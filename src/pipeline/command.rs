//! External command lines with `{placeholder}` substitution.
//!
//! Diagram rendering and rasterisation are delegated to command-line tools
//! (a Mermaid CLI, an HTML→PNG renderer). Both are configured as a single
//! whitespace-separated string; placeholders are substituted per argument, so
//! substituted paths never get re-split.

use crate::error::DocGenError;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Parse a command line. An empty line yields a template that fails on `run`.
    pub(crate) fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
        }
    }

    /// Arguments with every `{key}` replaced by its value.
    pub(crate) fn render_args(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (key, value)| {
                    acc.replace(&format!("{{{key}}}"), value)
                })
            })
            .collect()
    }

    /// Run to completion; a non-zero exit becomes an error carrying stderr.
    pub(crate) async fn run(&self, vars: &[(&str, &str)]) -> Result<(), String> {
        if self.program.is_empty() {
            return Err("empty command line".to_string());
        }
        let args = self.render_args(vars);
        debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("could not start '{}': {e}", self.program))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ))
        }
    }
}

/// Create the scratch directory a command writes into.
pub(crate) fn scratch_dir() -> Result<tempfile::TempDir, DocGenError> {
    tempfile::Builder::new()
        .prefix("docgen-")
        .tempdir()
        .map_err(|e| DocGenError::Internal(format!("tempdir: {e}")))
}
